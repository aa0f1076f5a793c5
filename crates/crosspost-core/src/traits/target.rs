// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publish target trait for the public posting platform.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{PublishReceipt, PublishRequest, TargetLimits};

/// Adapter for the platform messages are republished to.
///
/// One call to [`publish`](PublishTarget::publish) is one delivery attempt;
/// retrying and pacing belong to the caller.
#[async_trait]
pub trait PublishTarget: PluginAdapter {
    /// Limits the caller must respect (text length, pacing).
    fn limits(&self) -> TargetLimits;

    /// Issues a single publish call and classifies any failure.
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, DeliveryError>;
}
