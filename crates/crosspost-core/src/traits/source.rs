// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source adapter trait for the monitored channel platform.

use async_trait::async_trait;

use crate::error::CrosspostError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MediaRef, RawMessage, ResolvedMedia};

/// Adapter for the channel-based platform the bridge watches.
///
/// Implementations normalize platform events into [`RawMessage`] values and
/// hand them out in the order the platform delivered them.
#[async_trait]
pub trait SourceAdapter: PluginAdapter {
    /// Authenticates and subscribes to the channel's event stream.
    ///
    /// Failure here is fatal for the bridge.
    async fn connect(&mut self) -> Result<(), CrosspostError>;

    /// Waits for the next channel message.
    ///
    /// Returns `Ok(None)` once the subscription has ended for good.
    async fn receive(&self) -> Result<Option<RawMessage>, CrosspostError>;

    /// Fetches the content behind a media reference.
    async fn resolve_media(&self, media: &MediaRef) -> Result<ResolvedMedia, CrosspostError>;
}
