// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message-bridging pipeline.
//!
//! Messages flow one way: the source monitor pushes [`RawMessage`]s onto the
//! [`IngestQueue`]; on each cadence tick the [`MessageProcessor`] drains a
//! batch, checks the store for duplicates, filters, transforms, and hands
//! survivors to the [`Publisher`]. The [`BridgeController`] owns the whole
//! lifecycle.
//!
//! [`RawMessage`]: crosspost_core::types::RawMessage

pub mod controller;
pub mod filter;
pub mod processor;
pub mod publisher;
pub mod queue;
pub mod shutdown;
pub mod transform;

pub use controller::{
    BridgeController, MaintenanceReport, RunSummary, known_secrets, run_maintenance,
};
pub use filter::{FilterReason, SpamFilter};
pub use processor::{ItemOutcome, MessageProcessor, TickSummary};
pub use publisher::{PublishOutcome, PublishReport, Publisher};
pub use queue::IngestQueue;
pub use shutdown::install_signal_handler;
pub use transform::{Transformed, Transformer, clean_markup};
