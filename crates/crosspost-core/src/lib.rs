// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the crosspost bridge.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the workspace. The source, target and storage
//! adapters implement traits defined here.

pub mod error;
pub mod redact;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CrosspostError, DeliveryError, PermanentKind};
pub use types::{AdapterType, HealthStatus};

// Re-export all adapter traits at crate root.
pub use traits::{PluginAdapter, PublishTarget, SourceAdapter, StorageAdapter};
