// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the bridge's external collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod source;
pub mod storage;
pub mod target;

pub use adapter::PluginAdapter;
pub use source::SourceAdapter;
pub use storage::StorageAdapter;
pub use target::PublishTarget;
