// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for crosspost integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockSource`] - Scripted channel source with message injection
//! - [`MockTarget`] - Publish target with scripted outcomes and request capture
//! - [`TestHarness`] - Temp SQLite store plus a test-tuned configuration

pub mod harness;
pub mod mock_source;
pub mod mock_target;

pub use harness::{TestHarness, raw_message};
pub use mock_source::MockSource;
pub use mock_target::MockTarget;
