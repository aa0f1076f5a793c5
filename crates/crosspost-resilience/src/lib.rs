// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for outbound publishing.
//!
//! - [`BackoffPolicy`]: capped exponential delays with additive jitter and
//!   retry-after floors.
//! - [`PublishPacer`]: minimum spacing plus a fixed-window post quota, so the
//!   bridge stays inside the target platform's published limits.

pub mod backoff;
pub mod pacer;

pub use backoff::BackoffPolicy;
pub use pacer::PublishPacer;
