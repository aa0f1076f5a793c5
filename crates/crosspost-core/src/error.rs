// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the crosspost bridge.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all crosspost adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CrosspostError {
    /// Configuration errors (invalid TOML, missing credentials, out-of-range values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Source platform connection errors. Fatal at startup, recoverable mid-run.
    #[error("source connection error: {message}")]
    SourceConnection {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A classified delivery failure from the target platform.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CrosspostError {
    /// Stable identifier persisted in `error_log.error_type`.
    pub fn error_type(&self) -> &'static str {
        match self {
            CrosspostError::Config(_) => "config",
            CrosspostError::Storage { .. } => "storage",
            CrosspostError::SourceConnection { .. } => "source",
            CrosspostError::Delivery(e) => e.error_type(),
            CrosspostError::Internal(_) => "internal",
        }
    }

    /// Convenience constructor for storage errors carrying only a message.
    pub fn storage_msg(message: impl Into<String>) -> Self {
        CrosspostError::Storage {
            source: message.into().into(),
        }
    }
}

/// Why a permanent delivery failure can never succeed on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermanentKind {
    /// Credentials rejected or the account lacks permission (401/403).
    Auth,
    /// The target platform rejected the payload itself (400/422, duplicate content, ...).
    Validation,
}

/// Classified outcome of a failed publish call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// Network timeout, connection failure or 5xx. Retried with backoff.
    #[error("transient delivery failure: {message}")]
    Transient { message: String },

    /// Rate limit response. Retried, honoring `retry_after` as a floor.
    #[error("rate limited by target platform: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    /// Authentication or validation rejection. Never retried.
    #[error("permanent delivery failure ({kind:?}): {message}")]
    Permanent { kind: PermanentKind, message: String },
}

impl DeliveryError {
    /// Whether the publisher may try the same request again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DeliveryError::Permanent { .. })
    }

    /// Server-provided lower bound for the next retry, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DeliveryError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            DeliveryError::Transient { .. } => "transient",
            DeliveryError::RateLimited { .. } => "rate_limit",
            DeliveryError::Permanent {
                kind: PermanentKind::Auth,
                ..
            } => "auth",
            DeliveryError::Permanent {
                kind: PermanentKind::Validation,
                ..
            } => "validation",
        }
    }
}
