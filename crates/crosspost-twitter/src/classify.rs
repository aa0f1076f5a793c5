// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping X API responses and transport errors onto [`DeliveryError`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use crosspost_core::error::{DeliveryError, PermanentKind};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Longest API error body kept in a message.
const MAX_DETAIL_CHARS: usize = 300;

/// Classify a non-success HTTP response.
pub fn classify_status(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: DateTime<Utc>,
) -> DeliveryError {
    let message = format!("X API returned {status}: {}", error_detail(body));
    match status.as_u16() {
        429 => DeliveryError::RateLimited {
            retry_after: retry_after(headers, now),
            message,
        },
        // Duplicate posts come back as 403 but are a payload problem.
        403 if body.to_ascii_lowercase().contains("duplicate") => DeliveryError::Permanent {
            kind: PermanentKind::Validation,
            message,
        },
        401 | 403 => DeliveryError::Permanent {
            kind: PermanentKind::Auth,
            message,
        },
        408 => DeliveryError::Transient { message },
        s if s >= 500 => DeliveryError::Transient { message },
        _ => DeliveryError::Permanent {
            kind: PermanentKind::Validation,
            message,
        },
    }
}

/// Classify a transport-level failure. Everything short of a malformed
/// request is worth another attempt.
pub fn classify_transport(err: &reqwest::Error) -> DeliveryError {
    if err.is_builder() {
        return DeliveryError::Permanent {
            kind: PermanentKind::Validation,
            message: format!("could not build X API request: {err}"),
        };
    }
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "failed"
    };
    DeliveryError::Transient {
        message: format!("X API request {kind}: {err}"),
    }
}

/// Server hint for the next attempt: `retry-after` seconds, else the
/// `x-rate-limit-reset` epoch timestamp.
pub fn retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };

    if let Some(secs) = header("retry-after") {
        return Some(Duration::from_secs(secs.max(0) as u64));
    }
    header("x-rate-limit-reset").map(|reset| {
        let secs = reset.saturating_sub(now.timestamp()).max(0);
        Duration::from_secs(secs as u64)
    })
}

/// Human-readable detail from a v2 or v1.1 error body.
pub fn error_detail(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let detail = parsed.as_ref().and_then(|v| {
        v.get("detail")
            .or_else(|| v.get("title"))
            .or_else(|| v.pointer("/errors/0/message"))
            .or_else(|| v.get("error"))
            .and_then(|d| d.as_str())
            .map(str::to_string)
    });
    let detail = detail.unwrap_or_else(|| body.trim().to_string());
    if detail.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = detail.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{cut}...")
    } else {
        detail
    }
}
