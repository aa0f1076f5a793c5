// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the source, processing, publishing and storage layers.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays in the bridge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Source,
    Target,
    Storage,
}

/// Kind of an attachment on a source message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Animation,
}

/// Reference to an attachment that still lives on the source platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Platform file identifier used to fetch the content.
    pub file_id: String,
    pub kind: MediaKind,
    pub mime_type: Option<String>,
}

/// Attachment content fetched from the source platform, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub kind: MediaKind,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A normalized channel message as it arrives from the source platform.
///
/// This is the only shape that crosses the Source Monitor boundary; every
/// downstream component works on it rather than on platform payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Platform-assigned message identity, never reused within the channel.
    pub source_message_id: String,
    pub channel_id: String,
    pub text: String,
    pub media: Vec<MediaRef>,
    pub created_at: DateTime<Utc>,
}

/// A message that passed filtering and has been rewritten for the target platform.
#[derive(Debug, Clone)]
pub struct ProcessedMessage {
    pub raw: RawMessage,
    /// Text after markup stripping, before tags and truncation.
    pub cleaned_text: String,
    /// Text that will be published.
    pub final_text: String,
    pub added_tags: Vec<String>,
    pub truncated: bool,
    /// Attachments that resolved successfully. Failed ones are omitted.
    pub media: Vec<ResolvedMedia>,
}

/// Terminal status of a source message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Posted,
    Failed,
    Skipped,
}

/// Durable outcome for one source message. At most one exists per `source_message_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub source_message_id: String,
    pub target_post_id: Option<String>,
    pub channel_id: String,
    pub final_text: String,
    pub media_type: Option<String>,
    pub status: PostStatus,
    pub posted_at: DateTime<Utc>,
}

/// Append-only diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub source_message_id: Option<String>,
    pub error_type: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Result of inserting a [`PostRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record for the same id was already present; nothing was written.
    AlreadyExists,
}

/// One row of the derived per-day statistics view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// UTC day in `YYYY-MM-DD` form.
    pub day: String,
    pub post_count: i64,
    pub channel_count: i64,
    pub media_count: i64,
}

/// Row counts removed by a retention cleanup run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub posts_deleted: usize,
    pub errors_deleted: usize,
}

/// Outbound publish call payload.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub text: String,
    pub media: Vec<ResolvedMedia>,
}

/// Successful publish response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub post_id: String,
    /// Kind of the first attachment that made it into the post.
    pub media_kind: Option<MediaKind>,
}

/// Publishing limits advertised by a target adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLimits {
    pub max_text_length: usize,
    /// Minimum spacing between two publish calls.
    pub min_interval: Duration,
    /// Posts allowed per `window`.
    pub posts_per_window: u32,
    pub window: Duration,
}

/// Format a timestamp the way the store persists it (lexically ordered UTC).
pub fn to_db_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a timestamp previously written by [`to_db_timestamp`].
pub fn from_db_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}
