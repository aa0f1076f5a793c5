// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the crosspost bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use crosspost_core::types::TargetLimits;
use serde::{Deserialize, Serialize};

/// Top-level crosspost configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CrosspostConfig {
    /// Process-level settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Source channel settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Target platform settings.
    #[serde(default)]
    pub twitter: TwitterConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Queue and cadence settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Publish retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Spam and content heuristics.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Text rewriting for the target platform.
    #[serde(default)]
    pub transform: TransformConfig,

    /// Defaults for the `errors` report command.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram source channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. The bot must be an administrator of `channel`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Watched channel: `@username` or numeric chat id.
    #[serde(default)]
    pub channel: Option<String>,

    /// Capacity of the adapter's internal hand-off buffer.
    #[serde(default = "default_inbound_buffer")]
    pub inbound_buffer: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            channel: None,
            inbound_buffer: default_inbound_buffer(),
        }
    }
}

fn default_inbound_buffer() -> usize {
    16
}

/// X (Twitter) target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TwitterConfig {
    /// OAuth 1.0a consumer key.
    #[serde(default)]
    pub api_key: Option<String>,

    /// OAuth 1.0a consumer secret.
    #[serde(default)]
    pub api_secret: Option<String>,

    /// OAuth 1.0a user access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// OAuth 1.0a user access token secret.
    #[serde(default)]
    pub access_token_secret: Option<String>,

    /// Base URL of the v2 API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the media upload API.
    #[serde(default = "default_upload_base_url")]
    pub upload_base_url: String,

    /// Per-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum post length in characters.
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Minimum spacing between two publish calls.
    #[serde(default = "default_min_post_interval_secs")]
    pub min_post_interval_secs: u64,

    /// Posts allowed per `window_secs`, from the platform's published limits.
    #[serde(default = "default_posts_per_window")]
    pub posts_per_window: u32,

    /// Length of the rate limit window.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            access_token: None,
            access_token_secret: None,
            api_base_url: default_api_base_url(),
            upload_base_url: default_upload_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            max_text_length: default_max_text_length(),
            min_post_interval_secs: default_min_post_interval_secs(),
            posts_per_window: default_posts_per_window(),
            window_secs: default_window_secs(),
        }
    }
}

impl TwitterConfig {
    /// Publishing limits derived from this configuration.
    pub fn limits(&self) -> TargetLimits {
        TargetLimits {
            max_text_length: self.max_text_length,
            min_interval: Duration::from_secs(self.min_post_interval_secs),
            posts_per_window: self.posts_per_window,
            window: Duration::from_secs(self.window_secs),
        }
    }

    /// All configured credential values, for redaction.
    pub fn secrets(&self) -> Vec<String> {
        [
            &self.api_key,
            &self.api_secret,
            &self.access_token,
            &self.access_token_secret,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

fn default_api_base_url() -> String {
    "https://api.twitter.com".to_string()
}

fn default_upload_base_url() -> String {
    "https://upload.twitter.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_text_length() -> usize {
    280
}

fn default_min_post_interval_secs() -> u64 {
    5
}

fn default_posts_per_window() -> u32 {
    100
}

fn default_window_secs() -> u64 {
    86_400
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("crosspost").join("crosspost.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("crosspost.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Queue, cadence and lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Ingest queue capacity. A full queue blocks the source monitor.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Maximum messages drained per processing tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Processing cadence.
    #[serde(default = "default_process_interval_secs")]
    pub process_interval_secs: u64,

    /// Retention cleanup cadence.
    #[serde(default = "default_cleanup_interval_hours")]
    pub cleanup_interval_hours: u64,

    /// Records older than this are deleted by the cleanup cadence.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Upper bound for finishing the in-flight tick on shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Window for the error count in periodic statistics.
    #[serde(default = "default_stats_error_window_hours")]
    pub stats_error_window_hours: u32,

    /// Resolve and upload attachments. When false every post is text-only.
    #[serde(default = "default_publish_media")]
    pub publish_media: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            batch_size: default_batch_size(),
            process_interval_secs: default_process_interval_secs(),
            cleanup_interval_hours: default_cleanup_interval_hours(),
            retention_days: default_retention_days(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            stats_error_window_hours: default_stats_error_window_hours(),
            publish_media: default_publish_media(),
        }
    }
}

fn default_queue_capacity() -> usize {
    200
}

fn default_batch_size() -> usize {
    20
}

fn default_process_interval_secs() -> u64 {
    60
}

fn default_cleanup_interval_hours() -> u64 {
    24
}

fn default_retention_days() -> u32 {
    30
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_stats_error_window_hours() -> u32 {
    24
}

fn default_publish_media() -> bool {
    true
}

/// Retry policy for transient publish failures.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total publish attempts per message, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Ceiling for the exponential delay (before retry-after floors).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Additive jitter as a fraction of the computed delay.
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_max_delay_ms() -> u64 {
    900_000
}

fn default_jitter_ratio() -> f64 {
    0.2
}

/// Spam and content heuristics. All thresholds are business policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Maximum number of URLs in a message.
    #[serde(default = "default_max_urls")]
    pub max_urls: usize,

    /// Maximum share of whitespace-separated tokens that are URLs.
    #[serde(default = "default_max_url_density")]
    pub max_url_density: f64,

    /// Longest allowed run of one repeated character.
    #[serde(default = "default_max_repeated_chars")]
    pub max_repeated_chars: usize,

    /// Most back-to-back copies allowed of a 2 to 8 character sequence
    /// inside one word (`FREEFREEFREE...`).
    #[serde(default = "default_max_substring_repeats")]
    pub max_substring_repeats: usize,

    /// Maximum share of tokens taken by the single most frequent token.
    #[serde(default = "default_max_token_repetition")]
    pub max_token_repetition: f64,

    /// Promotional keywords, matched case-insensitively on word boundaries.
    #[serde(default = "default_blocked_keywords")]
    pub blocked_keywords: Vec<String>,

    /// Minimum cleaned text length for messages without media.
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Reject messages that consist of a single URL.
    #[serde(default = "default_reject_link_only")]
    pub reject_link_only: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_urls: default_max_urls(),
            max_url_density: default_max_url_density(),
            max_repeated_chars: default_max_repeated_chars(),
            max_substring_repeats: default_max_substring_repeats(),
            max_token_repetition: default_max_token_repetition(),
            blocked_keywords: default_blocked_keywords(),
            min_text_length: default_min_text_length(),
            reject_link_only: default_reject_link_only(),
        }
    }
}

fn default_max_urls() -> usize {
    2
}

fn default_max_url_density() -> f64 {
    0.5
}

fn default_max_repeated_chars() -> usize {
    9
}

fn default_max_substring_repeats() -> usize {
    4
}

fn default_max_token_repetition() -> f64 {
    0.5
}

fn default_blocked_keywords() -> Vec<String> {
    ["spam", "advertisement", "promotion", "bot"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_min_text_length() -> usize {
    10
}

fn default_reject_link_only() -> bool {
    true
}

/// Text rewriting for the target platform.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransformConfig {
    /// Tags appended to every post (skipped when already present).
    ///
    /// Empty by default, so posts go out untagged until tags are configured.
    /// `crosspost serve` warns at startup when the list is empty.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Marker appended to truncated text.
    #[serde(default = "default_truncation_indicator")]
    pub truncation_indicator: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            truncation_indicator: default_truncation_indicator(),
        }
    }
}

fn default_truncation_indicator() -> String {
    "...".to_string()
}

/// Defaults for the `errors` report command.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Look-back window in hours.
    #[serde(default = "default_report_hours")]
    pub default_hours: u32,

    /// Maximum entries listed.
    #[serde(default = "default_report_limit")]
    pub default_limit: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_hours: default_report_hours(),
            default_limit: default_report_limit(),
        }
    }
}

fn default_report_hours() -> u32 {
    24
}

fn default_report_limit() -> u32 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_platform_limits() {
        let config = CrosspostConfig::default();
        assert_eq!(config.twitter.max_text_length, 280);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.bridge.retention_days, 30);
        assert_eq!(config.bridge.process_interval_secs, 60);
        assert_eq!(config.bridge.cleanup_interval_hours, 24);
        assert!(config.transform.tags.is_empty());
    }

    #[test]
    fn limits_convert_seconds() {
        let twitter = TwitterConfig {
            min_post_interval_secs: 7,
            window_secs: 900,
            posts_per_window: 50,
            ..TwitterConfig::default()
        };
        let limits = twitter.limits();
        assert_eq!(limits.min_interval, Duration::from_secs(7));
        assert_eq!(limits.window, Duration::from_secs(900));
        assert_eq!(limits.posts_per_window, 50);
        assert_eq!(limits.max_text_length, 280);
    }

    #[test]
    fn secrets_skip_unset_credentials() {
        let twitter = TwitterConfig {
            api_key: Some("ck".into()),
            access_token_secret: Some("ats".into()),
            ..TwitterConfig::default()
        };
        assert_eq!(twitter.secrets(), vec!["ck".to_string(), "ats".to_string()]);
    }
}
