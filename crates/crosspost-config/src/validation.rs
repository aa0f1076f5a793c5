// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express. All errors are
//! collected; validation never stops at the first failure.

use crate::diagnostic::ConfigError;
use crate::model::CrosspostConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &CrosspostConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if !matches!(
        config.app.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        invalid(format!(
            "app.log_level must be one of trace, debug, info, warn, error; got `{}`",
            config.app.log_level
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        invalid("storage.database_path must not be empty".to_string());
    }

    let nonzero = [
        ("telegram.inbound_buffer", config.telegram.inbound_buffer as u64),
        ("twitter.request_timeout_secs", config.twitter.request_timeout_secs),
        ("twitter.max_text_length", config.twitter.max_text_length as u64),
        ("twitter.posts_per_window", u64::from(config.twitter.posts_per_window)),
        ("twitter.window_secs", config.twitter.window_secs),
        ("bridge.queue_capacity", config.bridge.queue_capacity as u64),
        ("bridge.batch_size", config.bridge.batch_size as u64),
        ("bridge.process_interval_secs", config.bridge.process_interval_secs),
        ("bridge.cleanup_interval_hours", config.bridge.cleanup_interval_hours),
        ("bridge.retention_days", u64::from(config.bridge.retention_days)),
        ("bridge.shutdown_timeout_secs", config.bridge.shutdown_timeout_secs),
        ("retry.max_attempts", u64::from(config.retry.max_attempts)),
        ("retry.base_delay_ms", config.retry.base_delay_ms),
        ("report.default_limit", u64::from(config.report.default_limit)),
    ];
    for (key, value) in nonzero {
        if value == 0 {
            invalid(format!("{key} must be greater than zero"));
        }
    }

    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        invalid(format!(
            "retry.max_delay_ms ({}) must not be below retry.base_delay_ms ({})",
            config.retry.max_delay_ms, config.retry.base_delay_ms
        ));
    }

    if !(0.0..=1.0).contains(&config.retry.jitter_ratio) {
        invalid(format!(
            "retry.jitter_ratio must be within [0, 1], got {}",
            config.retry.jitter_ratio
        ));
    }

    for (key, ratio) in [
        ("filter.max_url_density", config.filter.max_url_density),
        ("filter.max_token_repetition", config.filter.max_token_repetition),
    ] {
        if !(ratio > 0.0 && ratio <= 1.0) {
            invalid(format!("{key} must be within (0, 1], got {ratio}"));
        }
    }

    if config.filter.max_repeated_chars < 2 {
        invalid(format!(
            "filter.max_repeated_chars must be at least 2, got {}",
            config.filter.max_repeated_chars
        ));
    }
    if config.filter.max_substring_repeats < 2 {
        invalid(format!(
            "filter.max_substring_repeats must be at least 2, got {}",
            config.filter.max_substring_repeats
        ));
    }

    for (i, keyword) in config.filter.blocked_keywords.iter().enumerate() {
        if keyword.trim().is_empty() {
            invalid(format!("filter.blocked_keywords[{i}] must not be empty"));
        }
    }

    for (i, tag) in config.transform.tags.iter().enumerate() {
        if tag.trim().is_empty() || tag.chars().any(char::is_whitespace) {
            invalid(format!(
                "transform.tags[{i}] must be a single non-empty word, got `{tag}`"
            ));
        }
    }

    let indicator_len = config.transform.truncation_indicator.chars().count();
    if indicator_len >= config.twitter.max_text_length {
        invalid(format!(
            "transform.truncation_indicator ({indicator_len} chars) must be shorter than twitter.max_text_length"
        ));
    }

    let suffix_len: usize = config
        .transform
        .tags
        .iter()
        .map(|t| t.chars().count() + 1)
        .sum();
    if suffix_len > 0 && suffix_len * 2 >= config.twitter.max_text_length {
        invalid(format!(
            "transform.tags need {suffix_len} chars, which must stay below half of twitter.max_text_length"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check the credentials needed to run the bridge.
///
/// Kept separate from [`validate_config`] so report commands work without them.
pub fn validate_credentials(config: &CrosspostConfig) -> Result<(), Vec<ConfigError>> {
    let required = [
        ("telegram.bot_token", &config.telegram.bot_token),
        ("telegram.channel", &config.telegram.channel),
        ("twitter.api_key", &config.twitter.api_key),
        ("twitter.api_secret", &config.twitter.api_secret),
        ("twitter.access_token", &config.twitter.access_token),
        ("twitter.access_token_secret", &config.twitter.access_token_secret),
    ];

    let errors: Vec<ConfigError> = required
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
        .map(|(key, _)| ConfigError::missing(key))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Settings that are valid but probably not what the operator meant.
///
/// Returned as plain messages for the caller to log; none of them stop the bridge.
pub fn config_warnings(config: &CrosspostConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.transform.tags.iter().all(|t| t.trim().is_empty()) {
        warnings.push(
            "transform.tags is empty, posts will be published without hashtags".to_string(),
        );
    }
    warnings
}
