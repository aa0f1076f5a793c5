// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret redaction for persisted error messages.
//!
//! Error text from HTTP clients can echo request headers or URLs. Everything
//! written to the error log goes through [`redact`] first.

use std::sync::LazyLock;

use regex::Regex;

/// Known secret patterns to redact from output.
static REDACTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Telegram bot tokens: 123456789:ABCdefGHI-zyx57W2v1u123ew11
        Regex::new(r"\d{8,10}:[a-zA-Z0-9_\-]{35}").unwrap(),
        // Bearer tokens in headers
        Regex::new(r"Bearer\s+[a-zA-Z0-9._\-%]{10,}").unwrap(),
        // OAuth 1.0a header parameters
        Regex::new(r#"oauth_(signature|token|consumer_key|nonce)="[^"]*""#).unwrap(),
    ]
});

/// The redaction placeholder.
const REDACTED: &str = "[REDACTED]";

/// Redact secrets from a string using regex patterns and exact-match values.
///
/// `known_secrets` are configured credential values; empty entries are ignored.
pub fn redact(input: &str, known_secrets: &[String]) -> String {
    let mut result = input.to_string();

    for pattern in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, REDACTED).to_string();
    }

    // Longest first so a secret that contains another is replaced whole.
    let mut sorted: Vec<&String> = known_secrets.iter().collect();
    sorted.sort_by_key(|v| std::cmp::Reverse(v.len()));
    for value in sorted {
        if !value.is_empty() {
            result = result.replace(value.as_str(), REDACTED);
        }
    }

    result
}
