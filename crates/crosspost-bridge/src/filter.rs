// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spam and content heuristics deciding whether a message is republished.
//!
//! URL, repetition and keyword checks look at the raw text, since markup
//! stripping can hide URLs behind link labels. Emptiness and length checks
//! look at the cleaned text that would actually be published.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crosspost_config::model::FilterConfig;
use crosspost_core::error::CrosspostError;
use regex::Regex;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").unwrap());

/// Why a message was filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterReason {
    /// Nothing left to publish after cleaning.
    Empty,
    TooShort { length: usize, min: usize },
    /// The cleaned text is a bare link.
    LinkOnly,
    TooManyUrls { count: usize, max: usize },
    UrlDensity { urls: usize, tokens: usize },
    RepeatedCharacters { run: usize },
    RepeatedSubstring { unit: String, repeats: usize },
    RepeatedTokens { token: String, count: usize },
    BlockedKeyword(String),
}

impl FilterReason {
    /// Short machine-friendly label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            FilterReason::Empty => "empty",
            FilterReason::TooShort { .. } => "too_short",
            FilterReason::LinkOnly => "link_only",
            FilterReason::TooManyUrls { .. } => "too_many_urls",
            FilterReason::UrlDensity { .. } => "url_density",
            FilterReason::RepeatedCharacters { .. } => "repeated_characters",
            FilterReason::RepeatedSubstring { .. } => "repeated_substring",
            FilterReason::RepeatedTokens { .. } => "repeated_tokens",
            FilterReason::BlockedKeyword(_) => "blocked_keyword",
        }
    }
}

impl fmt::Display for FilterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterReason::Empty => write!(f, "empty after cleaning"),
            FilterReason::TooShort { length, min } => {
                write!(f, "text too short ({length} < {min} characters)")
            }
            FilterReason::LinkOnly => write!(f, "message is a bare link"),
            FilterReason::TooManyUrls { count, max } => {
                write!(f, "{count} URLs exceed the limit of {max}")
            }
            FilterReason::UrlDensity { urls, tokens } => {
                write!(f, "{urls} of {tokens} words are URLs")
            }
            FilterReason::RepeatedCharacters { run } => {
                write!(f, "same character repeated {run} times")
            }
            FilterReason::RepeatedSubstring { unit, repeats } => {
                write!(f, "{unit:?} repeated {repeats} times in a row")
            }
            FilterReason::RepeatedTokens { token, count } => {
                write!(f, "word {token:?} repeated {count} times")
            }
            FilterReason::BlockedKeyword(keyword) => {
                write!(f, "contains blocked keyword {keyword:?}")
            }
        }
    }
}

/// Token repetition is only judged on texts at least this long.
const MIN_TOKENS_FOR_REPETITION: usize = 4;

/// Sequence lengths considered by the repeated-substring check.
const SUBSTRING_UNITS: std::ops::RangeInclusive<usize> = 2..=8;

/// Configured spam filter.
#[derive(Debug, Clone)]
pub struct SpamFilter {
    config: FilterConfig,
    keywords: Option<Regex>,
}

impl SpamFilter {
    pub fn new(config: FilterConfig) -> Result<Self, CrosspostError> {
        let keywords = if config.blocked_keywords.is_empty() {
            None
        } else {
            let alternation = config
                .blocked_keywords
                .iter()
                .map(|k| regex::escape(k.trim()))
                .collect::<Vec<_>>()
                .join("|");
            let pattern = format!(r"(?i)\b(?:{alternation})\b");
            Some(Regex::new(&pattern).map_err(|e| {
                CrosspostError::Config(format!("invalid blocked keyword list: {e}"))
            })?)
        };
        Ok(Self { config, keywords })
    }

    /// Check a message. `raw_text` is the text as received, `cleaned_text`
    /// the markup-stripped text.
    pub fn check(
        &self,
        raw_text: &str,
        cleaned_text: &str,
        has_media: bool,
    ) -> Result<(), FilterReason> {
        let cleaned = cleaned_text.trim();
        if cleaned.is_empty() {
            return Err(FilterReason::Empty);
        }
        if self.config.reject_link_only && is_link_only(cleaned) {
            return Err(FilterReason::LinkOnly);
        }

        self.check_urls(raw_text)?;
        self.check_repeated_chars(raw_text)?;
        self.check_repeated_substrings(raw_text)?;
        self.check_repeated_tokens(raw_text)?;
        if let Some(keywords) = &self.keywords
            && let Some(found) = keywords.find(raw_text)
        {
            return Err(FilterReason::BlockedKeyword(found.as_str().to_lowercase()));
        }

        let length = cleaned.chars().count();
        if !has_media && length < self.config.min_text_length {
            return Err(FilterReason::TooShort {
                length,
                min: self.config.min_text_length,
            });
        }
        Ok(())
    }

    fn check_urls(&self, text: &str) -> Result<(), FilterReason> {
        let urls = URL_PATTERN.find_iter(text).count();
        if urls > self.config.max_urls {
            return Err(FilterReason::TooManyUrls {
                count: urls,
                max: self.config.max_urls,
            });
        }
        let tokens = text.split_whitespace().count();
        if urls > 0 && tokens > 0 && urls as f64 / tokens as f64 > self.config.max_url_density {
            return Err(FilterReason::UrlDensity { urls, tokens });
        }
        Ok(())
    }

    fn check_repeated_chars(&self, text: &str) -> Result<(), FilterReason> {
        let mut longest = 0;
        let mut run = 0;
        let mut previous = None;
        for c in text.chars() {
            if c.is_whitespace() {
                run = 0;
                previous = None;
                continue;
            }
            if previous == Some(c) {
                run += 1;
            } else {
                run = 1;
                previous = Some(c);
            }
            longest = longest.max(run);
        }
        if longest > self.config.max_repeated_chars {
            return Err(FilterReason::RepeatedCharacters { run: longest });
        }
        Ok(())
    }

    fn check_repeated_substrings(&self, text: &str) -> Result<(), FilterReason> {
        let limit = self.config.max_substring_repeats;
        for word in text.split_whitespace() {
            let chars: Vec<char> = word.chars().flat_map(char::to_lowercase).collect();
            if let Some((unit, repeats)) = longest_repeat(&chars, limit) {
                return Err(FilterReason::RepeatedSubstring { unit, repeats });
            }
        }
        Ok(())
    }

    fn check_repeated_tokens(&self, text: &str) -> Result<(), FilterReason> {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|t| {
                t.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() < MIN_TOKENS_FOR_REPETITION {
            return Ok(());
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in &tokens {
            *counts.entry(token.as_str()).or_default() += 1;
        }
        if let Some((token, count)) = counts.into_iter().max_by_key(|(_, n)| *n)
            && count as f64 / tokens.len() as f64 > self.config.max_token_repetition
        {
            return Err(FilterReason::RepeatedTokens {
                token: token.to_string(),
                count,
            });
        }
        Ok(())
    }
}

/// First unit whose back-to-back copies in `chars` exceed `limit`.
/// Units made of a single repeated character are left to the run check.
fn longest_repeat(chars: &[char], limit: usize) -> Option<(String, usize)> {
    for size in SUBSTRING_UNITS {
        if chars.len() < size * (limit + 1) {
            break;
        }
        for start in 0..=chars.len() - size {
            let unit = &chars[start..start + size];
            if unit.iter().all(|c| *c == unit[0]) {
                continue;
            }
            let mut repeats = 1;
            let mut next = start + size;
            while next + size <= chars.len() && &chars[next..next + size] == unit {
                repeats += 1;
                next += size;
            }
            if repeats > limit {
                return Some((unit.iter().collect(), repeats));
            }
        }
    }
    None
}

fn is_link_only(cleaned: &str) -> bool {
    let mut words = cleaned.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => URL_PATTERN
            .find(word)
            .is_some_and(|m| m.start() == 0 && m.end() == word.len()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SpamFilter {
        SpamFilter::new(FilterConfig::default()).unwrap()
    }

    fn check(text: &str) -> Result<(), FilterReason> {
        filter().check(text, text, false)
    }

    #[test]
    fn ordinary_news_passes() {
        assert_eq!(
            check("The city council approved the new budget on Tuesday evening."),
            Ok(())
        );
        assert_eq!(
            check("Full report here: https://example.com/report and more tomorrow"),
            Ok(())
        );
    }

    #[test]
    fn too_many_urls_are_rejected() {
        assert_eq!(
            check("Breaking news!!! http://x http://y http://z"),
            Err(FilterReason::TooManyUrls { count: 3, max: 2 })
        );
    }

    #[test]
    fn url_heavy_text_is_rejected() {
        assert_eq!(
            check("see https://a.example https://b.example"),
            Err(FilterReason::UrlDensity { urls: 2, tokens: 3 })
        );
    }

    #[test]
    fn bare_link_is_rejected_when_configured() {
        assert_eq!(check("https://example.com/x"), Err(FilterReason::LinkOnly));

        let lenient = SpamFilter::new(FilterConfig {
            reject_link_only: false,
            max_url_density: 1.0,
            ..FilterConfig::default()
        })
        .unwrap();
        assert!(
            lenient
                .check("https://example.com/long-path", "https://example.com/long-path", false)
                .is_ok()
        );
    }

    #[test]
    fn long_character_runs_are_rejected() {
        assert_eq!(
            check("WINNER!!!!!!!!!!!!! claim your prize now"),
            Err(FilterReason::RepeatedCharacters { run: 13 })
        );
        assert!(check("Wow!!! that was close, really close").is_ok());
    }

    #[test]
    fn repeated_substrings_inside_a_word_are_rejected() {
        assert_eq!(
            check("Claim now FREEFREEFREEFREEFREE offer today"),
            Err(FilterReason::RepeatedSubstring {
                unit: "free".into(),
                repeats: 5
            })
        );
        assert_eq!(
            check("lolololololol that was a good one"),
            Err(FilterReason::RepeatedSubstring {
                unit: "lo".into(),
                repeats: 6
            })
        );
    }

    #[test]
    fn ordinary_repetition_inside_words_is_allowed() {
        assert!(check("hahahaha the Mississippi ferry is back in service").is_ok());
        assert!(check("Bonbon makers in Baden-Baden expand production").is_ok());

        let strict = SpamFilter::new(FilterConfig {
            max_substring_repeats: 3,
            ..FilterConfig::default()
        })
        .unwrap();
        let text = "hahahaha the ferry is back in service";
        assert!(matches!(
            strict.check(text, text, false),
            Err(FilterReason::RepeatedSubstring { repeats: 4, .. })
        ));
    }

    #[test]
    fn repeated_words_are_rejected() {
        let result = check("buy buy buy buy now friends");
        assert_eq!(
            result,
            Err(FilterReason::RepeatedTokens {
                token: "buy".into(),
                count: 4
            })
        );
    }

    #[test]
    fn keywords_match_whole_words_ignoring_case() {
        assert_eq!(
            check("Exclusive PROMOTION for our readers this week"),
            Err(FilterReason::BlockedKeyword("promotion".into()))
        );
        assert!(check("A robot competition was held in the capital").is_ok());
    }

    #[test]
    fn empty_text_is_rejected_even_with_media() {
        assert_eq!(filter().check("  ", "", true), Err(FilterReason::Empty));
    }

    #[test]
    fn short_text_is_allowed_with_media() {
        assert_eq!(
            filter().check("Look", "Look", false),
            Err(FilterReason::TooShort { length: 4, min: 10 })
        );
        assert_eq!(filter().check("Look", "Look", true), Ok(()));
    }

    #[test]
    fn url_hidden_in_markup_still_counts() {
        let raw = "[one](http://a) [two](http://b) [three](http://c) today";
        let cleaned = "one two three today";
        assert!(matches!(
            filter().check(raw, cleaned, false),
            Err(FilterReason::TooManyUrls { count: 3, .. })
        ));
    }

    #[test]
    fn reasons_have_labels_and_messages() {
        let reason = FilterReason::TooManyUrls { count: 3, max: 2 };
        assert_eq!(reason.label(), "too_many_urls");
        assert_eq!(reason.to_string(), "3 URLs exceed the limit of 2");
    }
}
