// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rewrites channel text for the target platform.
//!
//! Markup the target cannot render is stripped, the configured tags are
//! appended, and the result is cut to the target's maximum length on a word
//! boundary. Lengths are counted in Unicode scalar values.

use std::sync::LazyLock;

use crosspost_config::model::TransformConfig;
use regex::Regex;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());
static EXTRA_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n(\s*\n)+").unwrap());

/// Remove markup the target platform cannot render.
pub fn clean_markup(text: &str) -> String {
    let text = CODE_BLOCK.replace_all(text, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = MARKDOWN_LINK.replace_all(&text, "$1");
    let text = EXTRA_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Output of [`Transformer::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub final_text: String,
    pub added_tags: Vec<String>,
    pub truncated: bool,
}

/// Appends tags and enforces the target's length limit.
#[derive(Debug, Clone)]
pub struct Transformer {
    tags: Vec<String>,
    indicator: String,
    max_len: usize,
}

impl Transformer {
    pub fn new(config: &TransformConfig, max_len: usize) -> Self {
        Self {
            tags: config
                .tags
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            indicator: config.truncation_indicator.clone(),
            max_len,
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Produce the publishable text from already-cleaned text.
    pub fn apply(&self, cleaned: &str) -> Transformed {
        let mut added_tags = self.missing_tags(cleaned);
        let mut suffix = tag_suffix(&added_tags);

        let body_len = char_len(cleaned);
        if body_len + char_len(&suffix) <= self.max_len {
            return Transformed {
                final_text: format!("{cleaned}{suffix}"),
                added_tags,
                truncated: false,
            };
        }

        let indicator_len = char_len(&self.indicator);
        if char_len(&suffix) + indicator_len >= self.max_len {
            added_tags.clear();
            suffix.clear();
        }
        let budget = self
            .max_len
            .saturating_sub(char_len(&suffix) + indicator_len);
        let body = truncate_at_word(cleaned, budget);
        let mut final_text = format!("{body}{}{suffix}", self.indicator);
        if char_len(&final_text) > self.max_len {
            // Only reachable when the indicator alone exceeds the limit.
            final_text = final_text.chars().take(self.max_len).collect();
        }

        Transformed {
            final_text,
            added_tags,
            truncated: true,
        }
    }

    /// Configured tags not already present in the text, case-insensitively.
    fn missing_tags(&self, text: &str) -> Vec<String> {
        let present: Vec<String> = text
            .split_whitespace()
            .map(|w| {
                w.trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '#')
                    .to_lowercase()
            })
            .collect();
        let mut missing: Vec<String> = Vec::new();
        for tag in &self.tags {
            let lowered = tag.to_lowercase();
            let seen = present.contains(&lowered)
                || missing.iter().any(|t| t.to_lowercase() == lowered);
            if !seen {
                missing.push(tag.clone());
            }
        }
        missing
    }
}

fn tag_suffix(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" {}", tags.join(" "))
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Longest prefix of `text` with at most `budget` characters that does not
/// end inside a word. A single word longer than the budget is hard-cut.
pub(crate) fn truncate_at_word(text: &str, budget: usize) -> &str {
    let cut = match text.char_indices().nth(budget) {
        Some((idx, _)) => idx,
        None => return text.trim_end(),
    };
    let next_is_space = text[cut..].starts_with(char::is_whitespace);
    let prefix = &text[..cut];
    if next_is_space {
        return prefix.trim_end();
    }
    match prefix.rfind(char::is_whitespace) {
        Some(space) => prefix[..space].trim_end(),
        None => prefix,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn transformer(tags: &[&str], max_len: usize) -> Transformer {
        let config = TransformConfig {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            truncation_indicator: "...".into(),
        };
        Transformer::new(&config, max_len)
    }

    #[test]
    fn strips_code_and_links() {
        let raw = "Read [the report](https://example.com/r) now\n```\nlet x = 1;\n```\nuse `cargo`";
        assert_eq!(clean_markup(raw), "Read the report now\n\nuse cargo");
    }

    #[test]
    fn collapses_blank_lines() {
        assert_eq!(clean_markup("  one\n\n\n\ntwo  "), "one\n\ntwo");
    }

    #[test]
    fn short_text_gets_tags_without_truncation() {
        let out = transformer(&["#news", "#world"], 280).apply("Quiet day in the markets");
        assert_eq!(out.final_text, "Quiet day in the markets #news #world");
        assert_eq!(out.added_tags, ["#news", "#world"]);
        assert!(!out.truncated);
    }

    #[test]
    fn tags_already_present_are_not_repeated() {
        let out = transformer(&["#News", "#world"], 280).apply("Election results are in #news.");
        assert_eq!(out.final_text, "Election results are in #news. #world");
        assert_eq!(out.added_tags, ["#world"]);
    }

    #[test]
    fn duplicate_configured_tags_are_added_once() {
        let out = transformer(&["#a", "#A"], 280).apply("text");
        assert_eq!(out.added_tags, ["#a"]);
    }

    #[test]
    fn truncates_on_word_boundary_and_keeps_tags() {
        let out = transformer(&["#news"], 30).apply("alpha beta gamma delta epsilon zeta");
        assert!(out.truncated);
        assert_eq!(out.final_text, "alpha beta gamma... #news");
        assert!(out.final_text.chars().count() <= 30);
    }

    #[test]
    fn exact_fit_is_not_truncated() {
        let out = transformer(&[], 11).apply("hello world");
        assert_eq!(out.final_text, "hello world");
        assert!(!out.truncated);
    }

    #[test]
    fn overlong_single_word_is_hard_cut() {
        let out = transformer(&[], 10).apply("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(out.final_text, "abcdefg...");
    }

    #[test]
    fn counts_characters_not_bytes() {
        let out = transformer(&[], 12).apply("ñandú ñandú ñandú");
        assert_eq!(out.final_text, "ñandú...");
    }

    #[test]
    fn truncate_at_word_cases() {
        assert_eq!(truncate_at_word("one two three", 7), "one two");
        assert_eq!(truncate_at_word("one two three", 6), "one");
        assert_eq!(truncate_at_word("one two", 50), "one two");
        assert_eq!(truncate_at_word("one two", 0), "");
    }

    proptest! {
        #[test]
        fn truncated_text_fits_and_ends_on_word(
            words in prop::collection::vec("[a-zA-Z0-9]{1,12}", 1..80),
            max_len in 40usize..300,
        ) {
            let text = words.join(" ");
            prop_assume!(text.chars().count() > max_len);

            let t = transformer(&["#tag"], max_len);
            let out = t.apply(&text);

            prop_assert!(out.truncated);
            prop_assert!(out.final_text.chars().count() <= max_len);
            prop_assert!(out.final_text.ends_with("... #tag"));

            let body = out.final_text.trim_end_matches("... #tag");
            prop_assert!(text.starts_with(body));
            if body.contains(' ') {
                let rest = &text[body.len()..];
                prop_assert!(rest.starts_with(' '), "body {:?} splits a word", body);
            }
        }
    }
}
