// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order, later files overriding earlier ones:
//! `/etc/crosspost/crosspost.toml`, `~/.config/crosspost/crosspost.toml`,
//! `./crosspost.toml`. `CROSSPOST_*` environment variables override all files.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CrosspostConfig;

/// Top-level sections; used to split `CROSSPOST_<SECTION>_<KEY>` names.
const SECTIONS: &[&str] = &[
    "app",
    "telegram",
    "twitter",
    "storage",
    "bridge",
    "retry",
    "filter",
    "transform",
    "report",
];

/// Configuration files consulted by [`load_config`], lowest priority first.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/crosspost/crosspost.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("crosspost").join("crosspost.toml"));
    }
    paths.push(PathBuf::from("crosspost.toml"));
    paths
}

/// Build the Figment for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    let figment = config_file_candidates()
        .into_iter()
        .fold(defaults(), |figment, path| figment.merge(Toml::file(path)));
    figment.merge(env_provider())
}

/// Load configuration from the standard file lookup with env var overrides.
pub fn load_config() -> Result<CrosspostConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from one explicit file, skipping the standard lookup.
///
/// Environment overrides still apply.
pub fn load_config_from_path(path: &Path) -> Result<CrosspostConfig, figment::Error> {
    defaults()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML document. No env overrides.
pub fn load_config_from_str(toml_content: &str) -> Result<CrosspostConfig, figment::Error> {
    defaults().merge(Toml::string(toml_content)).extract()
}

fn defaults() -> Figment {
    Figment::new().merge(Serialized::defaults(CrosspostConfig::default()))
}

/// Env provider mapping `CROSSPOST_TWITTER_API_KEY` to `twitter.api_key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("CROSSPOST_").map(|key| section_key(key.as_str()).into())
}

fn section_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_key_splits_on_first_underscore_only() {
        assert_eq!(section_key("twitter_api_key"), "twitter.api_key");
        assert_eq!(
            section_key("bridge_stats_error_window_hours"),
            "bridge.stats_error_window_hours"
        );
        assert_eq!(section_key("retry_max_attempts"), "retry.max_attempts");
    }

    #[test]
    fn section_key_leaves_unknown_prefixes() {
        assert_eq!(section_key("unknown_thing"), "unknown_thing");
        assert_eq!(section_key("apps_log"), "apps_log");
    }

    #[test]
    fn local_file_has_highest_file_priority() {
        let candidates = config_file_candidates();
        assert_eq!(
            candidates.first(),
            Some(&PathBuf::from("/etc/crosspost/crosspost.toml"))
        );
        assert_eq!(candidates.last(), Some(&PathBuf::from("crosspost.toml")));
    }
}
