//! Engine configuration
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::score::ScoringPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fetch_timeout_ms must be positive")]
    ZeroTimeout,
}

/// Which list a caller is asking for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Main,
    Challenge,
    /// Any other list file, by name without the `.json` suffix.
    Named(String),
}

impl ListKind {
    /// Parse a user supplied list name; `main` and `challenge` map to the
    /// configured files, anything else is taken as a file name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "main" | "list" => Self::Main,
            "challenge" | "clist" => Self::Challenge,
            _ => Self::Named(name.trim().to_string()),
        }
    }
}

/// Where data lives and how it is scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Storage locations in priority order.
    #[serde(default = "EngineConfig::default_search_paths")]
    pub search_paths: Vec<String>,
    #[serde(default = "EngineConfig::default_main_list")]
    pub main_list: String,
    #[serde(default = "EngineConfig::default_challenge_list")]
    pub challenge_list: String,
    #[serde(default = "EngineConfig::default_editors_file")]
    pub editors_file: String,
    #[serde(default = "EngineConfig::default_packs_file")]
    pub packs_file: String,
    /// Upper bound for a single probe of a single store.
    #[serde(default = "EngineConfig::default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default)]
    pub scoring: ScoringPolicy,
}

impl EngineConfig {
    fn default_search_paths() -> Vec<String> {
        vec!["data".to_string()]
    }

    fn default_main_list() -> String {
        "_list".to_string()
    }

    fn default_challenge_list() -> String {
        "_clist".to_string()
    }

    fn default_editors_file() -> String {
        "_editors".to_string()
    }

    fn default_packs_file() -> String {
        "packs".to_string()
    }

    const fn default_fetch_timeout_ms() -> u64 {
        10_000
    }

    /// Parse configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the timeout is zero.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// # Errors
    ///
    /// Returns an error if an invariant is violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// File name (without `.json`) backing a list.
    #[must_use]
    pub fn list_file<'a>(&'a self, kind: &'a ListKind) -> &'a str {
        match kind {
            ListKind::Main => &self.main_list,
            ListKind::Challenge => &self.challenge_list,
            ListKind::Named(name) => name,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            search_paths: Self::default_search_paths(),
            main_list: Self::default_main_list(),
            challenge_list: Self::default_challenge_list(),
            editors_file: Self::default_editors_file(),
            packs_file: Self::default_packs_file(),
            fetch_timeout_ms: Self::default_fetch_timeout_ms(),
            scoring: ScoringPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn overrides_apply() {
        let config = EngineConfig::from_json(
            r#"{
                "search_paths": ["/srv/data", "https://mirror.example/data"],
                "fetch_timeout_ms": 2500,
                "scoring": { "max_rank": 100 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.search_paths.len(), 2);
        assert_eq!(config.fetch_timeout(), Duration::from_millis(2500));
        assert_eq!(config.scoring.max_rank, 100);
        assert_eq!(config.scoring.progress_max_rank, 75);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = EngineConfig::from_json(r#"{ "fetch_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));
        assert!(matches!(
            EngineConfig::from_json("{ nope").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn list_kinds_map_to_files() {
        let config = EngineConfig::default();
        assert_eq!(config.list_file(&ListKind::parse("main")), "_list");
        assert_eq!(config.list_file(&ListKind::parse("Challenge")), "_clist");
        assert_eq!(config.list_file(&ListKind::parse("_ilist")), "_ilist");
    }
}
