// src/config/options.rs
//! Runtime options, loadable from a TOML file. Every field has a default, so an
//! empty (or missing) file is a valid configuration.
//!
//! ```toml
//! [fetch]
//! timeout_secs = 20
//! retries = 3
//!
//! [medals.acm]
//! gold = 4
//! silver = 4
//! bronze = 4
//!
//! [export]
//! format = "csv"
//! ```

use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::consts::*;
use crate::standings::model::MedalCounts;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    pub fetch: FetchOptions,
    /// Per-resource medal split overriding the 4/4/4 default.
    pub medals: BTreeMap<String, MedalCounts>,
    pub export: ExportOptions,
}

impl AppOptions {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Explicit path must exist; otherwise `standings.toml` in the working
    /// directory is used when present, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let p = Path::new(DEFAULT_CONFIG_FILE);
                if p.is_file() { Self::load(p) } else { Ok(Self::default()) }
            }
        }
    }

    pub fn medal_override(&self, resource: &str) -> Option<MedalCounts> {
        self.medals.get(resource).copied()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_redirects: usize,
    pub retries: u32,
    pub backoff_ms: u64,
    pub max_pages: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: s!(USER_AGENT),
            timeout_secs: TIMEOUT_SECS,
            max_redirects: MAX_REDIRECTS,
            retries: RETRIES,
            backoff_ms: BACKOFF_MS,
            max_pages: MAX_PAGES,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self { ExportFormat::Json => "json", ExportFormat::Csv => "csv" }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let opts = AppOptions::from_toml("").unwrap();
        assert_eq!(opts, AppOptions::default());
        assert_eq!(opts.fetch.retries, RETRIES);
        assert!(opts.medal_override("acm").is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let opts = AppOptions::from_toml(
            r#"
            [fetch]
            retries = 5

            [medals.icpc]
            gold = 4
            silver = 4
            bronze = 5

            [export]
            format = "csv"
            "#,
        )
        .unwrap();
        assert_eq!(opts.fetch.retries, 5);
        assert_eq!(opts.fetch.timeout_secs, TIMEOUT_SECS);
        assert_eq!(opts.medal_override("icpc"), Some(MedalCounts { gold: 4, silver: 4, bronze: 5 }));
        assert_eq!(opts.export.format, ExportFormat::Csv);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = AppOptions::load_or_default(Some(Path::new("/nonexistent/standings.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
