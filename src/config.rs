//! File-backed configuration for substitution map behavior.
//!
//! ```toml
//! [substitution]
//! check_analyzed = true
//! verify = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::options::SmapOptions;

/// Planner-side settings loaded from TOML.
#[derive(Debug, Clone, Default)]
pub struct SmapConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl SmapConfig {
    /// Reads the config at `path`. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = if path.exists() {
            read_file(path)?
        } else {
            RawConfig::default()
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            data,
        })
    }

    /// Parses config from an in-memory TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let data = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Ok(Self { path: None, data })
    }

    /// File this config was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Map options described by this config; unset keys keep their defaults.
    pub fn options(&self) -> SmapOptions {
        let defaults = SmapOptions::default();
        let section = &self.data.substitution;
        SmapOptions {
            check_analyzed: section.check_analyzed.unwrap_or(defaults.check_analyzed),
            verify: section.verify.unwrap_or(defaults.verify),
        }
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    substitution: SubstitutionSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct SubstitutionSection {
    check_analyzed: Option<bool>,
    verify: Option<bool>,
}

/// Errors raised while loading [`SmapConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Underlying parse failure.
        source: toml::de::Error,
    },
}
