//! Buildpack metadata
//!
//! Located at `<buildpack_dir>/buildpack.toml`. Only the `[buildpack]` table and
//! the `[metadata.configuration]` table are consulted.

use crate::{ConfigError, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// File name of the buildpack metadata document
pub const BUILDPACK_TOML: &str = "buildpack.toml";

/// Cache timeout used when `default_timeout` is not configured
pub const DEFAULT_CACHE_TIMEOUT: u64 = 3600;

/// Static defaults read from `[metadata.configuration]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Seconds the git credential cache keeps entries
    #[serde(deserialize_with = "deserialize_timeout")]
    pub default_timeout: Option<u64>,
    pub default_protocol: String,
    pub default_host: String,
    pub default_path: String,
    pub default_url: String,
}

impl Configuration {
    /// Effective credential cache timeout in seconds
    pub fn cache_timeout(&self) -> u64 {
        self.default_timeout.unwrap_or(DEFAULT_CACHE_TIMEOUT)
    }
}

/// Identity of the buildpack from the `[buildpack]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildpackInfo {
    pub id: String,
    pub name: String,
    pub version: String,
}

impl BuildpackInfo {
    /// Title line logged at the start of each phase
    pub fn title(&self) -> String {
        format!("{} {}", self.name, self.version).trim().to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Metadata {
    configuration: Configuration,
}

/// Parsed `buildpack.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildpackToml {
    pub buildpack: BuildpackInfo,
    metadata: Metadata,
}

impl BuildpackToml {
    /// Load `buildpack.toml` from the buildpack directory.
    ///
    /// A missing file is an error. A file without the relevant tables yields
    /// empty values.
    pub fn load(buildpack_dir: &Path) -> Result<Self> {
        let path = buildpack_dir.join(BUILDPACK_TOML);

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let parsed: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(
            "Loaded {:?}: buildpack={:?} timeout={:?}",
            path,
            parsed.buildpack.id,
            parsed.metadata.configuration.default_timeout
        );

        Ok(parsed)
    }

    pub fn configuration(&self) -> &Configuration {
        &self.metadata.configuration
    }
}

/// Read the `[metadata.configuration]` table of `<buildpack_dir>/buildpack.toml`
pub fn read_configuration(buildpack_dir: &Path) -> Result<Configuration> {
    BuildpackToml::load(buildpack_dir).map(|b| b.metadata.configuration)
}

/// Accepts `default_timeout = 3600` as well as `default_timeout = "3600"`.
/// An empty string counts as unset.
fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimeout {
        Seconds(u64),
        Text(String),
    }

    match Option::<RawTimeout>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimeout::Seconds(secs)) => Ok(Some(secs)),
        Some(RawTimeout::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<u64>().map(Some).map_err(|_| {
                D::Error::custom(format!(
                    "invalid default_timeout {:?}, expected a number of seconds",
                    text
                ))
            })
        }
    }
}
