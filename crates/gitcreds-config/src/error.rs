//! Error types for configuration parsing

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML at {path}: {source}")]
    TomlParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse YAML at {path}: {source}")]
    YamlParseError {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    /// True for errors caused by undecodable content rather than I/O
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ConfigError::TomlParseError { .. } | ConfigError::YamlParseError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
