//! Error types for gitcreds-core

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] gitcreds_config::ConfigError),

    #[error(transparent)]
    Git(#[from] gitcreds_git::GitError),

    #[error("No credentials were specified either in environment variables or in the buildpack.yml")]
    NoCredentials,

    #[error("Credential #{index} has a {field} containing a newline or NUL character")]
    InvalidCredential { index: usize, field: &'static str },

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
