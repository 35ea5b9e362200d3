//! Configuration parsing for gitcredentials
//!
//! This crate handles parsing of:
//! - Buildpack metadata (`<buildpack_dir>/buildpack.toml`)
//! - Per-build credential declarations (`<working_dir>/buildpack.yml`)

mod buildpack_toml;
mod buildpack_yml;
mod error;

pub use buildpack_toml::*;
pub use buildpack_yml::*;
pub use error::*;
