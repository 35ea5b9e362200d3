//! Core logic for gitcredentials
//!
//! This crate provides:
//! - Credential resolution from the environment and `buildpack.yml`
//! - The detect decision (participate or decline)
//! - Provisioning: credential cache setup, URL rewrites, cache population
//! - Build plan and layer metadata written back to the lifecycle

mod build;
mod credential;
mod detect;
mod error;
mod lifecycle;
mod provision;
mod resolve;

pub use build::*;
pub use credential::*;
pub use detect::*;
pub use error::*;
pub use lifecycle::*;
pub use provision::*;
pub use resolve::*;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
