//! Git subprocess plumbing for gitcredentials
//!
//! This crate provides an abstraction over the system `git` executable:
//! one-shot commands, the stdin handshake used by `git credential approve`,
//! and a key/value view of the global git configuration.

mod cli_git;
mod config_store;
mod error;
mod types;

pub use cli_git::CliGit;
pub use config_store::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;

/// Trait for running `git` subcommands
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Run `git <args>` and capture stdout and stderr.
    ///
    /// A non-zero exit status is an error carrying the captured stderr.
    async fn run(&self, args: &[&str]) -> Result<CommandOutput>;

    /// Run `git <args>`, feeding `input` to its stdin and closing it.
    ///
    /// The input is written while stdout and stderr are drained so a child
    /// that talks before it has read everything cannot deadlock the pipes.
    async fn run_with_input(&self, args: &[&str], input: Vec<u8>) -> Result<CommandOutput>;
}
