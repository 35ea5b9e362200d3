//! Detect phase: decide whether the build phase should run

use crate::{resolve, BuildPlan, CoreError, Environment, Result};
use gitcreds_config::BuildpackToml;
use std::path::PathBuf;

/// Paths handed to the detect phase by the lifecycle
#[derive(Debug, Clone)]
pub struct DetectContext {
    /// Directory holding `buildpack.toml`
    pub buildpack_dir: PathBuf,
    /// Application directory holding the optional `buildpack.yml`
    pub working_dir: PathBuf,
}

/// Why detect declined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclineReason {
    /// Neither the environment nor `buildpack.yml` yielded a credential
    NoCredentials,
    /// `buildpack.yml` exists but cannot be decoded
    MalformedBuildpackYml(String),
}

impl std::fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclineReason::NoCredentials => write!(
                f,
                "could not find GIT credentials in environment or in buildpack.yml"
            ),
            DeclineReason::MalformedBuildpackYml(detail) => {
                write!(f, "buildpack.yml is malformed: {}", detail)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectOutcome {
    Participate(BuildPlan),
    Decline(DeclineReason),
}

/// Run the detect phase.
///
/// Performs the same resolution as the build phase without touching git.
/// A decline is a normal outcome; only unexpected failures (e.g. unreadable
/// `buildpack.toml`) are errors.
pub fn detect(context: &DetectContext, env: &dyn Environment) -> Result<DetectOutcome> {
    let buildpack = BuildpackToml::load(&context.buildpack_dir)?;
    tracing::info!("{}", buildpack.buildpack.title());

    let outcome = match resolve(env, buildpack.configuration(), &context.working_dir) {
        Ok(_) => DetectOutcome::Participate(BuildPlan::gitcredentials()),
        Err(CoreError::NoCredentials) => DetectOutcome::Decline(DeclineReason::NoCredentials),
        Err(CoreError::Config(e)) if e.is_parse_error() => {
            DetectOutcome::Decline(DeclineReason::MalformedBuildpackYml(e.to_string()))
        }
        Err(e) => return Err(e),
    };

    if let DetectOutcome::Decline(reason) = &outcome {
        tracing::info!("Not participating: {}", reason);
    }

    Ok(outcome)
}
