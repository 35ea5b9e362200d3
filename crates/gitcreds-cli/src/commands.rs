//! Lifecycle command implementations

use anyhow::{Context, Result};
use gitcreds_core::{BuildContext, DetectContext, DetectOutcome, Environment, Provisioner};
use gitcreds_git::{GitRunner, GlobalGitConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Exit status telling the lifecycle the buildpack does not participate
pub const EXIT_DECLINE: i32 = 100;

/// Buildpack root: the explicit directory, or the parent of the directory
/// holding this executable (`<root>/bin/<phase>`).
pub fn buildpack_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    exe.parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .with_context(|| format!("Cannot derive the buildpack directory from {}", exe.display()))
}

/// Application directory: the explicit directory or the current one
pub fn working_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Failed to read the current directory"),
    }
}

/// Run detect and return the process exit status.
///
/// Writes the build plan to `plan_path` when participating.
pub fn detect(context: &DetectContext, env: &dyn Environment, plan_path: &Path) -> Result<i32> {
    match gitcreds_core::detect(context, env)? {
        DetectOutcome::Participate(plan) => {
            plan.write(plan_path)?;
            tracing::debug!("Wrote build plan to {:?}", plan_path);
            Ok(0)
        }
        DetectOutcome::Decline(_) => Ok(EXIT_DECLINE),
    }
}

/// Run build against `git`
pub async fn build(
    context: &BuildContext,
    env: &dyn Environment,
    git: Arc<dyn GitRunner>,
) -> Result<()> {
    let store = GlobalGitConfig::new(git.clone());
    let provisioner = Provisioner::new(&store, git.as_ref());
    let result = gitcreds_core::build(context, env, &provisioner).await?;
    for layer in &result.layers {
        tracing::debug!("Contributed layer {}", layer.name);
    }
    Ok(())
}
