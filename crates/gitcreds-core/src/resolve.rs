//! Credential source resolution
//!
//! Two sources feed one ordered list: credentials declared in `buildpack.yml`
//! first, then at most one credential taken from `GIT_CREDENTIALS_*`
//! environment variables. Later entries win when git configuration keys collide.

use crate::{CoreError, Credential, Result};
use gitcreds_config::{BuildpackYml, Configuration};
use std::collections::HashMap;
use std::path::Path;

pub const ENV_USERNAME: &str = "GIT_CREDENTIALS_USERNAME";
pub const ENV_PASSWORD: &str = "GIT_CREDENTIALS_PASSWORD";
pub const ENV_PROTOCOL: &str = "GIT_CREDENTIALS_PROTOCOL";
pub const ENV_HOST: &str = "GIT_CREDENTIALS_HOST";
pub const ENV_PATH: &str = "GIT_CREDENTIALS_PATH";
pub const ENV_URL: &str = "GIT_CREDENTIALS_URL";

/// Source of environment variables
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
}

/// The environment of the running process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Value of `key` when set and non-empty
fn non_empty(env: &dyn Environment, key: &str) -> Option<String> {
    env.var(key).filter(|v| !v.is_empty())
}

/// Credential from `GIT_CREDENTIALS_*`.
///
/// Only produced when both username and password are set and non-empty.
/// Protocol, host, path and URL fall back to the configured defaults.
pub fn resolve_from_env(env: &dyn Environment, configuration: &Configuration) -> Option<Credential> {
    let credential = Credential {
        protocol: non_empty(env, ENV_PROTOCOL)
            .unwrap_or_else(|| configuration.default_protocol.clone()),
        host: non_empty(env, ENV_HOST).unwrap_or_else(|| configuration.default_host.clone()),
        path: non_empty(env, ENV_PATH).unwrap_or_else(|| configuration.default_path.clone()),
        url: non_empty(env, ENV_URL).unwrap_or_else(|| configuration.default_url.clone()),
        username: env.var(ENV_USERNAME).unwrap_or_default(),
        password: env.var(ENV_PASSWORD).unwrap_or_default(),
    };
    if !credential.is_eligible() {
        return None;
    }

    tracing::info!(
        "Using environment variables {} and {}",
        ENV_USERNAME,
        ENV_PASSWORD
    );
    Some(credential)
}

/// Credentials declared in `<working_dir>/buildpack.yml`, in file order.
///
/// Declared credentials are not filtered by eligibility.
pub fn resolve_from_file(working_dir: &Path) -> Result<Vec<Credential>> {
    let yml = BuildpackYml::load_from_dir(working_dir)?;
    Ok(yml.credentials.into_iter().map(Credential::from).collect())
}

/// Resolve the ordered credential set for one invocation.
///
/// Fails with [`CoreError::NoCredentials`] when neither source yields anything,
/// and with [`CoreError::InvalidCredential`] when a value cannot be carried by
/// the credential handshake.
pub fn resolve(
    env: &dyn Environment,
    configuration: &Configuration,
    working_dir: &Path,
) -> Result<Vec<Credential>> {
    let from_env = resolve_from_env(env, configuration);
    let mut credentials = resolve_from_file(working_dir)?;
    credentials.extend(from_env);

    if credentials.is_empty() {
        return Err(CoreError::NoCredentials);
    }
    for (index, credential) in credentials.iter().enumerate() {
        if let Some(field) = credential.unsafe_field() {
            return Err(CoreError::InvalidCredential {
                index: index + 1,
                field,
            });
        }
    }

    tracing::debug!("Resolved {} credential(s)", credentials.len());
    Ok(credentials)
}
