//! Provisioning of resolved credentials into git
//!
//! Three stages run in order, each aborting the pipeline on the first failure:
//! 1. enable the in-memory credential cache with a bounded timeout
//! 2. per credential, register the username and an SSH-to-HTTPS rewrite
//! 3. per credential, hand the secret to the cache via `git credential approve`
//!
//! Nothing is rolled back; state registered before a failure stays in place.

use crate::{BuildEnvironment, Credential, Result};
use gitcreds_config::Configuration;
use gitcreds_git::{ConfigStore, GitRunner};
use tracing::Instrument;

/// Global config key selecting the credential helper
pub const CREDENTIAL_HELPER_KEY: &str = "credential.helper";

/// Global config key holding the username for `url`
pub fn username_key(url: &str) -> String {
    format!("credential.{}.username", url)
}

/// Global config key rewriting matching remotes to `url`
pub fn instead_of_key(url: &str) -> String {
    format!("url.{}.insteadOf", url)
}

/// Applies a build environment to git
pub struct Provisioner<'a> {
    store: &'a dyn ConfigStore,
    runner: &'a dyn GitRunner,
}

impl<'a> Provisioner<'a> {
    /// `store` receives configuration state, `runner` runs the cache handshake
    pub fn new(store: &'a dyn ConfigStore, runner: &'a dyn GitRunner) -> Self {
        Self { store, runner }
    }

    /// Run all three stages for the build environment
    pub async fn provision(&self, env: &BuildEnvironment) -> Result<()> {
        async {
            self.initialize(env.configuration()).await?;
            self.configure(env.credentials()).await?;
            self.store_credentials(env.credentials()).await
        }
        .instrument(env.span().clone())
        .await
    }

    /// Configure the credential cache to keep entries in memory only
    pub async fn initialize(&self, configuration: &Configuration) -> Result<()> {
        tracing::info!("Initializing GIT credentials cache");
        let helper = format!("cache --timeout {}", configuration.cache_timeout());
        self.store.set(CREDENTIAL_HELPER_KEY, &helper).await?;
        Ok(())
    }

    /// Register username and `git@<host>:` rewrite for every credential.
    ///
    /// Later credentials overwrite earlier ones with the same effective URL.
    pub async fn configure(&self, credentials: &[Credential]) -> Result<()> {
        tracing::info!("Configuring git to use HTTPs for authentication");
        for credential in credentials {
            let url = credential.effective_url();
            self.store
                .set(&username_key(&url), &credential.username)
                .await?;
            self.store
                .set(&instead_of_key(&url), &credential.ssh_shorthand())
                .await?;
        }
        Ok(())
    }

    /// Feed every credential to `git credential approve`
    pub async fn store_credentials(&self, credentials: &[Credential]) -> Result<()> {
        tracing::info!("Adding credentials to GIT credentials cache");
        for credential in credentials {
            self.runner
                .run_with_input(
                    &["credential", "approve"],
                    credential.approve_input().into_bytes(),
                )
                .await?;
            tracing::info!("Adding credentials for {} succeeded", credential.effective_url());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFailure, MockGit};
    use crate::CoreError;
    use gitcreds_git::{CliGit, GitError, GlobalGitConfig, MemoryConfigStore};
    use std::sync::Arc;

    fn cred(host: &str, path: &str, username: &str) -> Credential {
        Credential {
            protocol: "https".to_string(),
            host: host.to_string(),
            path: path.to_string(),
            username: username.to_string(),
            password: format!("{}-secret", username),
            url: String::new(),
        }
    }

    fn configuration(timeout: Option<u64>) -> Configuration {
        Configuration {
            default_timeout: timeout,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_sets_cache_helper() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        let provisioner = Provisioner::new(&store, &git);

        provisioner.initialize(&configuration(Some(900))).await.unwrap();
        assert_eq!(
            store.get(CREDENTIAL_HELPER_KEY).await.unwrap(),
            Some("cache --timeout 900".to_string())
        );
    }

    #[tokio::test]
    async fn test_initialize_defaults_to_one_hour() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        Provisioner::new(&store, &git)
            .initialize(&configuration(None))
            .await
            .unwrap();
        assert_eq!(
            store.get(CREDENTIAL_HELPER_KEY).await.unwrap(),
            Some("cache --timeout 3600".to_string())
        );
    }

    #[tokio::test]
    async fn test_configure_registers_username_and_rewrite() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        Provisioner::new(&store, &git)
            .configure(&[cred("example.com", "/foo.git", "alice")])
            .await
            .unwrap();

        let entries = store.entries();
        assert_eq!(
            entries.get("credential.https://example.com/foo.git.username"),
            Some(&"alice".to_string())
        );
        assert_eq!(
            entries.get("url.https://example.com/foo.git.insteadOf"),
            Some(&"git@example.com:".to_string())
        );
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_configure_later_credential_wins_for_same_url() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        Provisioner::new(&store, &git)
            .configure(&[cred("example.com", "", "first"), cred("example.com", "", "second")])
            .await
            .unwrap();

        assert_eq!(
            store.get(&username_key("https://example.com/")).await.unwrap(),
            Some("second".to_string())
        );
    }

    #[tokio::test]
    async fn test_configure_explicit_url_keeps_host_shorthand() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        let mut credential = cred("github.com", "/ignored", "alice");
        credential.url = "https://mirror.example/github".to_string();

        Provisioner::new(&store, &git)
            .configure(&[credential])
            .await
            .unwrap();
        assert_eq!(
            store.get(&instead_of_key("https://mirror.example/github")).await.unwrap(),
            Some("git@github.com:".to_string())
        );
    }

    #[tokio::test]
    async fn test_configure_stops_at_first_failure() {
        let git = MockGit::new();
        git.fail_when(
            "credential.https://b.example/.username",
            MockFailure::Exit {
                code: 255,
                stderr: "error: could not lock config file".to_string(),
            },
        );
        let store = GlobalGitConfig::new(Arc::new(git.clone()));
        let provisioner = Provisioner::new(&store, &git);

        let err = provisioner
            .configure(&[
                cred("a.example", "", "alice"),
                cred("b.example", "", "bob"),
                cred("c.example", "", "carol"),
            ])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("could not lock config file"));
        assert_eq!(git.config_value("credential.https://a.example/.username"), Some("alice".to_string()));
        assert_eq!(git.config_value("url.https://a.example/.insteadOf"), Some("git@a.example:".to_string()));
        assert_eq!(git.config_value("credential.https://c.example/.username"), None);
    }

    #[tokio::test]
    async fn test_store_credentials_writes_handshake_in_order() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        Provisioner::new(&store, &git)
            .store_credentials(&[cred("a.example", "/x.git", "alice"), cred("b.example", "", "bob")])
            .await
            .unwrap();

        assert_eq!(
            git.approvals(),
            vec![
                "protocol=https\nhost=a.example\npath=/x.git\nusername=alice\npassword=alice-secret\n",
                "protocol=https\nhost=b.example\npath=\nusername=bob\npassword=bob-secret\n",
            ]
        );
    }

    #[tokio::test]
    async fn test_store_credentials_aborts_remaining() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        git.fail_when(
            "credential approve",
            MockFailure::Exit {
                code: 128,
                stderr: "fatal: cache daemon did not start".to_string(),
            },
        );

        let err = Provisioner::new(&store, &git)
            .store_credentials(&[cred("a.example", "", "alice"), cred("b.example", "", "bob")])
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Git(GitError::Failed { code: Some(128), .. })));
        assert_eq!(git.approvals().len(), 1);
    }

    #[tokio::test]
    async fn test_provision_runs_stages_in_order() {
        let git = MockGit::new();
        let store = GlobalGitConfig::new(Arc::new(git.clone()));
        let env = BuildEnvironment::new(
            vec![cred("github.com", "/", "octocat")],
            configuration(Some(3600)),
        );

        Provisioner::new(&store, &git).provision(&env).await.unwrap();

        let calls: Vec<String> = git.get_calls().iter().map(|c| c.args.join(" ")).collect();
        assert_eq!(
            calls,
            vec![
                "config --global credential.helper cache --timeout 3600",
                "config --global credential.https://github.com/.username octocat",
                "config --global url.https://github.com/.insteadOf git@github.com:",
                "credential approve",
            ]
        );
    }

    #[tokio::test]
    async fn test_provision_missing_executable_fails_first_stage() {
        let git = Arc::new(CliGit::new("gitcreds-definitely-not-installed"));
        let store = GlobalGitConfig::new(git.clone());
        let env = BuildEnvironment::new(vec![cred("github.com", "/", "octocat")], configuration(None));

        let err = Provisioner::new(&store, git.as_ref())
            .provision(&env)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Git(GitError::NotFound { .. })));
        assert_eq!(err.to_string(), "executable not found: gitcreds-definitely-not-installed");
    }

    #[tokio::test]
    async fn test_provision_not_found_in_handshake_is_returned_unchanged() {
        let store = MemoryConfigStore::new();
        let git = MockGit::new();
        git.fail_when("credential approve", MockFailure::NotFound);
        let env = BuildEnvironment::new(vec![cred("github.com", "/", "octocat")], configuration(None));

        let err = Provisioner::new(&store, &git).provision(&env).await.unwrap_err();
        assert!(matches!(err, CoreError::Git(GitError::NotFound { .. })));
        // config stages already ran and stay in place
        assert!(store.get(CREDENTIAL_HELPER_KEY).await.unwrap().is_some());
    }
}
