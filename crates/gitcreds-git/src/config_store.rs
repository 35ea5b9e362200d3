//! Key/value view of git configuration
//!
//! The global git configuration is process- and host-wide state. Callers get
//! it through [`ConfigStore`] so tests can substitute [`MemoryConfigStore`].

use crate::{GitRunner, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Configuration store addressed by `section.subsection.key`
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Read a value; `None` when the key is unset
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// `git config --global` backed store
#[derive(Clone)]
pub struct GlobalGitConfig {
    runner: Arc<dyn GitRunner>,
}

impl GlobalGitConfig {
    pub fn new(runner: Arc<dyn GitRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ConfigStore for GlobalGitConfig {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.runner.run(&["config", "--global", "--get", key]).await {
            Ok(output) => Ok(Some(output.stdout.trim_end_matches(['\r', '\n']).to_string())),
            // git config exits 1 when the key is not set
            Err(e) if e.exit_code() == Some(1) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.runner
            .run(&["config", "--global", key, value])
            .await
            .map(|_| ())
    }
}

/// In-memory store with last-write-wins semantics
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CommandOutput, GitError};

    /// Answers every `run` with a canned result
    struct CannedRunner {
        calls: Mutex<Vec<Vec<String>>>,
        result: fn() -> Result<CommandOutput>,
    }

    #[async_trait]
    impl GitRunner for CannedRunner {
        async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|a| a.to_string()).collect());
            (self.result)()
        }

        async fn run_with_input(&self, _args: &[&str], _input: Vec<u8>) -> Result<CommandOutput> {
            unreachable!("config store never writes stdin")
        }
    }

    fn canned(result: fn() -> Result<CommandOutput>) -> Arc<CannedRunner> {
        Arc::new(CannedRunner {
            calls: Mutex::new(Vec::new()),
            result,
        })
    }

    #[tokio::test]
    async fn test_global_set_runs_git_config() {
        let runner = canned(|| Ok(CommandOutput::default()));
        let store = GlobalGitConfig::new(runner.clone());
        store
            .set("credential.https://github.com/.username", "octocat")
            .await
            .unwrap();
        assert_eq!(
            runner.calls.lock().unwrap()[0],
            vec!["config", "--global", "credential.https://github.com/.username", "octocat"]
        );
    }

    #[tokio::test]
    async fn test_global_get_trims_newline() {
        let runner = canned(|| Ok(CommandOutput::new("cache --timeout 3600\n", "")));
        let store = GlobalGitConfig::new(runner.clone());
        assert_eq!(
            store.get("credential.helper").await.unwrap(),
            Some("cache --timeout 3600".to_string())
        );
        assert_eq!(
            runner.calls.lock().unwrap()[0],
            vec!["config", "--global", "--get", "credential.helper"]
        );
    }

    #[tokio::test]
    async fn test_global_get_unset_key() {
        let runner = canned(|| {
            Err(GitError::Failed {
                command: "git config --global --get nope.nope".to_string(),
                code: Some(1),
                stderr: String::new(),
            })
        });
        let store = GlobalGitConfig::new(runner);
        assert_eq!(store.get("nope.nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_global_get_propagates_other_failures() {
        let runner = canned(|| {
            Err(GitError::NotFound {
                program: "git".to_string(),
            })
        });
        let store = GlobalGitConfig::new(runner);
        assert!(matches!(
            store.get("credential.helper").await,
            Err(GitError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_last_write_wins() {
        let store = MemoryConfigStore::new();
        store.set("credential.https://example.com/.username", "first").await.unwrap();
        store.set("credential.https://example.com/.username", "second").await.unwrap();
        assert_eq!(
            store.get("credential.https://example.com/.username").await.unwrap(),
            Some("second".to_string())
        );
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.get("missing").await.unwrap(), None);
    }
}
