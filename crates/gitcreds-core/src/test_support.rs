//! Test support utilities for gitcreds-core
//!
//! Provides MockGit for exercising the provisioning pipeline without a real
//! git installation or touching the user's global git configuration.

use async_trait::async_trait;
use gitcreds_git::{display_command, CommandOutput, GitError, GitRunner, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Records one git invocation
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub args: Vec<String>,
    /// Stdin written by `run_with_input`
    pub input: Option<String>,
}

/// How a matching invocation fails
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Non-zero exit with the given stderr
    Exit { code: i32, stderr: String },
    /// Executable missing from PATH
    NotFound,
}

/// Configurable mock git runner.
///
/// `git config --global <key> <value>` and `git config --global --get <key>`
/// are served from an in-memory map, so a `GlobalGitConfig` layered over the
/// mock behaves like the real store.
#[derive(Clone, Default)]
pub struct MockGit {
    pub calls: Arc<Mutex<Vec<MockCall>>>,
    pub config: Arc<Mutex<BTreeMap<String, String>>>,
    failures: Arc<Mutex<Vec<(String, MockFailure)>>>,
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every invocation whose joined arguments contain `pattern`
    pub fn fail_when(&self, pattern: &str, failure: MockFailure) {
        self.failures
            .lock()
            .unwrap()
            .push((pattern.to_string(), failure));
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Stdin payloads of all `credential approve` calls, in order
    pub fn approvals(&self) -> Vec<String> {
        self.get_calls()
            .into_iter()
            .filter(|c| c.args == ["credential", "approve"])
            .filter_map(|c| c.input)
            .collect()
    }

    /// Current value of a global config key
    pub fn config_value(&self, key: &str) -> Option<String> {
        self.config.lock().unwrap().get(key).cloned()
    }

    fn record(&self, args: &[&str], input: Option<String>) {
        self.calls.lock().unwrap().push(MockCall {
            args: args.iter().map(|a| a.to_string()).collect(),
            input,
        });
    }

    fn check_failure(&self, args: &[&str]) -> Result<()> {
        let joined = args.join(" ");
        let failures = self.failures.lock().unwrap();
        match failures.iter().find(|(pattern, _)| joined.contains(pattern.as_str())) {
            None => Ok(()),
            Some((_, MockFailure::NotFound)) => Err(GitError::NotFound {
                program: "git".to_string(),
            }),
            Some((_, MockFailure::Exit { code, stderr })) => Err(GitError::Failed {
                command: display_command("git", args),
                code: Some(*code),
                stderr: stderr.clone(),
            }),
        }
    }
}

#[async_trait]
impl GitRunner for MockGit {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        self.record(args, None);
        self.check_failure(args)?;

        match args {
            ["config", "--global", "--get", key] => match self.config_value(key) {
                Some(value) => Ok(CommandOutput::new(format!("{}\n", value), "")),
                None => Err(GitError::Failed {
                    command: display_command("git", args),
                    code: Some(1),
                    stderr: String::new(),
                }),
            },
            ["config", "--global", key, value] => {
                self.config
                    .lock()
                    .unwrap()
                    .insert(key.to_string(), value.to_string());
                Ok(CommandOutput::default())
            }
            _ => Ok(CommandOutput::default()),
        }
    }

    async fn run_with_input(&self, args: &[&str], input: Vec<u8>) -> Result<CommandOutput> {
        self.record(args, Some(String::from_utf8_lossy(&input).to_string()));
        self.check_failure(args)?;
        Ok(CommandOutput::default())
    }
}
