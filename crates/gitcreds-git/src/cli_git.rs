//! `git` executable runner
//!
//! Shells out to the system `git` binary. The program name, an optional
//! command prefix and extra environment are configurable so tests can point
//! the runner at a stand-in or an isolated global config.

use crate::types::{display_command, scrub_credentials};
use crate::{CommandOutput, GitError, GitRunner, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Runs git through `tokio::process`
#[derive(Debug, Clone)]
pub struct CliGit {
    /// Program to execute ("git")
    cmd: String,
    /// Optional prefix (e.g., ["sh", "-c", "<script>"] for a stand-in)
    cmd_prefix: Vec<String>,
    /// Extra environment for every invocation
    envs: Vec<(String, String)>,
}

impl Default for CliGit {
    fn default() -> Self {
        Self::new("git")
    }
}

impl CliGit {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            cmd: program.into(),
            cmd_prefix: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Run every command as `<prefix...> <program> <args...>`
    pub fn with_prefix<I, S>(mut self, prefix: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd_prefix = prefix.into_iter().map(Into::into).collect();
        self
    }

    /// Set an environment variable for every invocation
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.cmd
    }

    /// Build a command with the correct prefix.
    fn build_command(&self) -> Command {
        let mut c = if self.cmd_prefix.is_empty() {
            Command::new(&self.cmd)
        } else {
            let mut c = Command::new(&self.cmd_prefix[0]);
            for prefix_arg in &self.cmd_prefix[1..] {
                c.arg(prefix_arg);
            }
            c.arg(&self.cmd);
            c
        };
        c.env("GIT_TERMINAL_PROMPT", "0");
        for (k, v) in &self.envs {
            c.env(k, v);
        }
        c.kill_on_drop(true);
        c
    }

    fn spawn_error(&self, e: std::io::Error) -> GitError {
        let program = self
            .cmd_prefix
            .first()
            .cloned()
            .unwrap_or_else(|| self.cmd.clone());
        if e.kind() == std::io::ErrorKind::NotFound {
            GitError::NotFound { program }
        } else {
            GitError::Spawn { program, source: e }
        }
    }

    fn log_failure(stderr: &str) {
        tracing::warn!("Command failed");
        if !stderr.trim().is_empty() {
            tracing::warn!("Command stderr: {}", scrub_credentials(stderr.trim_end()));
        }
    }

    fn log_success(output: &CommandOutput) {
        tracing::debug!("Command succeeded");
        if !output.stdout.trim().is_empty() {
            tracing::debug!("Command output: {}", scrub_credentials(output.stdout.trim_end()));
        }
        if !output.stderr.trim().is_empty() {
            tracing::debug!("Command stderr: {}", scrub_credentials(output.stderr.trim_end()));
        }
    }
}

async fn drain<R>(mut stream: R) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Drain stdout and stderr together.
///
/// On a read failure the stdin writer is aborted and reaped before returning.
async fn drain_streams<O, E>(
    stdout: O,
    stderr: E,
    writer: &mut JoinHandle<std::io::Result<()>>,
) -> std::io::Result<(Vec<u8>, Vec<u8>)>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    match tokio::try_join!(drain(stdout), drain(stderr)) {
        Ok(streams) => Ok(streams),
        Err(e) => {
            writer.abort();
            let _ = writer.await;
            Err(e)
        }
    }
}

#[async_trait]
impl GitRunner for CliGit {
    async fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        let command = display_command(self.program(), args);
        tracing::info!("Running command: {}", command);

        let output = self
            .build_command()
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let captured = CommandOutput::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        if !output.status.success() {
            Self::log_failure(&captured.stderr);
            return Err(GitError::Failed {
                command,
                code: output.status.code(),
                stderr: captured.stderr,
            });
        }

        Self::log_success(&captured);
        Ok(captured)
    }

    async fn run_with_input(&self, args: &[&str], input: Vec<u8>) -> Result<CommandOutput> {
        let command = display_command(self.program(), args);
        tracing::info!("Running command: {}", command);

        let mut child = self
            .build_command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let (Some(mut stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(GitError::Io(std::io::Error::other(
                "child stdio was not captured",
            )));
        };

        // Closing stdin (drop at the end of the task) is what ends the handshake.
        let mut writer = tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.flush().await?;
            Ok::<(), std::io::Error>(())
        });

        let (stdout, stderr) = drain_streams(stdout, stderr, &mut writer).await?;
        let captured = CommandOutput::new(
            String::from_utf8_lossy(&stdout),
            String::from_utf8_lossy(&stderr),
        );

        let write_result = writer
            .await
            .unwrap_or_else(|join_err| Err(std::io::Error::other(join_err)));
        let status = child.wait().await?;

        if let Err(e) = write_result {
            Self::log_failure(&captured.stderr);
            return Err(GitError::Write {
                command,
                source: e,
                stderr: captured.stderr,
            });
        }

        if !status.success() {
            Self::log_failure(&captured.stderr);
            return Err(GitError::Failed {
                command,
                code: status.code(),
                stderr: captured.stderr,
            });
        }

        Self::log_success(&captured);
        Ok(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_executable_is_not_found() {
        let git = CliGit::new("gitcreds-definitely-not-installed");
        let err = git.run(&["--version"]).await.unwrap_err();
        assert!(matches!(err, GitError::NotFound { ref program } if program == "gitcreds-definitely-not-installed"));
    }

    #[tokio::test]
    async fn test_missing_executable_with_input_is_not_found() {
        let git = CliGit::new("gitcreds-definitely-not-installed");
        let err = git
            .run_with_input(&["credential", "approve"], b"host=example.com\n".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, GitError::NotFound { .. }));
    }

    #[test]
    fn test_spawn_error_names_prefix_program() {
        let git = CliGit::new("git").with_prefix(["flatpak-spawn", "--host"]);
        let err = git.spawn_error(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(err, GitError::NotFound { ref program } if program == "flatpak-spawn"));
    }

    #[test]
    fn test_spawn_error_other_kind() {
        let git = CliGit::default();
        let err = git.spawn_error(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(matches!(err, GitError::Spawn { .. }));
        assert_eq!(git.program(), "git");
    }

    /// Reader whose every poll fails
    struct BrokenReader;

    impl AsyncRead for BrokenReader {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe)))
        }
    }

    #[tokio::test]
    async fn test_drain_failure_stops_writer() {
        let mut writer = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok::<(), std::io::Error>(())
        });

        let err = drain_streams(BrokenReader, tokio::io::empty(), &mut writer)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
        assert!(writer.is_finished());
    }

    #[tokio::test]
    async fn test_drain_collects_both_streams() {
        let mut writer = tokio::spawn(async { Ok::<(), std::io::Error>(()) });
        let (out, err) = drain_streams(&b"out"[..], &b"err"[..], &mut writer)
            .await
            .unwrap();
        assert_eq!(out, b"out");
        assert_eq!(err, b"err");
        assert!(writer.await.unwrap().is_ok());
    }
}
