//! Local git operations for the mirror.
//!
//! This module is the only place the service touches an external process.
//! Everything higher level (master mirror sync, submission checkout
//! create/update/delete) is a sequence of calls through [`run_git`] and
//! friends, each bounded by the configured timeout and run with a clean git
//! environment.

pub mod master;
pub mod submission;

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::types::PrNumber;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed with a non-zero exit.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Git command exceeded the configured timeout and was killed.
    #[error("git command timed out after {timeout_secs}s: {command}")]
    Timeout { command: String, timeout_secs: u64 },

    /// The master mirror already has metadata; refusing to re-initialize.
    #[error("master mirror already initialized at {}", path.display())]
    AlreadyInitialized { path: PathBuf },

    /// A submission directory is present but holds no git metadata.
    /// Left over from a failed create, or someone put a stray directory there.
    #[error("submission {number} at {} is not a git checkout", path.display())]
    NotACheckout { number: PrNumber, path: PathBuf },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GitError {
    /// True for errors that indicate corrupted or conflicting on-disk state.
    ///
    /// These are never auto-repaired; they need manual intervention. Everything
    /// else is transient and webhook re-delivery is the recovery path.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            GitError::AlreadyInitialized { .. } | GitError::NotACheckout { .. }
        )
    }
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Configuration for git operations.
#[derive(Debug, Clone)]
pub struct GitConfig {
    /// Root of the master mirror working tree; also the parent of `submissions/`.
    pub root: PathBuf,

    /// The default branch name of the mirrored repository (e.g., "master").
    pub default_branch: String,

    /// Upper bound on any single git invocation.
    pub command_timeout: Duration,
}

impl GitConfig {
    /// Returns the path to the master mirror's metadata directory.
    pub fn git_dir(&self) -> PathBuf {
        self.root.join(".git")
    }

    /// Returns the path to the directory holding per-request checkouts.
    pub fn submissions_dir(&self) -> PathBuf {
        self.root.join("submissions")
    }

    /// Returns the path to a specific request's checkout.
    pub fn submission_path(&self, number: PrNumber) -> PathBuf {
        self.submissions_dir().join(number.0.to_string())
    }

    /// Returns the path to a specific request checkout's metadata directory.
    pub fn submission_git_dir(&self, number: PrNumber) -> PathBuf {
        self.submission_path(number).join(".git")
    }
}

/// Parse a submissions directory entry name like "123" into a request number.
///
/// Names that are not plain decimal numbers are not managed state and yield
/// `None`; the reconciliation sweep leaves them alone.
pub fn parse_submission_dir_name(path: &Path) -> Option<PrNumber> {
    let name = path.file_name()?.to_str()?;
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let num: u64 = name.parse().ok()?;
    Some(PrNumber(num))
}

/// Builds a git invocation with a scrubbed environment.
///
/// Every git call in the service goes through here, so the scrubbing and the
/// kill-on-drop behavior hold uniformly.
pub(crate) fn git_command(workdir: &Path) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("git");
    cmd.current_dir(workdir);

    // Host-level git config (hooks, aliases, credential helpers) must not
    // leak into mirror operations
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");

    // Never sit waiting on a credential prompt
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    // The timeout path drops the output future; make sure the child dies with it
    cmd.kill_on_drop(true);

    cmd
}

/// Run a git command in the given working directory.
///
/// Returns the command output on success, or a [`GitError`] on non-zero exit,
/// spawn failure, or timeout. The child process is killed when the timeout
/// expires.
pub async fn run_git(config: &GitConfig, workdir: &Path, args: &[&str]) -> GitResult<Output> {
    let mut cmd = git_command(workdir);
    cmd.args(args);

    let output = match timeout(config.command_timeout, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(GitError::Timeout {
                command: format!("git {}", args.join(" ")),
                timeout_secs: config.command_timeout.as_secs(),
            });
        }
    };

    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let command = format!("git {}", args.join(" "));
        Err(GitError::CommandFailed { command, stderr })
    }
}

/// Run a git command and return stdout as a trimmed string.
pub async fn run_git_stdout(config: &GitConfig, workdir: &Path, args: &[&str]) -> GitResult<String> {
    let output = run_git(config, workdir, args).await?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command as a tolerant probe.
///
/// Exit zero maps to `true` and any non-zero exit to `false`; only spawn
/// failures and timeouts are errors. For callers asking a yes/no question
/// (does this ref resolve, is this a repository) where a negative answer is
/// expected and not exceptional.
pub async fn run_git_check(config: &GitConfig, workdir: &Path, args: &[&str]) -> GitResult<bool> {
    let mut cmd = git_command(workdir);
    cmd.args(args);

    let output = match timeout(config.command_timeout, cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(GitError::Timeout {
                command: format!("git {}", args.join(" ")),
                timeout_secs: config.command_timeout.as_secs(),
            });
        }
    };

    Ok(output.status.success())
}
