//! Service configuration, loaded from the environment once at startup.
//!
//! Nothing outside this module reads environment variables; every component
//! receives the values it needs explicitly.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::types::RepoId;

/// Runtime configuration for the mirror service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository being mirrored.
    pub repo: RepoId,

    /// Personal access token for the GitHub API.
    pub github_token: String,

    /// Shared secret for webhook signature verification.
    pub webhook_secret: String,

    /// Public URL deliveries are sent to; used when registering the hook.
    pub webhook_url: String,

    /// Filesystem root holding the master mirror and `submissions/`.
    pub mirror_root: PathBuf,

    /// Default branch of the mirrored repository.
    pub default_branch: String,

    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// Upper bound on any single git invocation.
    pub git_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Required: `MIRROR_ROOT`, `MIRROR_REPO_OWNER`, `MIRROR_REPO_NAME`,
    /// `GITHUB_TOKEN`, `WEBHOOK_SECRET`, `WEBHOOK_URL`.
    ///
    /// Optional: `MIRROR_DEFAULT_BRANCH` (default `master`), `BIND_ADDR`
    /// (default `0.0.0.0:8000`), `GIT_TIMEOUT_SECS` (default `600`).
    pub fn from_env() -> anyhow::Result<Self> {
        let owner = std::env::var("MIRROR_REPO_OWNER").context("MIRROR_REPO_OWNER is required")?;
        let repo = std::env::var("MIRROR_REPO_NAME").context("MIRROR_REPO_NAME is required")?;
        let github_token = std::env::var("GITHUB_TOKEN").context("GITHUB_TOKEN is required")?;
        let webhook_secret =
            std::env::var("WEBHOOK_SECRET").context("WEBHOOK_SECRET is required")?;
        let webhook_url = std::env::var("WEBHOOK_URL").context("WEBHOOK_URL is required")?;
        let mirror_root = std::env::var("MIRROR_ROOT").context("MIRROR_ROOT is required")?;

        let default_branch =
            std::env::var("MIRROR_DEFAULT_BRANCH").unwrap_or_else(|_| "master".to_string());
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let git_timeout_secs = match std::env::var("GIT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("GIT_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => 600,
        };

        Ok(Config {
            repo: RepoId::new(owner, repo),
            github_token,
            webhook_secret,
            webhook_url,
            mirror_root: PathBuf::from(mirror_root),
            default_branch,
            bind_addr,
            git_timeout: Duration::from_secs(git_timeout_secs),
        })
    }

    /// The clone URL of the mirrored repository.
    pub fn remote_url(&self) -> String {
        format!(
            "https://github.com/{}/{}.git",
            self.repo.owner, self.repo.repo
        )
    }
}
