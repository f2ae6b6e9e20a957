//! Master mirror lifecycle: the single full clone of the upstream repository.
//!
//! The master mirror lives directly at the configured root and is the clone
//! source for every submission checkout. Its fetch configuration maps each
//! remote pull request head into `refs/remotes/origin/pr/<number>`, so one
//! `fetch origin` refreshes the default branch and every request head at once.

use super::{run_git, GitConfig, GitError, GitResult};

/// Whether the master mirror has been initialized at the configured root.
///
/// Metadata presence on disk is the source of truth; there is no registry.
pub fn is_initialized(config: &GitConfig) -> bool {
    config.git_dir().exists()
}

/// One-time creation of the master mirror.
///
/// Clones the remote into `<root>/tmp`, adopts the clone's metadata directory
/// as the mirror's own, discards the temporary working copy, hard-resets to
/// materialize the working tree at the root, installs the pull request fetch
/// refspec, fetches once to populate the ref namespace, and brings submodules
/// in line.
///
/// Fails with [`GitError::AlreadyInitialized`] if metadata is already present;
/// an existing mirror is never overwritten.
pub async fn initialize(config: &GitConfig, remote_url: &str) -> GitResult<()> {
    if is_initialized(config) {
        return Err(GitError::AlreadyInitialized {
            path: config.root.clone(),
        });
    }

    tokio::fs::create_dir_all(&config.root).await?;

    run_git(config, &config.root, &["clone", remote_url, "tmp"]).await?;
    tokio::fs::rename(config.root.join("tmp").join(".git"), config.git_dir()).await?;
    tokio::fs::remove_dir_all(config.root.join("tmp")).await?;

    run_git(config, &config.root, &["reset", "--hard", "HEAD"]).await?;
    run_git(
        config,
        &config.root,
        &[
            "config",
            "--add",
            "remote.origin.fetch",
            "+refs/pull/*/head:refs/remotes/origin/pr/*",
        ],
    )
    .await?;
    run_git(config, &config.root, &["fetch", "origin"]).await?;
    run_git(config, &config.root, &["submodule", "init"]).await?;
    run_git(config, &config.root, &["submodule", "update", "--recursive"]).await?;

    Ok(())
}

/// Brings the master mirror up to date with the remote.
///
/// One fetch refreshes both the default branch and the pull request ref
/// namespace; the working tree is then force-checked-out to the default
/// branch's remote-tracking ref. Local divergence is discarded; nobody edits
/// this tree by hand.
pub async fn sync(config: &GitConfig) -> GitResult<()> {
    run_git(config, &config.root, &["fetch", "origin"]).await?;

    let target = format!("origin/{}", config.default_branch);
    run_git(config, &config.root, &["checkout", "-f", &target]).await?;
    run_git(config, &config.root, &["submodule", "update", "--recursive"]).await?;

    Ok(())
}
