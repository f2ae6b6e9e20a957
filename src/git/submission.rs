//! Submission checkout lifecycle: one working copy per mirrored pull request.
//!
//! Each checkout lives at `<root>/submissions/<number>/` and is cloned from
//! the master mirror's local metadata, not from the remote. Presence of its
//! `.git` directory on disk is the only record that a request is mirrored;
//! there is no registry to fall out of sync with.

use super::{parse_submission_dir_name, run_git, GitConfig, GitError, GitResult};
use crate::types::PrNumber;

/// Whether a submission checkout exists for the given request number.
///
/// Defined as metadata presence, so a directory left behind by a failed
/// create does not count as mirrored.
pub fn exists(config: &GitConfig, number: PrNumber) -> bool {
    config.submission_git_dir(number).exists()
}

/// Creates the checkout for a request, or refreshes it if it already exists.
///
/// Duplicate "opened" deliveries are expected; a second create degrades to
/// [`update`]. A directory at the target path without git metadata is a fatal
/// inconsistency ([`GitError::NotACheckout`]), never silently adopted or
/// overwritten.
pub async fn create(config: &GitConfig, number: PrNumber) -> GitResult<()> {
    if exists(config, number) {
        return update(config, number).await;
    }

    let path = config.submission_path(number);
    if path.exists() {
        return Err(GitError::NotACheckout { number, path });
    }

    tokio::fs::create_dir(&path).await?;
    run_git(
        config,
        &path,
        &["clone", "--no-checkout", config.root.to_str().unwrap(), "."],
    )
    .await?;
    run_git(config, &path, &["submodule", "init"]).await?;

    update(config, number).await
}

/// Advances the checkout to the request's current head.
///
/// Fetches `refs/remotes/origin/pr/<number>` from the master mirror into the
/// local `pr` branch and force-checks it out. The refspec is forced (request
/// heads move non-fast-forward when contributors rebase) and the fetch allows
/// updating the checked-out branch, since `pr` stays checked out between
/// updates. Safe to call repeatedly; each call just reflects the master's
/// current idea of the head.
pub async fn update(config: &GitConfig, number: PrNumber) -> GitResult<()> {
    let path = config.submission_path(number);
    let refspec = format!("+refs/remotes/origin/pr/{}:pr", number);

    run_git(
        config,
        &path,
        &["fetch", "--update-head-ok", "origin", &refspec],
    )
    .await?;
    run_git(config, &path, &["checkout", "-f", "pr"]).await?;
    run_git(config, &path, &["submodule", "update", "--recursive"]).await?;

    Ok(())
}

/// Deletes the checkout for a request.
///
/// A no-op when nothing is mirrored, tolerating duplicate "closed" deliveries
/// and close events for requests that were never authorized. A stray
/// directory without metadata is deliberately left in place; deleting state
/// this service does not recognize as its own is how mistakes get erased.
pub async fn delete(config: &GitConfig, number: PrNumber) -> GitResult<()> {
    if !exists(config, number) {
        return Ok(());
    }

    tokio::fs::remove_dir_all(config.submission_path(number)).await?;
    Ok(())
}

/// Enumerates the request numbers currently mirrored under `submissions/`.
///
/// Directory entries whose names do not parse as plain decimal numbers are
/// not managed state and are skipped; so are numeric names whose canonical
/// checkout is absent (e.g. a zero-padded stray). Sorted and deduplicated for
/// deterministic sweep order.
pub async fn tracked_numbers(config: &GitConfig) -> GitResult<Vec<PrNumber>> {
    let mut entries = tokio::fs::read_dir(config.submissions_dir()).await?;
    let mut numbers = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let Some(number) = parse_submission_dir_name(&entry.path()) else {
            continue;
        };
        if exists(config, number) {
            numbers.push(number);
        }
    }

    numbers.sort();
    numbers.dedup();
    Ok(numbers)
}
