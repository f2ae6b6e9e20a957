//! One-shot bootstrap, run with `--setup` before first serving.
//!
//! Brings the filesystem and the remote side into the state the server
//! assumes: master mirror cloned (or resynced on a re-run), a checkout for
//! every already-open pull request, and the webhook registered. Re-running is
//! safe for the mirrors; webhook registration posts a new hook each time, and
//! pruning duplicates is left to the operator.

use anyhow::Context;
use tracing::info;

use crate::config::Config;
use crate::git::{master, submission};
use crate::github;
use crate::service::MirrorService;

pub async fn run(config: &Config, service: &MirrorService) -> anyhow::Result<()> {
    let git = service.git_config();

    if master::is_initialized(git) {
        info!("master mirror already initialized; resyncing");
        service.sync_master().await.context("resyncing master mirror")?;
    } else {
        let remote = config.remote_url();
        info!(remote = %remote, "creating master mirror");
        master::initialize(git, &remote)
            .await
            .context("initializing master mirror")?;
    }

    tokio::fs::create_dir_all(git.submissions_dir())
        .await
        .context("creating submissions directory")?;

    // Requests opened before the webhook existed never sent an event; give
    // them their checkouts now. Existing checkouts just get refreshed.
    let open = github::list_open_pull_requests(service.github())
        .await
        .context("listing open pull requests")?;
    info!(count = open.len(), "mirroring open pull requests");
    for number in open {
        submission::create(git, number)
            .await
            .with_context(|| format!("mirroring pull request {}", number))?;
    }

    let hook_id = github::register_webhook(
        service.github(),
        &config.webhook_url,
        &config.webhook_secret,
    )
    .await
    .context("registering webhook")?;
    info!(hook_id, url = %config.webhook_url, "webhook registered");

    Ok(())
}
