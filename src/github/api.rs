//! The three GitHub API calls the mirror makes.
//!
//! Collaborator and open-request listings are paginated at 100 per page; a
//! short page means the last page. Octocrab has typed support for pull
//! request listings; the collaborator and hook endpoints go through the raw
//! REST routes with local serde shapes.

use serde::{Deserialize, Serialize};

use crate::auth::Roster;
use crate::types::PrNumber;

use super::client::OctocrabClient;
use super::error::GitHubApiError;

/// Fetches the current collaborator roster for the mirrored repository.
///
/// Called once per gated event, never cached; a revoked collaborator stops
/// being honored on their very next event.
pub async fn fetch_roster(client: &OctocrabClient) -> Result<Roster, GitHubApiError> {
    #[derive(Debug, Deserialize)]
    struct RawCollaborator {
        login: String,
    }

    let mut page: u32 = 1;
    let mut logins = Vec::new();
    loop {
        let url = format!(
            "/repos/{}/{}/collaborators?per_page=100&page={}",
            client.owner(),
            client.repo_name(),
            page
        );
        let result: Result<Vec<RawCollaborator>, _> = client.inner().get(&url, None::<&()>).await;

        match result {
            Ok(items) => {
                let is_last_page = items.len() < 100;
                logins.extend(items.into_iter().map(|c| c.login));
                if is_last_page {
                    break;
                }
                page += 1;
            }
            Err(e) => return Err(GitHubApiError::from_octocrab(e)),
        }
    }

    Ok(Roster::new(logins))
}

/// Lists the numbers of all currently open pull requests.
///
/// Setup uses this to pre-populate checkouts for requests opened before the
/// webhook existed.
pub async fn list_open_pull_requests(
    client: &OctocrabClient,
) -> Result<Vec<PrNumber>, GitHubApiError> {
    let mut page: u32 = 1;
    let mut numbers = Vec::new();
    loop {
        let result = client
            .inner()
            .pulls(client.owner(), client.repo_name())
            .list()
            .state(octocrab::params::State::Open)
            .per_page(100)
            .page(page)
            .send()
            .await;

        match result {
            Ok(page_result) => {
                let items = page_result.items;
                let is_last_page = items.len() < 100;
                numbers.extend(items.into_iter().map(|pull| PrNumber(pull.number)));
                if is_last_page {
                    break;
                }
                page += 1;
            }
            Err(e) => return Err(GitHubApiError::from_octocrab(e)),
        }
    }

    Ok(numbers)
}

#[derive(Debug, Serialize)]
struct HookRequest<'a> {
    name: &'static str,
    active: bool,
    events: [&'static str; 3],
    config: HookConfig<'a>,
}

#[derive(Debug, Serialize)]
struct HookConfig<'a> {
    url: &'a str,
    content_type: &'static str,
    secret: &'a str,
}

/// Registers the webhook on the mirrored repository, returning its id.
///
/// Registration is not idempotent at the API level: a re-run creates a second
/// hook with the same configuration, which the operator must prune.
pub async fn register_webhook(
    client: &OctocrabClient,
    webhook_url: &str,
    secret: &str,
) -> Result<u64, GitHubApiError> {
    #[derive(Debug, Deserialize)]
    struct RawHook {
        id: u64,
    }

    let url = format!("/repos/{}/{}/hooks", client.owner(), client.repo_name());
    let request = HookRequest {
        name: "web",
        active: true,
        events: ["push", "pull_request", "issue_comment"],
        config: HookConfig {
            url: webhook_url,
            content_type: "json",
            secret,
        },
    };

    let result: Result<RawHook, _> = client.inner().post(&url, Some(&request)).await;
    match result {
        Ok(hook) => Ok(hook.id),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}
