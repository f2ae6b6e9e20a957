//! Event routing and mirror lifecycle execution.
//!
//! [`route`] is the pure decision table: given an event and the freshly
//! fetched roster, it names the one thing to do. [`MirrorService`] owns the
//! locks and performs it. Keeping the table free of I/O means every row can
//! be tested without a repository on disk.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::auth::Roster;
use crate::commands::{parse_command, Command, COMMAND_PREFIX};
use crate::git::{self, master, submission, GitConfig, GitError};
use crate::github::{self, GitHubApiError, OctocrabClient};
use crate::types::PrNumber;
use crate::webhooks::{PullRequestAction, WebhookEvent};

/// What an event amounts to.
///
/// One variant per effect column in the routing table. The three mirror
/// variants imply a master resync first: request mirrors are cloned and
/// fetched from the master's local ref namespace, which must be current
/// before any of them reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Resync the master mirror and stop.
    SyncMaster,
    /// Resync the master, then create (or refresh) the request's mirror.
    CreateMirror(PrNumber),
    /// Resync the master, then update the request's mirror if one exists.
    /// An unmirrored request is not implicitly adopted.
    UpdateMirror(PrNumber),
    /// Resync the master, then delete the request's mirror if one exists.
    DeleteMirror(PrNumber),
    /// Acknowledge without touching anything.
    Ignore(IgnoreReason),
}

/// Why a comment produced no action. Recorded for the audit log; the sender
/// sees the same success response either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The body does not open with a recognized command.
    NotACommand,
    /// A command on a plain issue rather than a pull request.
    NotAPullRequest,
    /// A command from a login outside the collaborator roster.
    UnauthorizedCommenter,
}

/// Maps an event to its effect.
///
/// Push events are ungated (they only freshen the master, which any push
/// already implies). Opening a request is gated on the request author;
/// commands are gated on the comment author. Closing is ungated, since
/// deleting a mirror for a closed request is what the lifecycle demands
/// regardless of who closed it.
pub fn route(event: &WebhookEvent, roster: &Roster) -> Dispatch {
    match event {
        WebhookEvent::Push => Dispatch::SyncMaster,

        WebhookEvent::PullRequest(pr) => match pr.action {
            PullRequestAction::Opened | PullRequestAction::Reopened => {
                if roster.is_authorized(&pr.author_login) {
                    Dispatch::CreateMirror(pr.number)
                } else {
                    // Denied, but the master resync still happens and the
                    // sender sees an ordinary success
                    tracing::info!(
                        number = pr.number.0,
                        author = %pr.author_login,
                        "request author is not a collaborator; not mirroring"
                    );
                    Dispatch::SyncMaster
                }
            }
            PullRequestAction::Closed => Dispatch::DeleteMirror(pr.number),
            PullRequestAction::Synchronize => Dispatch::UpdateMirror(pr.number),
        },

        WebhookEvent::IssueComment(comment) => {
            let Some(command) = parse_command(&comment.body, COMMAND_PREFIX) else {
                return Dispatch::Ignore(IgnoreReason::NotACommand);
            };
            let Some(number) = comment.pr_number else {
                tracing::info!(
                    author = %comment.author_login,
                    "mirror command on a plain issue; ignoring"
                );
                return Dispatch::Ignore(IgnoreReason::NotAPullRequest);
            };
            if !roster.is_authorized(&comment.author_login) {
                tracing::info!(
                    number = number.0,
                    author = %comment.author_login,
                    "mirror command from a non-collaborator; ignoring"
                );
                return Dispatch::Ignore(IgnoreReason::UnauthorizedCommenter);
            }
            match command {
                Command::Mirror => Dispatch::CreateMirror(number),
                Command::Unmirror => Dispatch::DeleteMirror(number),
            }
        }
    }
}

/// A failure while acting on an event.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Git(#[from] GitError),
    #[error(transparent)]
    GitHub(#[from] GitHubApiError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// What a reconciliation sweep accomplished.
///
/// One mirror's failure never aborts the sweep; failures are collected here
/// and the walk continues.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub updated: Vec<PrNumber>,
    pub failed: Vec<(PrNumber, GitError)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the mirror tree and serializes mutations to it.
///
/// The master working tree has a single-writer lock. Each request number has
/// its own lock, so two deliveries for the same request can never interleave
/// their filesystem mutations while unrelated requests proceed in parallel.
/// The lock map only grows, by two pointers per request number ever touched.
pub struct MirrorService {
    git: GitConfig,
    github: OctocrabClient,
    master_lock: Mutex<()>,
    submission_locks: Mutex<HashMap<PrNumber, Arc<Mutex<()>>>>,
}

impl MirrorService {
    pub fn new(git: GitConfig, github: OctocrabClient) -> Self {
        Self {
            git,
            github,
            master_lock: Mutex::new(()),
            submission_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn git_config(&self) -> &GitConfig {
        &self.git
    }

    pub fn github(&self) -> &OctocrabClient {
        &self.github
    }

    async fn submission_lock(&self, number: PrNumber) -> Arc<Mutex<()>> {
        let mut locks = self.submission_locks.lock().await;
        locks.entry(number).or_default().clone()
    }

    /// Resyncs the master mirror under its single-writer lock.
    pub async fn sync_master(&self) -> git::GitResult<()> {
        let _guard = self.master_lock.lock().await;
        master::sync(&self.git).await
    }

    /// Handles one parsed event end to end.
    ///
    /// The roster is fetched fresh here, once per gated event; push events
    /// skip the fetch since nothing about them is gated.
    pub async fn handle_event(&self, event: WebhookEvent) -> ServiceResult<()> {
        let roster = match &event {
            WebhookEvent::Push => Roster::default(),
            _ => github::fetch_roster(&self.github).await?,
        };
        self.execute(route(&event, &roster)).await
    }

    /// Performs a routed effect, taking the locks it needs.
    pub async fn execute(&self, dispatch: Dispatch) -> ServiceResult<()> {
        match dispatch {
            Dispatch::Ignore(reason) => {
                tracing::debug!(?reason, "nothing to do");
                Ok(())
            }
            Dispatch::SyncMaster => {
                self.sync_master().await?;
                Ok(())
            }
            Dispatch::CreateMirror(number) => {
                self.sync_master().await?;
                let lock = self.submission_lock(number).await;
                let _guard = lock.lock().await;
                submission::create(&self.git, number).await?;
                tracing::info!(number = number.0, "mirror is in place");
                Ok(())
            }
            Dispatch::UpdateMirror(number) => {
                self.sync_master().await?;
                let lock = self.submission_lock(number).await;
                let _guard = lock.lock().await;
                if !submission::exists(&self.git, number) {
                    tracing::debug!(number = number.0, "not mirrored; skipping update");
                    return Ok(());
                }
                submission::update(&self.git, number).await?;
                tracing::info!(number = number.0, "mirror updated");
                Ok(())
            }
            Dispatch::DeleteMirror(number) => {
                self.sync_master().await?;
                let lock = self.submission_lock(number).await;
                let _guard = lock.lock().await;
                submission::delete(&self.git, number).await?;
                tracing::info!(number = number.0, "mirror is gone");
                Ok(())
            }
        }
    }

    /// Refreshes the master and every tracked mirror in one pass.
    ///
    /// Never creates or deletes mirrors, so it is safe to trigger at any
    /// time. A master sync failure aborts the sweep (every update would read
    /// stale refs); per-mirror failures are collected and the walk goes on.
    pub async fn reconcile(&self) -> ServiceResult<SweepReport> {
        self.sync_master().await?;

        let mut report = SweepReport::default();
        for number in submission::tracked_numbers(&self.git).await? {
            let lock = self.submission_lock(number).await;
            let _guard = lock.lock().await;
            // The mirror may have been deleted since enumeration
            if !submission::exists(&self.git, number) {
                continue;
            }
            match submission::update(&self.git, number).await {
                Ok(()) => report.updated.push(number),
                Err(e) => {
                    tracing::error!(
                        number = number.0,
                        error = %e,
                        invariant_violation = e.is_invariant_violation(),
                        "sweep update failed"
                    );
                    report.failed.push((number, e));
                }
            }
        }

        tracing::info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::master;
    use crate::test_utils::{LogCapture, UpstreamFixture};
    use crate::types::RepoId;
    use crate::webhooks::{IssueCommentEvent, PullRequestEvent};
    use tracing::instrument::WithSubscriber;

    fn roster(logins: &[&str]) -> Roster {
        Roster::new(logins.iter().map(|l| l.to_string()))
    }

    fn pr_event(action: PullRequestAction, number: u64, author: &str) -> WebhookEvent {
        WebhookEvent::PullRequest(PullRequestEvent {
            action,
            number: PrNumber(number),
            author_login: author.to_owned(),
        })
    }

    fn comment_event(body: &str, number: Option<u64>, author: &str) -> WebhookEvent {
        WebhookEvent::IssueComment(IssueCommentEvent {
            pr_number: number.map(PrNumber),
            author_login: author.to_owned(),
            body: body.to_owned(),
        })
    }

    // ── routing table ───────────────────────────────────────────────────

    #[test]
    fn push_syncs_master_only() {
        assert_eq!(route(&WebhookEvent::Push, &Roster::default()), Dispatch::SyncMaster);
    }

    #[test]
    fn open_from_collaborator_creates() {
        let roster = roster(&["alice"]);
        for action in [PullRequestAction::Opened, PullRequestAction::Reopened] {
            assert_eq!(
                route(&pr_event(action, 42, "alice"), &roster),
                Dispatch::CreateMirror(PrNumber(42))
            );
        }
    }

    #[test]
    fn open_from_outsider_syncs_master_only() {
        let roster = roster(&["alice"]);
        assert_eq!(
            route(&pr_event(PullRequestAction::Opened, 42, "mallory"), &roster),
            Dispatch::SyncMaster
        );
    }

    #[test]
    fn close_deletes_regardless_of_author() {
        assert_eq!(
            route(&pr_event(PullRequestAction::Closed, 42, "mallory"), &Roster::default()),
            Dispatch::DeleteMirror(PrNumber(42))
        );
    }

    #[test]
    fn synchronize_updates() {
        assert_eq!(
            route(&pr_event(PullRequestAction::Synchronize, 42, "anyone"), &Roster::default()),
            Dispatch::UpdateMirror(PrNumber(42))
        );
    }

    #[test]
    fn mirror_command_from_collaborator_creates() {
        let roster = roster(&["plehegar"]);
        assert_eq!(
            route(&comment_event("w3c-test:mirror", Some(7), "plehegar"), &roster),
            Dispatch::CreateMirror(PrNumber(7))
        );
        // Trailing chatter after the command is fine
        assert_eq!(
            route(&comment_event("w3c-test:unmirror please", Some(7), "plehegar"), &roster),
            Dispatch::DeleteMirror(PrNumber(7))
        );
    }

    #[test]
    fn ordinary_comments_are_ignored() {
        let roster = roster(&["plehegar"]);
        for body in ["LGTM", "", "w3c-test:mirrors", "please w3c-test:mirror"] {
            assert_eq!(
                route(&comment_event(body, Some(7), "plehegar"), &roster),
                Dispatch::Ignore(IgnoreReason::NotACommand),
                "body {:?}",
                body
            );
        }
    }

    #[test]
    fn command_on_plain_issue_is_ignored() {
        let roster = roster(&["plehegar"]);
        assert_eq!(
            route(&comment_event("w3c-test:mirror", None, "plehegar"), &roster),
            Dispatch::Ignore(IgnoreReason::NotAPullRequest)
        );
    }

    #[test]
    fn command_from_outsider_is_ignored() {
        let roster = roster(&["plehegar"]);
        assert_eq!(
            route(&comment_event("w3c-test:unmirror", Some(7), "mallory"), &roster),
            Dispatch::Ignore(IgnoreReason::UnauthorizedCommenter)
        );
    }

    // ── execution against a real repository ─────────────────────────────

    async fn service_fixture() -> (UpstreamFixture, MirrorService) {
        let f = UpstreamFixture::new().await;
        master::initialize(&f.config, &f.remote_url()).await.unwrap();
        std::fs::create_dir(f.config.submissions_dir()).unwrap();
        let github = OctocrabClient::from_token(
            "test-token",
            RepoId::new("w3c", "web-platform-tests"),
        )
        .unwrap();
        let service = MirrorService::new(f.config.clone(), github);
        (f, service)
    }

    #[tokio::test]
    async fn authorized_open_mirrors_the_request() {
        let (f, service) = service_fixture().await;
        let pr_sha = f.push_pr_head(PrNumber(42), "feature.txt").await;

        let roster = roster(&["alice"]);
        let dispatch = route(&pr_event(PullRequestAction::Opened, 42, "alice"), &roster);
        service.execute(dispatch).await.unwrap();

        // The master was resynced before the clone, so the new head is visible
        assert!(submission::exists(&f.config, PrNumber(42)));
        assert_eq!(f.submission_head(PrNumber(42)).await, pr_sha);
    }

    #[tokio::test]
    async fn close_after_open_removes_the_mirror() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(42), "feature.txt").await;

        let roster = roster(&["alice"]);
        service
            .execute(route(&pr_event(PullRequestAction::Opened, 42, "alice"), &roster))
            .await
            .unwrap();
        service
            .execute(route(&pr_event(PullRequestAction::Closed, 42, "alice"), &roster))
            .await
            .unwrap();

        assert!(!submission::exists(&f.config, PrNumber(42)));
        assert!(!f.config.submission_path(PrNumber(42)).exists());
    }

    #[tokio::test]
    async fn unauthorized_open_still_syncs_master() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(42), "feature.txt").await;
        let new_master = f.push_master_commit("trunk.txt").await;

        let roster = roster(&["alice"]);
        service
            .execute(route(&pr_event(PullRequestAction::Opened, 42, "mallory"), &roster))
            .await
            .unwrap();

        assert!(!submission::exists(&f.config, PrNumber(42)));
        assert_eq!(f.mirror_head().await, new_master);
    }

    #[tokio::test]
    async fn synchronize_does_not_adopt_unmirrored_requests() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(42), "feature.txt").await;

        service.execute(Dispatch::UpdateMirror(PrNumber(42))).await.unwrap();

        assert!(!f.config.submission_path(PrNumber(42)).exists());
    }

    #[tokio::test]
    async fn synchronize_advances_a_mirrored_request() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(42), "v1.txt").await;
        service.execute(Dispatch::CreateMirror(PrNumber(42))).await.unwrap();

        let new_sha = f.push_pr_head(PrNumber(42), "v2.txt").await;
        service.execute(Dispatch::UpdateMirror(PrNumber(42))).await.unwrap();

        assert_eq!(f.submission_head(PrNumber(42)).await, new_sha);
    }

    #[tokio::test]
    async fn sweep_refreshes_every_tracked_mirror() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(10), "a.txt").await;
        f.push_pr_head(PrNumber(20), "b.txt").await;
        service.execute(Dispatch::CreateMirror(PrNumber(10))).await.unwrap();
        service.execute(Dispatch::CreateMirror(PrNumber(20))).await.unwrap();

        let new_10 = f.push_pr_head(PrNumber(10), "a2.txt").await;
        let new_20 = f.push_pr_head(PrNumber(20), "b2.txt").await;
        std::fs::create_dir(f.config.submissions_dir().join("scratch")).unwrap();

        let report = service.reconcile().await.unwrap();

        assert!(report.is_clean(), "failures: {:?}", report.failed);
        assert_eq!(report.updated, vec![PrNumber(10), PrNumber(20)]);
        assert_eq!(f.submission_head(PrNumber(10)).await, new_10);
        assert_eq!(f.submission_head(PrNumber(20)).await, new_20);
        assert!(f.config.submissions_dir().join("scratch").exists());
    }

    #[tokio::test]
    async fn sweep_carries_on_past_a_broken_mirror() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(10), "a.txt").await;
        f.push_pr_head(PrNumber(20), "b.txt").await;
        service.execute(Dispatch::CreateMirror(PrNumber(10))).await.unwrap();
        service.execute(Dispatch::CreateMirror(PrNumber(20))).await.unwrap();

        // Wreck 10's metadata so its update fails while exists() stays true
        std::fs::write(f.config.submission_git_dir(PrNumber(10)).join("HEAD"), "garbage").unwrap();
        let new_20 = f.push_pr_head(PrNumber(20), "b2.txt").await;

        let report = service.reconcile().await.unwrap();

        assert_eq!(report.updated, vec![PrNumber(20)]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, PrNumber(10));
        assert_eq!(f.submission_head(PrNumber(20)).await, new_20);
    }

    #[tokio::test]
    async fn sweep_failure_logs_carry_the_class() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(10), "a.txt").await;
        service.execute(Dispatch::CreateMirror(PrNumber(10))).await.unwrap();
        std::fs::write(f.config.submission_git_dir(PrNumber(10)).join("HEAD"), "garbage").unwrap();

        let capture = LogCapture::default();
        let report = service
            .reconcile()
            .with_subscriber(capture.subscriber())
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        let logs = capture.contents();
        assert!(logs.contains("sweep update failed"), "logs: {logs}");
        // A wrecked checkout fails its fetch; that is a retryable failure,
        // not an invariant breach
        assert!(logs.contains("invariant_violation=false"), "logs: {logs}");
    }

    #[tokio::test]
    async fn concurrent_create_and_delete_serialize() {
        let (f, service) = service_fixture().await;
        f.push_pr_head(PrNumber(42), "feature.txt").await;

        let (created, deleted) = tokio::join!(
            service.execute(Dispatch::CreateMirror(PrNumber(42))),
            service.execute(Dispatch::DeleteMirror(PrNumber(42))),
        );
        created.unwrap();
        deleted.unwrap();

        // Either serialization is fine; what must not happen is a half state
        let path = f.config.submission_path(PrNumber(42));
        if submission::exists(&f.config, PrNumber(42)) {
            assert_eq!(f.submission_head(PrNumber(42)).await, f.upstream_pr_head(PrNumber(42)).await);
        } else {
            assert!(!path.exists());
        }
    }
}
