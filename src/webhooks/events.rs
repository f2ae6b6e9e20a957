//! Typed webhook events.
//!
//! Only the three delivery kinds the mirror acts on are represented, and each
//! carries just the fields routing needs. Everything else in a payload is
//! noise and never leaves the parser.

use crate::types::PrNumber;

/// A webhook delivery the mirror recognizes.
///
/// Deliveries that are well-formed JSON but not one of these shapes (or that
/// carry a pull request action the mirror does not track) parse to `None`
/// upstream and are acknowledged without any effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Commits landed on the upstream repository.
    ///
    /// The payload's branch and commit details are irrelevant; any push means
    /// the master mirror should resynchronize.
    Push,

    /// A pull request changed state.
    PullRequest(PullRequestEvent),

    /// Someone commented on an issue or pull request.
    IssueComment(IssueCommentEvent),
}

/// The pull request state changes the mirror tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestAction {
    Opened,
    Reopened,
    Closed,
    /// New commits were pushed to the request's head.
    Synchronize,
}

impl PullRequestAction {
    /// Maps a payload `action` string to a tracked action.
    ///
    /// Returns `None` for the many actions the mirror ignores (labeled,
    /// edited, review_requested, ...). Matching is exact; GitHub sends these
    /// in lowercase.
    pub fn from_payload(action: &str) -> Option<Self> {
        match action {
            "opened" => Some(Self::Opened),
            "reopened" => Some(Self::Reopened),
            "closed" => Some(Self::Closed),
            "synchronize" => Some(Self::Synchronize),
            _ => None,
        }
    }
}

/// A pull request lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,

    /// The request number, which is also the checkout directory name.
    pub number: PrNumber,

    /// Login of the user who opened the request. Authorization for mirroring
    /// on open is decided against this login, not the event sender.
    pub author_login: String,
}

/// A comment event, which may carry a mirror command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCommentEvent {
    /// The request the comment is attached to, or `None` for a comment on a
    /// plain issue. Commands are only honored on pull requests.
    pub pr_number: Option<PrNumber>,

    /// Login of the comment author; commands are authorized against it.
    pub author_login: String,

    /// The comment text. Whether the comment was created, edited, or deleted
    /// makes no difference; the text is inspected either way.
    pub body: String,
}
