//! Webhook payload parsing.
//!
//! Deliveries are recognized by payload shape, not by header: a payload with
//! a top-level `pull_request` key is a pull request event, else one with
//! `commits` is a push, else one with `comment` is a comment. Anything else
//! that is valid JSON parses to `Ok(None)` and is acknowledged without
//! effect. Only the handful of fields routing needs are extracted; the rest
//! of the payload is never inspected.
//!
//! The caller verifies the delivery signature before anything here runs, and
//! handles the empty-body sweep trigger itself; this module only ever sees
//! non-empty, authenticated bytes.

use serde::Deserialize;
use thiserror::Error;

use crate::types::PrNumber;

use super::events::{IssueCommentEvent, PullRequestAction, PullRequestEvent, WebhookEvent};

/// A delivery body that could not be understood.
///
/// Both variants are the submitter's fault and map to a 400; transport and
/// mirror failures live elsewhere.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body was not JSON, or a required field was missing or mistyped.
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A field was present but its value could not be interpreted.
    #[error("invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    number: u64,
    pull_request: RawPullRequest,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawCommentPayload {
    comment: RawComment,
    issue: RawIssue,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    user: RawUser,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    // Present exactly when the issue is a pull request
    pull_request: Option<RawIssuePullRequest>,
}

#[derive(Debug, Deserialize)]
struct RawIssuePullRequest {
    // A null here also marks a plain issue
    diff_url: Option<String>,
}

/// Parses a delivery body into a typed event.
///
/// Returns `Ok(None)` for shapes the mirror does not act on: payloads with
/// none of the three discriminating keys, and pull request payloads whose
/// action is not tracked. Returns `Err` only when a recognized shape is
/// malformed.
pub fn parse_webhook(payload: &[u8]) -> Result<Option<WebhookEvent>, ParseError> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;

    if value.get("pull_request").is_some() {
        let raw: RawPullRequestPayload = serde_json::from_value(value)?;
        let Some(action) = PullRequestAction::from_payload(&raw.action) else {
            return Ok(None);
        };
        return Ok(Some(WebhookEvent::PullRequest(PullRequestEvent {
            action,
            number: PrNumber(raw.number),
            author_login: raw.pull_request.user.login,
        })));
    }

    if value.get("commits").is_some() {
        return Ok(Some(WebhookEvent::Push));
    }

    if value.get("comment").is_some() {
        let raw: RawCommentPayload = serde_json::from_value(value)?;
        let pr_number = match raw.issue.pull_request.and_then(|pr| pr.diff_url) {
            Some(diff_url) => Some(parse_diff_url(&diff_url).ok_or(ParseError::InvalidField {
                field: "issue.pull_request.diff_url",
                value: diff_url,
            })?),
            None => None,
        };
        return Ok(Some(WebhookEvent::IssueComment(IssueCommentEvent {
            pr_number,
            author_login: raw.comment.user.login,
            body: raw.comment.body.unwrap_or_default(),
        })));
    }

    Ok(None)
}

/// Extracts the request number from a diff URL's final path segment.
///
/// The segment carries a `.diff` extension (`.../pull/1347.diff`), which is
/// stripped before parsing. Returns `None` when what remains is not a plain
/// decimal number.
fn parse_diff_url(url: &str) -> Option<PrNumber> {
    let segment = url.rsplit('/').next()?;
    let digits = segment.strip_suffix(".diff").unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(PrNumber)
}
