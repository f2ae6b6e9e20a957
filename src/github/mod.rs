//! GitHub API access via octocrab.
//!
//! The mirror makes exactly three kinds of call: list collaborators (the
//! authorization roster), list open pull requests (setup pre-population), and
//! register the webhook. Failures are classified transient or permanent for
//! the logs; nothing here retries.

mod api;
mod client;
mod error;

pub use api::{fetch_roster, list_open_pull_requests, register_webhook};
pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
