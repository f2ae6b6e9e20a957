//! GitHub API error classification.
//!
//! Remote API failures are sorted into transient (the call might succeed if
//! repeated later) and permanent (something about the request or the
//! repository is wrong). Nothing here retries; the classification exists so
//! logs and callers can tell a GitHub outage from a misconfiguration.

use std::fmt;

use thiserror::Error;

/// Whether an API failure is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitHubErrorKind {
    /// Rate limits, 5xx responses, and transport failures.
    Transient,
    /// Everything else: bad credentials, missing repository, malformed
    /// request.
    Permanent,
}

/// A failed GitHub API call, with its classification.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    pub kind: GitHubErrorKind,
    pub status_code: Option<u16>,
    pub message: String,
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    pub fn is_transient(&self) -> bool {
        self.kind == GitHubErrorKind::Transient
    }

    /// Classifies an octocrab error.
    ///
    /// GitHub-level responses carry a typed status code; anything without one
    /// (connect failures, TLS, timeouts) happened below the API and is
    /// treated as transient.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status_code = match &err {
            octocrab::Error::GitHub { source, .. } => Some(source.status_code.as_u16()),
            _ => None,
        };
        let message = err.to_string();
        Self {
            kind: classify(status_code, &message),
            status_code,
            message,
            source: Some(err),
        }
    }
}

/// Status-code classification, separated out so it can be tested without
/// manufacturing octocrab errors.
fn classify(status_code: Option<u16>, message: &str) -> GitHubErrorKind {
    match status_code {
        Some(429) => GitHubErrorKind::Transient,
        // Secondary rate limits arrive as 403 with a telltale message
        Some(403) if message.to_lowercase().contains("rate limit") => GitHubErrorKind::Transient,
        Some(code) if (500..600).contains(&code) => GitHubErrorKind::Transient,
        Some(_) => GitHubErrorKind::Permanent,
        None => GitHubErrorKind::Transient,
    }
}
