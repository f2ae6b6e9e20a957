//! Octocrab client wrapper scoped to the mirrored repository.

use octocrab::Octocrab;

use crate::types::RepoId;

/// A GitHub API client bound to the single repository this service mirrors.
///
/// Carrying the repository coordinate here keeps every call site from
/// threading owner and name separately.
#[derive(Clone)]
pub struct OctocrabClient {
    client: Octocrab,
    repo: RepoId,
}

impl OctocrabClient {
    /// Builds a client authenticated with a personal access token.
    pub fn from_token(token: impl Into<String>, repo: RepoId) -> Result<Self, octocrab::Error> {
        let client = Octocrab::builder().personal_token(token.into()).build()?;
        Ok(Self { client, repo })
    }

    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }
}

// The inner client holds the token; keep it out of Debug output
impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
