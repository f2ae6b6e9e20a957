//! Domain identifiers.

use std::fmt;

/// A pull request number.
///
/// Doubles as the name of the request's checkout directory under
/// `submissions/`, so Display renders the bare number with no adornment.
/// Ordering follows the numeric value; the reconciliation sweep walks
/// checkouts in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrNumber(pub u64);

impl fmt::Display for PrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The coordinates of the repository being mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    /// Account or organization owning the repository.
    pub owner: String,
    /// Repository name without the owner prefix.
    pub repo: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
