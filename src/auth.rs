//! Authorization gate for mirror mutations.

use std::collections::HashSet;

/// The set of identities allowed to trigger mirror mutations.
///
/// Fetched fresh from the repository's collaborator list for every event that
/// needs gating, never cached across events; staleness is bounded by one
/// event's processing time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    logins: HashSet<String>,
}

impl Roster {
    pub fn new(logins: impl IntoIterator<Item = String>) -> Self {
        Roster {
            logins: logins.into_iter().collect(),
        }
    }

    /// Whether the given actor may trigger mirror mutations.
    ///
    /// Exact match on login.
    pub fn is_authorized(&self, login: &str) -> bool {
        self.logins.contains(login)
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }
}
