//! Webhook-driven mirror of a repository and its open pull requests.
//!
//! The master mirror at the configured root tracks the upstream default
//! branch and exposes every pull request head under a local
//! `refs/remotes/origin/pr/<number>` namespace. Each mirrored request gets
//! its own checkout under `<root>/submissions/<number>/`, created and torn
//! down by webhook events (and by `w3c-test:mirror` / `w3c-test:unmirror`
//! comments from collaborators). Presence on disk is the only registry; a
//! signed empty delivery triggers a sweep that refreshes everything tracked.

pub mod auth;
pub mod commands;
pub mod config;
pub mod git;
pub mod github;
pub mod server;
pub mod service;
pub mod setup;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
