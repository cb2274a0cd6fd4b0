//! Authentication for GitLab
//!
//! Supports environment variables and the `glab` CLI.

mod gitlab;

pub use gitlab::{get_gitlab_auth, token_from_lookup, GitLabAuthConfig};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (glab)
    Cli,
    /// Token from environment variable
    EnvVar,
}
