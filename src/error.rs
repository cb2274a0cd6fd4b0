//! Error types for nagger

use thiserror::Error;

/// Errors produced while talking to the forge or building reports
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid credentials
    #[error("authentication error: {0}")]
    Auth(String),

    /// Invalid configuration (environment, flags, rule tables)
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to parse a value (URL, tag name, ...)
    #[error("parse error: {0}")]
    Parse(String),

    /// Project does not exist or is not visible to the token
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    /// No active milestone with the requested title
    #[error("milestone '{milestone}' not found in {project}")]
    MilestoneNotFound {
        /// Milestone title that was looked up
        milestone: String,
        /// Project the lookup ran against
        project: String,
    },

    /// A forge resource answered 404
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure, 5xx or rate limit - reads may be retried
    #[error("transient forge error: {0}")]
    Transient(String),

    /// Any other non-success answer from the GitLab API
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Template/context mismatch while rendering a report
    #[error("render error: {0}")]
    Render(String),

    /// Some projects or merge requests failed; the others completed
    #[error("{failed} of {total} failed")]
    PartialFailure {
        /// Number of failed items
        failed: usize,
        /// Number of processed items
        total: usize,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a read that produced this error may be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Whether this error means a required object is absent
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::ProjectNotFound(_) | Self::MilestoneNotFound { .. }
        )
    }

    /// Short label used in run summaries
    pub fn kind(&self) -> &'static str {
        if self.is_not_found() {
            return "not-found";
        }
        if self.is_transient() {
            return "transient";
        }
        match self {
            Self::Auth(_) => "auth",
            Self::Config(_) | Self::Parse(_) => "config",
            Self::Render(_) => "render",
            Self::PartialFailure { .. } => "partial-failure",
            Self::Json(_) => "decode",
            Self::Internal(_) => "internal",
            _ => "forge",
        }
    }
}

/// Result alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_kinds() {
        let err = Error::MilestoneNotFound {
            milestone: "v1.2".to_string(),
            project: "group/app".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.kind(), "not-found");
        assert_eq!(err.to_string(), "milestone 'v1.2' not found in group/app");
    }

    #[test]
    fn test_transient_only_for_transient() {
        assert!(Error::Transient("503".to_string()).is_transient());
        assert!(!Error::GitLabApi("400".to_string()).is_transient());
        assert!(!Error::Render("missing tag".to_string()).is_transient());
        assert_eq!(Error::Render("x".to_string()).kind(), "render");
    }
}
