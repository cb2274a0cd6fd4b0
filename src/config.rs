//! Run configuration
//!
//! Everything the core needs is collected here once, from an injectable key
//! lookup (the process environment in the binary), and then passed down
//! explicitly.

use crate::error::{Error, Result};
use crate::platform::normalize_base_url;

/// Default forge when no URL is configured
pub const DEFAULT_FORGE_URL: &str = "https://gitlab.com/";

/// Default width of the per-project worker pool
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default number of retries for read requests
pub const DEFAULT_READ_RETRIES: usize = 3;

/// Default number of concurrent HTTP requests per host
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Connection settings handed to the forge client
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    /// Forge base URL (scheme + host), e.g. `https://gitlab.com/`
    pub base_url: String,
    /// Access token
    pub token: String,
    /// Maximum concurrent requests against the host
    pub max_in_flight: usize,
    /// Retries for transient read failures
    pub read_retries: usize,
}

impl ForgeConfig {
    /// Forge settings with default limits
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            read_retries: DEFAULT_READ_RETRIES,
        }
    }
}

/// Project selection and tuning for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Forge base URL (scheme + host)
    pub forge_url: String,
    /// Projects covered by release, changelog and issue reports
    pub release_projects: Vec<String>,
    /// Projects skipped by releases
    pub ignore_projects: Vec<String>,
    /// Group whose milestone merge requests add release projects
    pub group: Option<String>,
    /// Projects covered by `nag`
    pub nag_projects: Vec<String>,
    /// Merge request of the running pipeline (`CI_MERGE_REQUEST_IID`)
    pub merge_request_iid: Option<u64>,
    /// Numeric ID of the project running the pipeline
    pub ci_project_id: Option<String>,
    /// Path of the project running the pipeline
    pub ci_project_path: Option<String>,
    /// Width of the per-project worker pool
    pub concurrency: usize,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("CI_API_V4_URL")
            .or_else(|| lookup("GITLAB_HOST"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FORGE_URL.to_string());
        let forge_url = normalize_base_url(&raw_url)?;

        let ci_project_id = non_empty(lookup("CI_PROJECT_ID"));
        let ci_project_path = non_empty(lookup("CI_PROJECT_PATH"));

        let mut nag_projects = split_list(lookup("NAGGER_NAG_PROJECTS"));
        if nag_projects.is_empty() {
            nag_projects.extend(ci_project_id.clone());
        }

        let merge_request_iid = lookup("CI_MERGE_REQUEST_IID")
            .map(|v| parse_number("CI_MERGE_REQUEST_IID", &v))
            .transpose()?;

        let concurrency = lookup("NAGGER_CONCURRENCY")
            .map(|v| parse_number("NAGGER_CONCURRENCY", &v))
            .transpose()?
            .map_or(DEFAULT_CONCURRENCY, |n| usize::try_from(n).unwrap_or(usize::MAX));
        if concurrency == 0 {
            return Err(Error::Config("NAGGER_CONCURRENCY must be at least 1".to_string()));
        }

        Ok(Self {
            forge_url,
            release_projects: split_list(lookup("NAGGER_RELEASE_PROJECTS")),
            ignore_projects: split_list(lookup("NAGGER_IGNORE_PROJECTS")),
            group: non_empty(lookup("NAGGER_GROUP")),
            nag_projects,
            merge_request_iid,
            ci_project_id,
            ci_project_path,
            concurrency,
        })
    }

    /// Release projects minus ignored ones, in configured order
    pub fn effective_release_projects(&self) -> Vec<String> {
        self.release_projects
            .iter()
            .filter(|p| !self.ignore_projects.contains(p))
            .cloned()
            .collect()
    }

    /// Whether a project path or ID names the project running the pipeline
    pub fn is_ci_project(&self, project: &str) -> bool {
        [&self.ci_project_id, &self.ci_project_path]
            .into_iter()
            .flatten()
            .any(|p| p == project)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got '{value}'")))
}
