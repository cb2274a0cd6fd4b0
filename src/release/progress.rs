//! Progress callback trait for interface-agnostic updates
//!
//! This trait allows different interfaces (CLI, CI logs, etc.) to receive
//! progress updates while project pipelines run. Pipelines for different
//! projects run concurrently, so callbacks for different projects interleave.

use crate::error::Error;
use crate::types::{Release, Tag};
use async_trait::async_trait;
use std::fmt;

/// Step of a project release pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Looking up the project
    ResolveProject,
    /// Looking up the release milestone
    ResolveMilestone,
    /// Fetching merged changes
    FetchChanges,
    /// Rendering tag message and release notes
    Render,
    /// Creating the tag
    CreateTag,
    /// Creating the release
    CreateRelease,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ResolveProject => "resolving project",
            Self::ResolveMilestone => "resolving milestone",
            Self::FetchChanges => "fetching changes",
            Self::Render => "rendering notes",
            Self::CreateTag => "creating tag",
            Self::CreateRelease => "creating release",
        };
        f.write_str(text)
    }
}

/// Progress callback trait
///
/// Implement this trait to receive progress updates during a release.
#[async_trait]
pub trait ReleaseProgress: Send + Sync {
    /// Called when a project pipeline starts
    async fn on_project_started(&self, project: &str);

    /// Called when a project pipeline enters a step
    async fn on_step(&self, project: &str, step: Step);

    /// Called when a tag was created
    async fn on_tag_created(&self, project: &str, tag: &Tag);

    /// Called when a release was created
    async fn on_release_created(&self, project: &str, release: &Release);

    /// Called when a project pipeline failed
    async fn on_project_failed(&self, project: &str, step: Step, error: &Error);

    /// Called with a general status message
    async fn on_message(&self, message: &str);
}

/// No-op progress callback for testing or when progress isn't needed
pub struct NoopProgress;

#[async_trait]
impl ReleaseProgress for NoopProgress {
    async fn on_project_started(&self, _project: &str) {}
    async fn on_step(&self, _project: &str, _step: Step) {}
    async fn on_tag_created(&self, _project: &str, _tag: &Tag) {}
    async fn on_release_created(&self, _project: &str, _release: &Release) {}
    async fn on_project_failed(&self, _project: &str, _step: Step, _error: &Error) {}
    async fn on_message(&self, _message: &str) {}
}
