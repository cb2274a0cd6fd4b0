//! Release execution
//!
//! Runs the release pipeline for every configured project. Projects are
//! independent: a failure in one never stops the others, and the report keeps
//! the input order regardless of completion order.

use crate::changelog::{aggregate, render, RenderContext, Template};
use crate::classify::Taxonomy;
use crate::config::DEFAULT_CONCURRENCY;
use crate::error::{Error, Result};
use crate::platform::ForgeService;
use crate::release::{milestone_from_tag, ReleaseProgress, Step};
use crate::types::{Release, Tag};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn, Instrument};

/// What to release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Tag to create (`v3.15.0`)
    pub tag_name: String,
    /// Milestone the changes are collected from (`v3.15`)
    pub milestone: String,
    /// Ref to tag; the project's default branch when absent
    pub git_ref: Option<String>,
    /// Render only, write nothing
    pub dry_run: bool,
    /// Maximum number of project pipelines in flight
    pub concurrency: usize,
}

impl ReleaseRequest {
    /// Request for a full version tag, deriving the milestone from it
    pub fn from_tag(tag_name: &str) -> Result<Self> {
        Ok(Self {
            tag_name: tag_name.to_string(),
            milestone: milestone_from_tag(tag_name)?,
            git_ref: None,
            dry_run: false,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }
}

/// How a project's pipeline ended
#[derive(Debug)]
pub enum ProjectStatus {
    /// Tag and release were created
    Released {
        /// Created tag
        tag: Tag,
        /// Created release
        release: Release,
    },
    /// Dry run: what would have been written
    DryRun {
        /// Rendered tag message
        tag_message: String,
        /// Rendered release notes
        release_notes: String,
    },
    /// The pipeline stopped at a step
    Failed {
        /// Step that failed
        step: Step,
        /// What went wrong
        error: Error,
    },
}

/// Result of one project's pipeline
#[derive(Debug)]
pub struct ProjectOutcome {
    /// Project path as configured
    pub project: String,
    /// Number of merged changes in the milestone (0 when not reached)
    pub changes: usize,
    /// How the pipeline ended
    pub status: ProjectStatus,
}

impl ProjectOutcome {
    /// Whether the pipeline failed
    pub const fn is_failed(&self) -> bool {
        matches!(self.status, ProjectStatus::Failed { .. })
    }
}

/// Result of a release over several projects
#[derive(Debug)]
pub struct ReleaseReport {
    /// Tag that was released
    pub tag_name: String,
    /// One outcome per project, in input order
    pub outcomes: Vec<ProjectOutcome>,
}

impl ReleaseReport {
    /// Outcomes of failed projects
    pub fn failures(&self) -> impl Iterator<Item = &ProjectOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    /// Number of failed projects
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Whether every project succeeded
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    /// Turn failures into an error for the exit status
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed_count();
        if failed == 0 {
            Ok(self)
        } else {
            Err(Error::PartialFailure {
                failed,
                total: self.outcomes.len(),
            })
        }
    }
}

/// Release every project
///
/// Per project, in order:
/// 1. Resolve the project and the milestone
/// 2. Fetch merged changes and group them by kind
/// 3. Render tag message and release notes
/// 4. Create the tag, then the release pointing at it
///
/// The release is never attempted when the tag could not be created.
pub async fn run_release(
    forge: &dyn ForgeService,
    projects: &[String],
    request: &ReleaseRequest,
    taxonomy: &Taxonomy,
    progress: &dyn ReleaseProgress,
) -> ReleaseReport {
    if request.dry_run {
        progress
            .on_message("Dry run - no tags or releases will be created")
            .await;
    }

    let outcomes = stream::iter(projects)
        .map(|path| {
            let span = tracing::info_span!("release", project = %path, tag = %request.tag_name);
            release_project(forge, path, request, taxonomy, progress).instrument(span)
        })
        .buffered(request.concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    ReleaseReport {
        tag_name: request.tag_name.clone(),
        outcomes,
    }
}

async fn release_project(
    forge: &dyn ForgeService,
    path: &str,
    request: &ReleaseRequest,
    taxonomy: &Taxonomy,
    progress: &dyn ReleaseProgress,
) -> ProjectOutcome {
    progress.on_project_started(path).await;

    let mut changes = 0;
    let status = match pipeline(forge, path, request, taxonomy, progress, &mut changes).await {
        Ok(status) => status,
        Err((step, error)) => {
            warn!(%step, %error, "Release failed");
            progress.on_project_failed(path, step, &error).await;
            ProjectStatus::Failed { step, error }
        }
    };

    ProjectOutcome {
        project: path.to_string(),
        changes,
        status,
    }
}

async fn pipeline(
    forge: &dyn ForgeService,
    path: &str,
    request: &ReleaseRequest,
    taxonomy: &Taxonomy,
    progress: &dyn ReleaseProgress,
    change_count: &mut usize,
) -> std::result::Result<ProjectStatus, (Step, Error)> {
    let at = |step: Step| move |error: Error| (step, error);

    progress.on_step(path, Step::ResolveProject).await;
    let project = forge
        .get_project(path)
        .await
        .map_err(at(Step::ResolveProject))?;

    progress.on_step(path, Step::ResolveMilestone).await;
    let milestone = forge
        .get_milestone(&project, &request.milestone)
        .await
        .map_err(at(Step::ResolveMilestone))?;

    progress.on_step(path, Step::FetchChanges).await;
    let changes = forge
        .list_merged_changes(&project, &milestone)
        .await
        .map_err(at(Step::FetchChanges))?;
    *change_count = changes.len();
    debug!(changes = changes.len(), "Fetched merged changes");

    progress.on_step(path, Step::Render).await;
    let grouping = aggregate(&changes, taxonomy);
    let ctx = RenderContext {
        tag_name: Some(&request.tag_name),
        milestone: Some(&milestone),
        changes: Some(&grouping),
        ..RenderContext::default()
    };
    let tag_message = render(Template::TagMessage, &ctx).map_err(at(Step::Render))?;
    let release_notes = render(Template::ReleaseNotes, &ctx).map_err(at(Step::Render))?;

    if request.dry_run {
        return Ok(ProjectStatus::DryRun {
            tag_message,
            release_notes,
        });
    }

    progress.on_step(path, Step::CreateTag).await;
    let git_ref = request
        .git_ref
        .clone()
        .or_else(|| project.default_branch.clone())
        .ok_or_else(|| {
            Error::Config(format!(
                "{} has no default branch; pass --ref explicitly",
                project.path
            ))
        })
        .map_err(at(Step::CreateTag))?;
    let tag = forge
        .create_tag(&project, &request.tag_name, &git_ref, &tag_message)
        .await
        .map_err(at(Step::CreateTag))?;
    info!(tag = %tag.name, commit = %tag.commit, "Created tag");
    progress.on_tag_created(path, &tag).await;

    progress.on_step(path, Step::CreateRelease).await;
    let release = forge
        .create_release(&project, &tag, &request.tag_name, &release_notes)
        .await
        .map_err(at(Step::CreateRelease))?;
    info!(release = %release.name, "Created release");
    progress.on_release_created(path, &release).await;

    Ok(ProjectStatus::Released { tag, release })
}
