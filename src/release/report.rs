//! Milestone-wide reports
//!
//! Collects changes or issues of one milestone across several projects.
//! Projects are fetched concurrently; the report keeps the input order.

use crate::changelog::{
    aggregate_project, render, IssueSection, ProjectChangelog, RenderContext, Template,
};
use crate::classify::Taxonomy;
use crate::error::{Error, Result};
use crate::issues::{build_issue_forest, IssueForest};
use crate::platform::ForgeService;
use futures::stream::{self, StreamExt};
use std::fmt::Write;
use tracing::{debug, warn, Instrument};

const CUT_OPEN: &str = "--8<--";
const CUT_CLOSE: &str = "-->8--";

/// A project that could not be included in a report
#[derive(Debug)]
pub struct ProjectFailure {
    /// Project path as configured
    pub project: String,
    /// What went wrong
    pub error: Error,
}

/// Changes of one milestone across projects
#[derive(Debug)]
pub struct MilestoneChangelog {
    /// Milestone title
    pub milestone: String,
    /// Projects with their grouped changes, in input order
    pub projects: Vec<ProjectChangelog>,
    /// Projects that could not be fetched
    pub failures: Vec<ProjectFailure>,
}

impl MilestoneChangelog {
    /// Public changelog, grouped by project then kind
    pub fn render_external(&self) -> Result<String> {
        self.render(Template::ExternalChangelog)
    }

    /// Concise changelog of every change, internal ones included
    pub fn render_internal(&self) -> Result<String> {
        self.render(Template::InternalChangelog)
    }

    /// Public changelog between scissor lines, then the internal one
    pub fn render_both(&self) -> Result<String> {
        let mut out = String::new();
        let _ = writeln!(out, "{}\n", CUT_OPEN.repeat(10));
        out.push_str(&self.render_external()?);
        let _ = writeln!(out, "{}\n", CUT_CLOSE.repeat(10));
        out.push_str(&self.render_internal()?);
        Ok(out)
    }

    fn render(&self, template: Template) -> Result<String> {
        render(
            template,
            &RenderContext {
                title: Some(&self.milestone),
                projects: &self.projects,
                ..RenderContext::default()
            },
        )
    }
}

/// Build the changelog of a milestone over several projects
pub async fn build_milestone_changelog(
    forge: &dyn ForgeService,
    projects: &[String],
    milestone: &str,
    taxonomy: &Taxonomy,
    concurrency: usize,
) -> MilestoneChangelog {
    let results = stream::iter(projects)
        .map(|path| {
            let span = tracing::info_span!("changelog", project = %path);
            async move {
                let project = forge.get_project(path).await?;
                let milestone = forge.get_milestone(&project, milestone).await?;
                let changes = forge.list_merged_changes(&project, &milestone).await?;
                debug!(changes = changes.len(), "Fetched merged changes");
                Ok::<_, Error>(aggregate_project(project, &changes, taxonomy))
            }
            .instrument(span)
        })
        .buffered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let (projects_ok, failures) = split_results(projects, results);
    MilestoneChangelog {
        milestone: milestone.to_string(),
        projects: projects_ok,
        failures,
    }
}

/// Issues of one milestone across projects
#[derive(Debug)]
pub struct MilestoneIssues {
    /// Milestone title
    pub milestone: String,
    /// Project paths with their issue forests, in input order
    pub projects: Vec<(String, IssueForest)>,
    /// Projects that could not be fetched
    pub failures: Vec<ProjectFailure>,
}

impl MilestoneIssues {
    /// Render the issue report
    pub fn render(&self) -> Result<String> {
        let sections: Vec<IssueSection<'_>> = self
            .projects
            .iter()
            .map(|(project, forest)| IssueSection { project, forest })
            .collect();

        render(
            Template::IssueReport,
            &RenderContext {
                title: Some(&self.milestone),
                issues: &sections,
                ..RenderContext::default()
            },
        )
    }
}

/// Build the issue forests of a milestone over several projects
pub async fn build_issue_report(
    forge: &dyn ForgeService,
    projects: &[String],
    milestone: &str,
    concurrency: usize,
) -> MilestoneIssues {
    let results = stream::iter(projects)
        .map(|path| {
            let span = tracing::info_span!("issues", project = %path);
            async move {
                let project = forge.get_project(path).await?;
                let milestone = forge.get_milestone(&project, milestone).await?;
                let issues = forge.list_issues(&project, &milestone).await?;
                debug!(issues = issues.len(), "Fetched issues");
                Ok::<_, Error>((project.path, build_issue_forest(&milestone, issues)))
            }
            .instrument(span)
        })
        .buffered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    let (projects_ok, failures) = split_results(projects, results);
    MilestoneIssues {
        milestone: milestone.to_string(),
        projects: projects_ok,
        failures,
    }
}

fn split_results<T>(
    projects: &[String],
    results: Vec<Result<T>>,
) -> (Vec<T>, Vec<ProjectFailure>) {
    let mut ok = Vec::new();
    let mut failures = Vec::new();

    for (path, result) in projects.iter().zip(results) {
        match result {
            Ok(value) => ok.push(value),
            Err(error) => {
                warn!(project = %path, %error, "Skipping project");
                failures.push(ProjectFailure {
                    project: path.clone(),
                    error,
                });
            }
        }
    }

    (ok, failures)
}
