//! Milestone fixup
//!
//! Attaches merged merge requests that were never given a milestone to the
//! milestone whose date window contains their merge time.

use crate::error::{Error, Result};
use crate::platform::ForgeService;
use crate::release::ProjectFailure;
use crate::types::{Change, Milestone};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn, Instrument};

/// A merge request that was (or would be) attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixupEntry {
    /// Project path
    pub project: String,
    /// MR reference (`group/app!12`)
    pub reference: String,
    /// MR title
    pub title: String,
    /// MR web URL
    pub web_url: String,
    /// When it was merged
    pub merged_at: DateTime<Utc>,
}

/// Result of a fixup run
#[derive(Debug, Default)]
pub struct FixupReport {
    /// Attached merge requests (or candidates in dry-run)
    pub assigned: Vec<FixupEntry>,
    /// Unmilestoned merge requests outside the window
    pub skipped: usize,
    /// Projects or merge requests that failed
    pub failures: Vec<ProjectFailure>,
    /// Whether nothing was written
    pub dry_run: bool,
}

impl FixupReport {
    /// Whether nothing failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The `(start, due)` window of a milestone, both at UTC midnight
pub fn milestone_window(milestone: &Milestone) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    match (milestone.start_date, milestone.due_date) {
        (Some(start), Some(due)) => Ok((midnight(start), midnight(due))),
        _ => Err(Error::Config(format!(
            "milestone '{}' needs both a start and a due date",
            milestone.title
        ))),
    }
}

/// Whether a merge time lies strictly inside the window
pub fn in_window(merged_at: DateTime<Utc>, window: (DateTime<Utc>, DateTime<Utc>)) -> bool {
    window.0 < merged_at && merged_at < window.1
}

/// Attach stray merged changes of every project to a milestone
pub async fn fixup_milestone(
    forge: &dyn ForgeService,
    projects: &[String],
    milestone: &str,
    dry_run: bool,
) -> FixupReport {
    let mut report = FixupReport {
        dry_run,
        ..FixupReport::default()
    };

    for path in projects {
        let span = tracing::info_span!("fixup", project = %path, milestone);
        let result = fixup_project(forge, path, milestone, dry_run, &mut report)
            .instrument(span)
            .await;

        if let Err(error) = result {
            warn!(project = %path, %error, "Fixup failed");
            report.failures.push(ProjectFailure {
                project: path.clone(),
                error,
            });
        }
    }

    report
}

async fn fixup_project(
    forge: &dyn ForgeService,
    path: &str,
    milestone: &str,
    dry_run: bool,
    report: &mut FixupReport,
) -> Result<()> {
    let project = forge.get_project(path).await?;
    let milestone = forge.get_milestone(&project, milestone).await?;
    let window = milestone_window(&milestone)?;

    for change in forge.list_unmilestoned_merged_changes(&project).await? {
        let Some(merged_at) = change.merged_at.filter(|&at| in_window(at, window)) else {
            report.skipped += 1;
            continue;
        };

        if !dry_run {
            if let Err(error) = forge.assign_milestone(&change, &milestone).await {
                warn!(mr = %change.reference, %error, "Failed to assign milestone");
                report.failures.push(ProjectFailure {
                    project: change.reference.clone(),
                    error,
                });
                continue;
            }
            info!(mr = %change.reference, "Assigned milestone");
        }

        report.assigned.push(entry(path, change, merged_at));
    }

    Ok(())
}

fn entry(path: &str, change: Change, merged_at: DateTime<Utc>) -> FixupEntry {
    FixupEntry {
        project: path.to_string(),
        reference: change.reference,
        title: change.title,
        web_url: change.web_url,
        merged_at,
    }
}
