//! Milestone nagging
//!
//! Decides, per open merge request, whether a milestone reminder must be
//! posted. Nothing is stored locally: earlier nags are recognised by a marker
//! embedded in the comment body, so the comment listing handed to
//! [`NagRecord::inspect`] must be complete.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::platform::ForgeService;
use crate::types::{Change, Comment};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn, Instrument};

const NAG_MARKER_PREFIX: &str = "<!--- NAGGER_NAG: ";
const NAG_MARKER_POSTFIX: &str = " --->";
const NAG_MARKER_VERSION: u8 = 1;

/// Data embedded in the nag marker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct NagMarkerData {
    version: u8,
    reference: String,
}

/// Nagging state of a single open merge request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NagState {
    /// Not evaluated yet
    Unchecked,
    /// A milestone is set; nothing to do
    HasMilestone,
    /// No milestone, but an earlier run already nagged
    MissingMilestoneNoNag,
    /// No milestone and this run posted the reminder
    MissingMilestoneNagged,
}

impl NagState {
    /// Whether no further transition is possible
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::HasMilestone | Self::MissingMilestoneNagged)
    }
}

impl fmt::Display for NagState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unchecked => "unchecked",
            Self::HasMilestone => "has milestone",
            Self::MissingMilestoneNoNag => "missing milestone, already nagged",
            Self::MissingMilestoneNagged => "missing milestone, nagged",
        };
        f.write_str(text)
    }
}

/// Per-run judgment about one merge request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NagRecord {
    /// The change references a milestone
    pub has_milestone: bool,
    /// A comment already carries the nag marker
    pub has_existing_nag: bool,
}

impl NagRecord {
    /// Inspect a change together with its complete comment listing
    pub fn inspect(change: &Change, comments: &[Comment]) -> Self {
        Self {
            has_milestone: change.milestone.is_some(),
            has_existing_nag: comments.iter().any(|c| has_nag_marker(&c.body)),
        }
    }

    /// State reached from `Unchecked`
    pub const fn next_state(&self) -> NagState {
        if self.has_milestone {
            NagState::HasMilestone
        } else if self.has_existing_nag {
            NagState::MissingMilestoneNoNag
        } else {
            NagState::MissingMilestoneNagged
        }
    }
}

/// Whether a comment body carries the nag marker
pub fn has_nag_marker(body: &str) -> bool {
    body.contains(NAG_MARKER_PREFIX)
}

/// Build the reminder comment for a change
pub fn nag_comment_body(change: &Change) -> Result<String> {
    let data = NagMarkerData {
        version: NAG_MARKER_VERSION,
        reference: change.reference.clone(),
    };
    let encoded = BASE64.encode(
        serde_json::to_string(&data)
            .map_err(|e| Error::Internal(format!("Failed to serialize nag marker: {e}")))?,
    );

    Ok(format!(
        "{NAG_MARKER_PREFIX}{encoded}{NAG_MARKER_POSTFIX}\n\
         Hello @{}.\n\n\
         You forgot to add a Milestone to this Merge Request.\n\n\
         Please add one so the change ends up in the right release notes, \
         and make sure the title is descriptive.",
        change.author
    ))
}

/// Result of nagging one merge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NagOutcome {
    /// MR reference, e.g. "group/app!12"
    pub reference: String,
    /// MR web URL
    pub web_url: String,
    /// State reached
    pub state: NagState,
    /// Whether the comment was only simulated
    pub dry_run: bool,
}

/// Run the nag state machine for one merge request
///
/// Posts at most one comment. The comment is never retried: a failed write
/// surfaces as an error instead.
pub async fn nag_change(
    forge: &dyn ForgeService,
    change: &Change,
    dry_run: bool,
) -> Result<NagOutcome> {
    let outcome = |state| NagOutcome {
        reference: change.reference.clone(),
        web_url: change.web_url.clone(),
        state,
        dry_run,
    };

    if change.milestone.is_some() {
        debug!("Milestone set, nothing to do");
        return Ok(outcome(NagState::HasMilestone));
    }

    let comments = forge.list_comments(change).await?;
    let state = NagRecord::inspect(change, &comments).next_state();

    if state == NagState::MissingMilestoneNagged {
        if dry_run {
            info!("Would nag about missing milestone");
        } else {
            let body = nag_comment_body(change)?;
            forge.create_comment(change, &body).await?;
            info!(author = %change.author, "Nagged about missing milestone");
        }
    } else {
        debug!(%state, "Already nagged");
    }

    Ok(outcome(state))
}

/// Which merge requests a nag run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NagTarget {
    /// Every open merge request of each project
    AllOpen,
    /// A single merge request by IID
    Single(u64),
}

/// Decide which projects and merge requests a nag run covers
///
/// `projects` and `mr` come from the command line and override the
/// configuration. An explicit `mr` needs exactly one project. A merge
/// request from the CI environment belongs to the pipeline's project and
/// restricts the run to it.
pub fn select_targets(
    config: &Config,
    projects: Vec<String>,
    mr: Option<u64>,
) -> Result<(Vec<String>, NagTarget)> {
    let projects = if projects.is_empty() {
        config.nag_projects.clone()
    } else {
        projects
    };
    if projects.is_empty() {
        return Err(Error::Config(
            "no projects to nag; set NAGGER_NAG_PROJECTS or pass --project".to_string(),
        ));
    }

    if let Some(iid) = mr {
        if projects.len() != 1 {
            return Err(Error::Config(format!(
                "--mr {iid} needs exactly one project, got {}",
                projects.len()
            )));
        }
        return Ok((projects, NagTarget::Single(iid)));
    }

    let Some(iid) = config.merge_request_iid else {
        return Ok((projects, NagTarget::AllOpen));
    };

    let pipeline_projects: Vec<String> = projects
        .into_iter()
        .filter(|p| config.is_ci_project(p))
        .collect();
    if pipeline_projects.is_empty() {
        return Err(Error::Config(format!(
            "CI_MERGE_REQUEST_IID={iid} is set, but the pipeline project is not among the \
             nag projects"
        )));
    }
    debug!(iid, "Restricting nag to the pipeline merge request");
    Ok((pipeline_projects, NagTarget::Single(iid)))
}

/// A project or merge request that could not be processed
#[derive(Debug)]
pub struct NagFailure {
    /// Project path or MR reference
    pub target: String,
    /// What went wrong
    pub error: Error,
}

/// Outcome of a nag run over several projects
#[derive(Debug, Default)]
pub struct NagReport {
    /// Merge requests that were evaluated
    pub outcomes: Vec<NagOutcome>,
    /// Failures (non-fatal)
    pub failures: Vec<NagFailure>,
}

impl NagReport {
    /// Number of comments posted (or that would be posted in dry-run)
    pub fn nagged(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.state == NagState::MissingMilestoneNagged)
            .count()
    }

    /// Whether nothing failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Nag every targeted merge request of the given projects
///
/// A failing project or merge request is recorded and the run continues.
pub async fn run_nag(
    forge: &dyn ForgeService,
    projects: &[String],
    target: NagTarget,
    dry_run: bool,
) -> NagReport {
    let mut report = NagReport::default();

    for path in projects {
        let span = tracing::info_span!("nag", project = %path);
        let changes = collect_targets(forge, path, target).instrument(span.clone()).await;

        let changes = match changes {
            Ok(changes) => changes,
            Err(error) => {
                warn!(project = %path, %error, "Failed to list merge requests");
                report.failures.push(NagFailure {
                    target: path.clone(),
                    error,
                });
                continue;
            }
        };

        for change in &changes {
            let mr_span = tracing::info_span!(parent: &span, "mr", mr = %change.reference);
            match nag_change(forge, change, dry_run).instrument(mr_span).await {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(error) => {
                    warn!(mr = %change.reference, %error, "Failed to nag");
                    report.failures.push(NagFailure {
                        target: change.reference.clone(),
                        error,
                    });
                }
            }
        }
    }

    report
}

async fn collect_targets(
    forge: &dyn ForgeService,
    path: &str,
    target: NagTarget,
) -> Result<Vec<Change>> {
    let project = forge.get_project(path).await?;
    match target {
        NagTarget::AllOpen => forge.list_open_changes(&project).await,
        NagTarget::Single(iid) => Ok(vec![forge.get_change(&project, iid).await?]),
    }
}
