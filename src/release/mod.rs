//! Release orchestration
//!
//! Drives the per-project release pipeline (resolve milestone, aggregate,
//! render, tag, release) and the milestone-wide reports built on the same
//! building blocks:
//! 1. Release - tag and release every configured or discovered project
//! 2. Reports - combined changelog and issue report for a milestone
//! 3. Fixup - attach stray merged changes to a milestone

mod discover;
mod execute;
mod fixup;
mod progress;
mod report;
mod version;

pub use discover::discover_projects;
pub use execute::{run_release, ProjectOutcome, ProjectStatus, ReleaseReport, ReleaseRequest};
pub use fixup::{fixup_milestone, in_window, milestone_window, FixupEntry, FixupReport};
pub use progress::{NoopProgress, ReleaseProgress, Step};
pub use report::{
    build_issue_report, build_milestone_changelog, MilestoneChangelog, MilestoneIssues,
    ProjectFailure,
};
pub use version::{is_version, milestone_from_tag, release_milestones};
