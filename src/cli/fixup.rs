//! Fixup command - attach unmilestoned merged MRs to a milestone

use crate::cli::changelog::report_failures;
use crate::cli::style::{arrow, check, spinner, Stylize};
use crate::cli::{connect, milestone_projects, plural, release_projects};
use anstream::println;
use nagger::config::Config;
use nagger::error::Result;
use nagger::release::fixup_milestone;

/// Run the fixup command
pub async fn run_fixup(config: &Config, milestone: &str, dry_run: bool) -> Result<()> {
    release_projects(config)?;
    let forge = connect(config).await?;
    let projects = milestone_projects(&forge, config, milestone).await?;

    if dry_run {
        println!("{}", "Dry run - no milestones will be assigned".warn().for_stdout());
    }

    let bar = spinner(format!("Looking for merge requests merged during {milestone}"));
    let report = fixup_milestone(&forge, &projects, milestone, dry_run).await;
    bar.finish_and_clear();

    for entry in &report.assigned {
        println!(
            "{} {} {} {}",
            arrow(),
            entry.reference.accent(),
            entry.title,
            entry.merged_at.format("%Y-%m-%d").to_string().muted()
        );
    }

    let verb = if dry_run { "Would assign" } else { "Assigned" };
    println!(
        "{} {verb} {} merge request{} to {} ({} outside the milestone window)",
        check(),
        report.assigned.len(),
        plural(report.assigned.len()),
        milestone.accent(),
        report.skipped
    );

    report_failures(&report.failures, projects.len())
}
