//! Issues command - issue tree of a milestone

use crate::cli::changelog::report_failures;
use crate::cli::style::spinner;
use crate::cli::{connect, milestone_projects, release_projects};
use anstream::print;
use nagger::config::Config;
use nagger::error::Result;
use nagger::release::build_issue_report;

/// Run the issues command
pub async fn run_issues(config: &Config, milestone: &str) -> Result<()> {
    release_projects(config)?;
    let forge = connect(config).await?;
    let projects = milestone_projects(&forge, config, milestone).await?;

    let bar = spinner(format!("Collecting issues for {milestone}"));
    let report = build_issue_report(&forge, &projects, milestone, config.concurrency).await;
    bar.finish_and_clear();

    print!("{}", report.render()?);
    report_failures(&report.failures, projects.len())
}
