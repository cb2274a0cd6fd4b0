//! Changelog command - combined release notes of a milestone

use crate::cli::style::{cross, spinner, Stylize};
use crate::cli::{connect, milestone_projects, release_projects};
use anstream::{eprintln, print};
use nagger::classify::Taxonomy;
use nagger::config::Config;
use nagger::error::{Error, Result};
use nagger::release::{build_milestone_changelog, ProjectFailure};

/// Run the changelog command
///
/// Prints the public and the internal changelog, or only one of them.
pub async fn run_changelog(
    config: &Config,
    milestone: &str,
    external_only: bool,
    internal_only: bool,
) -> Result<()> {
    release_projects(config)?;
    let forge = connect(config).await?;
    let projects = milestone_projects(&forge, config, milestone).await?;

    let bar = spinner(format!("Collecting changes for {milestone}"));
    let changelog = build_milestone_changelog(
        &forge,
        &projects,
        milestone,
        &Taxonomy::default(),
        config.concurrency,
    )
    .await;
    bar.finish_and_clear();

    let text = match (external_only, internal_only) {
        (true, false) => changelog.render_external()?,
        (false, true) => changelog.render_internal()?,
        _ => changelog.render_both()?,
    };
    print!("{text}");

    report_failures(&changelog.failures, projects.len())
}

/// Print skipped projects; an error when any were skipped
pub(crate) fn report_failures(failures: &[ProjectFailure], total: usize) -> Result<()> {
    if failures.is_empty() {
        return Ok(());
    }

    for failure in failures {
        eprintln!(
            "{} {}: {}",
            cross(),
            failure.project.accent().for_stderr(),
            failure.error.to_string().error()
        );
    }
    Err(Error::PartialFailure {
        failed: failures.len(),
        total,
    })
}
