//! Nag command - remind authors to set a milestone

use crate::cli::style::{arrow, check, cross, hyperlink_url, spinner, Stream, Stylize};
use crate::cli::{connect, plural};
use anstream::{eprintln, println};
use nagger::config::Config;
use nagger::error::{Error, Result};
use nagger::nag::{self, NagState};

/// Run the nag command
///
/// `projects` and `mr` override the configured nag projects and merge request.
pub async fn run_nag(
    config: &Config,
    projects: Vec<String>,
    mr: Option<u64>,
    dry_run: bool,
) -> Result<()> {
    let (projects, target) = nag::select_targets(config, projects, mr)?;
    let forge = connect(config).await?;

    if dry_run {
        println!("{}", "Dry run - no comments will be posted".warn().for_stdout());
    }

    let bar = spinner(format!(
        "Checking {} project{}",
        projects.len(),
        plural(projects.len())
    ));
    let report = nag::run_nag(&forge, &projects, target, dry_run).await;
    bar.finish_and_clear();

    for outcome in &report.outcomes {
        match outcome.state {
            NagState::MissingMilestoneNagged => {
                let verb = if outcome.dry_run { "Would nag" } else { "Nagged" };
                println!(
                    "{} {verb} {} {}",
                    arrow(),
                    outcome.reference.accent(),
                    hyperlink_url(Stream::Stdout, &outcome.web_url).muted()
                );
            }
            NagState::MissingMilestoneNoNag => {
                println!(
                    "  {} {}",
                    outcome.reference.accent(),
                    "already nagged".muted()
                );
            }
            NagState::HasMilestone | NagState::Unchecked => {}
        }
    }

    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            cross(),
            failure.target.accent().for_stderr(),
            failure.error.to_string().error()
        );
    }

    let nagged = report.nagged();
    println!(
        "{} Checked {} merge request{}, {} missing a milestone",
        check(),
        report.outcomes.len(),
        plural(report.outcomes.len()),
        nagged.success()
    );

    if report.is_success() {
        Ok(())
    } else {
        Err(Error::PartialFailure {
            failed: report.failures.len(),
            total: report.outcomes.len() + report.failures.len(),
        })
    }
}
