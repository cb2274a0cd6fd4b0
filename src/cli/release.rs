//! Release command - tag and release every configured project

use crate::cli::progress::CliProgress;
use crate::cli::style::{check, cross, Stylize};
use crate::cli::{connect, milestone_projects, plural, release_projects};
use anstream::{eprintln, println};
use nagger::classify::Taxonomy;
use nagger::config::Config;
use nagger::error::Result;
use nagger::release::{self, ProjectStatus, ReleaseRequest};

/// Run the release command
pub async fn run_release(
    config: &Config,
    tag_name: &str,
    git_ref: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let request = ReleaseRequest {
        git_ref,
        dry_run,
        concurrency: config.concurrency,
        ..ReleaseRequest::from_tag(tag_name)?
    };
    release_projects(config)?;
    let forge = connect(config).await?;
    let projects = milestone_projects(&forge, config, &request.milestone).await?;

    println!(
        "Releasing {} from milestone {} in {} project{}",
        request.tag_name.emphasis(),
        request.milestone.accent(),
        projects.len(),
        plural(projects.len())
    );

    let progress = CliProgress::new();
    let report = release::run_release(
        &forge,
        &projects,
        &request,
        &Taxonomy::default(),
        &progress,
    )
    .await;
    progress.finish();

    for outcome in &report.outcomes {
        if let ProjectStatus::DryRun {
            tag_message,
            release_notes,
        } = &outcome.status
        {
            println!();
            println!("{}", format!("=== {} ===", outcome.project).emphasis());
            println!("{}", "Tag message:".muted());
            println!("{tag_message}");
            println!("{}", "Release notes:".muted());
            println!("{release_notes}");
        }
    }

    println!();
    let failed = report.failed_count();
    if failed == 0 {
        println!(
            "{} {} {} in {} project{}",
            check(),
            if dry_run { "Rendered" } else { "Released" },
            report.tag_name.accent(),
            report.outcomes.len(),
            plural(report.outcomes.len())
        );
    } else {
        eprintln!(
            "{} {} of {} project{} failed",
            cross(),
            failed,
            report.outcomes.len(),
            plural(report.outcomes.len())
        );
        for outcome in report.failures() {
            if let ProjectStatus::Failed { step, error } = &outcome.status {
                eprintln!(
                    "  {} ({step}, {}): {}",
                    outcome.project.accent().for_stderr(),
                    error.kind(),
                    error.to_string().error()
                );
            }
        }
    }

    report.into_result().map(|_| ())
}
