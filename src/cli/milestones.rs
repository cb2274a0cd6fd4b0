//! Milestones command - list active release milestones

use crate::cli::style::{bullet, Stylize};
use crate::cli::{connect, release_projects};
use anstream::println;
use nagger::config::Config;
use nagger::error::{Error, Result};
use nagger::platform::ForgeService;
use nagger::release::release_milestones;

/// Run the milestones command
///
/// Lists active version-like milestones of `project`, or of the first
/// release project.
pub async fn run_milestones(config: &Config, project: Option<String>) -> Result<()> {
    let path = match project {
        Some(path) => path,
        None => release_projects(config)?.into_iter().next().ok_or_else(|| {
            Error::Config("no release project to list; pass --project".to_string())
        })?,
    };
    let forge = connect(config).await?;

    let project = forge.get_project(&path).await?;
    let milestones = release_milestones(&forge, &project).await?;

    if milestones.is_empty() {
        println!("{}", format!("No active release milestones in {path}").muted());
        return Ok(());
    }

    for milestone in &milestones {
        let due = milestone
            .due_date
            .map(|d| format!("due {d}"))
            .unwrap_or_default();
        println!("{} {} {}", bullet(), milestone.title.accent(), due.muted());
    }
    Ok(())
}
