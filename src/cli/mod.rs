//! CLI commands
//!
//! Command implementations for the `nagger` binary.

mod auth;
mod changelog;
mod debug;
mod fixup;
mod issues;
mod milestones;
mod nag;
mod progress;
mod release;
pub mod style;

pub use auth::run_auth;
pub use changelog::run_changelog;
pub use debug::run_debug_variables;
pub use fixup::run_fixup;
pub use issues::run_issues;
pub use milestones::run_milestones;
pub use nag::run_nag;
pub use release::run_release;

use nagger::auth::get_gitlab_auth;
use nagger::config::Config;
use nagger::error::{Error, Result};
use nagger::platform::{ForgeService, GitLabService};
use nagger::release::discover_projects;
use tracing::debug;

/// Authenticate and build the GitLab client
async fn connect(config: &Config) -> Result<GitLabService> {
    let auth = get_gitlab_auth(&config.forge_url).await?;
    debug!(source = ?auth.source, url = %auth.base_url, "Authenticated");
    GitLabService::new(&auth.forge_config())
}

/// Configured projects covered by release-style commands
fn release_projects(config: &Config) -> Result<Vec<String>> {
    let projects = config.effective_release_projects();
    if projects.is_empty() && config.group.is_none() {
        return Err(Error::Config(
            "no projects configured; set NAGGER_RELEASE_PROJECTS or NAGGER_GROUP".to_string(),
        ));
    }
    Ok(projects)
}

/// Configured projects plus those with merged work in the group milestone
async fn milestone_projects(
    forge: &dyn ForgeService,
    config: &Config,
    milestone: &str,
) -> Result<Vec<String>> {
    let projects = discover_projects(
        forge,
        &config.release_projects,
        &config.ignore_projects,
        config.group.as_deref(),
        milestone,
    )
    .await?;
    if projects.is_empty() {
        return Err(Error::Config(format!(
            "no projects to release for milestone {milestone}"
        )));
    }
    Ok(projects)
}

const fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
