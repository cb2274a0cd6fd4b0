//! Auth command - test and explain authentication

use crate::cli::style::{check, Stylize};
use anstream::println;
use nagger::auth::get_gitlab_auth;
use nagger::config::Config;
use nagger::error::Result;
use nagger::platform::{ForgeService, GitLabService};

/// Run the auth test command
pub async fn run_auth_test(config: &Config) -> Result<()> {
    println!("Testing GitLab authentication...");
    let auth = get_gitlab_auth(&config.forge_url).await?;
    let forge = GitLabService::new(&auth.forge_config())?;
    let user = forge.current_user().await?;

    println!("{} Authenticated as: {}", check(), user.username.accent());
    println!("Token source: {:?}", auth.source);
    println!("Host: {}", auth.base_url);
    Ok(())
}

/// Run the auth setup command (show instructions)
pub fn run_auth_setup() {
    println!("{}", "GitLab Authentication Setup".emphasis());
    println!("===========================");
    println!();
    println!("Option 1: Environment variable");
    println!("  Set NAGGUS_KEY (or GITLAB_TOKEN / GL_TOKEN) to a token with `api` scope");
    println!();
    println!("Option 2: GitLab CLI (glab)");
    println!("  Install: https://gitlab.com/gitlab-org/cli");
    println!("  Run: glab auth login");
    println!();
    println!("For self-hosted GitLab:");
    println!("  Set GITLAB_HOST to your instance hostname (CI_API_V4_URL in pipelines)");
}

/// Wrapper for auth commands
pub async fn run_auth(config: &Config, setup: bool) -> Result<()> {
    if setup {
        run_auth_setup();
        Ok(())
    } else {
        run_auth_test(config).await
    }
}
