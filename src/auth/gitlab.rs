//! GitLab authentication

use crate::auth::AuthSource;
use crate::config::ForgeConfig;
use crate::error::{Error, Result};
use std::env;
use tokio::process::Command;

/// Token variables, in priority order
const TOKEN_VARS: [&str; 3] = ["NAGGUS_KEY", "GITLAB_TOKEN", "GL_TOKEN"];

/// GitLab authentication configuration
#[derive(Debug, Clone)]
pub struct GitLabAuthConfig {
    /// Authentication token
    pub token: String,
    /// Where the token was obtained from
    pub source: AuthSource,
    /// Forge base URL (scheme + host)
    pub base_url: String,
}

impl GitLabAuthConfig {
    /// Forge client settings for this token
    pub fn forge_config(&self) -> ForgeConfig {
        ForgeConfig::new(self.base_url.clone(), self.token.clone())
    }
}

/// Find a token through a key lookup
pub fn token_from_lookup<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN_VARS
        .iter()
        .filter_map(|&key| lookup(key))
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
}

/// Get GitLab authentication
///
/// Priority:
/// 1. `NAGGUS_KEY` environment variable
/// 2. `GITLAB_TOKEN` / `GL_TOKEN` environment variables
/// 3. glab CLI (`glab auth token`)
pub async fn get_gitlab_auth(base_url: &str) -> Result<GitLabAuthConfig> {
    if let Some(token) = token_from_lookup(|key| env::var(key).ok()) {
        return Ok(GitLabAuthConfig {
            token,
            source: AuthSource::EnvVar,
            base_url: base_url.to_string(),
        });
    }

    let host = url::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_else(|| "gitlab.com".to_string());

    if let Some(token) = get_glab_cli_token(&host).await {
        return Ok(GitLabAuthConfig {
            token,
            source: AuthSource::Cli,
            base_url: base_url.to_string(),
        });
    }

    Err(Error::Auth(
        "We expect NAGGUS_KEY environment variable to contain an API key \
         (GITLAB_TOKEN, GL_TOKEN or `glab auth login` also work)"
            .to_string(),
    ))
}

async fn get_glab_cli_token(host: &str) -> Option<String> {
    // Check glab is available
    Command::new("glab")
        .arg("--version")
        .output()
        .await
        .ok()?;

    // Check authenticated
    let status = Command::new("glab")
        .args(["auth", "status", "--hostname", host])
        .output()
        .await
        .ok()?;

    if !status.status.success() {
        return None;
    }

    // Get token
    let output = Command::new("glab")
        .args(["auth", "token", "--hostname", host])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
