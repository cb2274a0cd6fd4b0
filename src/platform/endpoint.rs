//! Forge endpoint handling

use crate::error::{Error, Result};

/// Reduce a forge URL to `scheme://host[:port]/`
///
/// Accepts full API URLs (`CI_API_V4_URL`) as well as bare host names
/// (`GITLAB_HOST`), which are assumed to be HTTPS.
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let parsed = url::Url::parse(&with_scheme)
        .map_err(|e| Error::Parse(format!("invalid forge URL '{raw}': {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::Parse(format!("forge URL has no host: {raw}")))?;

    Ok(match parsed.port() {
        Some(port) => format!("{}://{host}:{port}/", parsed.scheme()),
        None => format!("{}://{host}/", parsed.scheme()),
    })
}

/// API v4 root for a normalized base URL
pub fn api_v4_url(base_url: &str) -> String {
    format!("{}/api/v4", base_url.trim_end_matches('/'))
}
