//! Version-like milestone names

use crate::error::{Error, Result};
use crate::platform::ForgeService;
use crate::types::{Milestone, MilestoneState, Project};

/// Whether a name looks like a version number
///
/// An optional leading `v`/`V` followed by digits and dots only, with at
/// least one digit: `v1.23.2`, `V123`, `12.33`.
pub fn is_version(name: &str) -> bool {
    let rest = name
        .strip_prefix('v')
        .or_else(|| name.strip_prefix('V'))
        .unwrap_or(name);

    rest.chars().any(|c| c.is_ascii_digit()) && rest.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Milestone name for a full release tag (`v3.15.0` -> `v3.15`)
pub fn milestone_from_tag(tag_name: &str) -> Result<String> {
    if tag_name.matches('.').count() < 2 {
        return Err(Error::Parse(format!(
            "tag should be a full version, e.g. v3.14.0 (got '{tag_name}')"
        )));
    }

    tag_name
        .rsplit_once('.')
        .map(|(milestone, _)| milestone.to_string())
        .ok_or_else(|| Error::Internal(format!("tag without dot: {tag_name}")))
}

/// Active milestones of a project whose title looks like a version
pub async fn release_milestones(
    forge: &dyn ForgeService,
    project: &Project,
) -> Result<Vec<Milestone>> {
    let milestones = forge.list_active_milestones(project).await?;
    Ok(milestones
        .into_iter()
        .filter(|m| m.state == MilestoneState::Active && is_version(&m.title))
        .collect())
}
