//! Release project discovery
//!
//! Besides the configured projects, any project with merged work in the
//! group milestone takes part in a release, so nothing merged under the
//! milestone is left out of the notes.

use crate::error::Result;
use crate::platform::ForgeService;
use std::collections::HashSet;
use tracing::debug;

/// Configured projects, then projects found through the group milestone
///
/// Configured projects keep their order. Discovered ones follow in the order
/// their first merged merge request was listed. Ignored projects are removed
/// last, so an ignored project is skipped however it was found. Without a
/// group only the configured projects are used.
pub async fn discover_projects(
    forge: &dyn ForgeService,
    configured: &[String],
    ignored: &[String],
    group: Option<&str>,
    milestone: &str,
) -> Result<Vec<String>> {
    let mut projects = configured.to_vec();

    if let Some(group) = group {
        let changes = forge.list_group_merged_changes(group, milestone).await?;
        let mut seen = HashSet::new();

        for change in changes {
            if !seen.insert(change.project_id) {
                continue;
            }
            let id = change.project_id.to_string();
            let project = forge.get_project(&id).await?;
            if projects.iter().any(|p| *p == project.path || *p == id) {
                continue;
            }
            debug!(project = %project.path, %milestone, "Discovered project");
            projects.push(project.path);
        }
    }

    projects.retain(|p| !ignored.contains(p));
    Ok(projects)
}
