//! Forge services
//!
//! Provides the interface the nagging and release engines use to read and
//! write project-management data. Pagination, authentication, retries and
//! rate limiting all live behind this trait.

mod endpoint;
mod gitlab;

pub use endpoint::{api_v4_url, normalize_base_url};
pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{Change, Comment, IssueNode, Milestone, Project, Release, Tag, User};
use async_trait::async_trait;

/// Forge service trait for merge request, milestone and release operations
///
/// Read methods may be retried by implementations; write methods must not be,
/// since the forge does not guarantee idempotency for them.
#[async_trait]
pub trait ForgeService: Send + Sync {
    /// The user the token belongs to
    async fn current_user(&self) -> Result<User>;

    /// Look up a project by path ("group/app") or numeric ID
    async fn get_project(&self, path: &str) -> Result<Project>;

    /// All open merge requests of a project
    async fn list_open_changes(&self, project: &Project) -> Result<Vec<Change>>;

    /// A single merge request by IID
    async fn get_change(&self, project: &Project, iid: u64) -> Result<Change>;

    /// Merged merge requests attached to a milestone
    async fn list_merged_changes(
        &self,
        project: &Project,
        milestone: &Milestone,
    ) -> Result<Vec<Change>>;

    /// Merged merge requests of a group milestone, across the group's projects
    async fn list_group_merged_changes(
        &self,
        group: &str,
        milestone: &str,
    ) -> Result<Vec<Change>>;

    /// Merged merge requests without any milestone
    async fn list_unmilestoned_merged_changes(&self, project: &Project) -> Result<Vec<Change>>;

    /// Attach a merge request to a milestone
    async fn assign_milestone(&self, change: &Change, milestone: &Milestone) -> Result<()>;

    /// Complete (fully paginated) list of user comments on a merge request
    async fn list_comments(&self, change: &Change) -> Result<Vec<Comment>>;

    /// Post a comment on a merge request
    async fn create_comment(&self, change: &Change, body: &str) -> Result<Comment>;

    /// The active milestone with exactly this title
    async fn get_milestone(&self, project: &Project, title: &str) -> Result<Milestone>;

    /// Active milestones visible to a project (including group milestones)
    async fn list_active_milestones(&self, project: &Project) -> Result<Vec<Milestone>>;

    /// Issues of a milestone, flat, with parent/related identifiers
    async fn list_issues(&self, project: &Project, milestone: &Milestone) -> Result<Vec<IssueNode>>;

    /// Create an annotated tag
    async fn create_tag(
        &self,
        project: &Project,
        name: &str,
        git_ref: &str,
        message: &str,
    ) -> Result<Tag>;

    /// Create a release for an existing tag
    async fn create_release(
        &self,
        project: &Project,
        tag: &Tag,
        name: &str,
        notes: &str,
    ) -> Result<Release>;
}
