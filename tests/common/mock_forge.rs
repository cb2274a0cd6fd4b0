//! Mock forge service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use nagger::error::{Error, Result};
use nagger::platform::ForgeService;
use nagger::types::{Change, Comment, IssueNode, Milestone, Project, Release, Tag, User};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// A write performed against the mock, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    /// `create_comment`
    Comment { reference: String, body: String },
    /// `assign_milestone`
    AssignMilestone { reference: String, milestone: String },
    /// `create_tag`
    CreateTag {
        project: String,
        name: String,
        git_ref: String,
        message: String,
    },
    /// `create_release`
    CreateRelease {
        project: String,
        tag: String,
        notes: String,
    },
}

/// In-memory forge
///
/// Manually implements `ForgeService` with call tracking and error
/// injection. Comments created through the mock are visible to later
/// `list_comments` calls, so repeated runs observe earlier writes.
pub struct MockForge {
    next_id: AtomicU64,
    projects: Mutex<HashMap<String, Project>>,
    milestones: Mutex<HashMap<u64, Vec<Milestone>>>,
    open_changes: Mutex<HashMap<u64, Vec<Change>>>,
    merged_changes: Mutex<HashMap<(u64, u64), Vec<Change>>>,
    unmilestoned: Mutex<HashMap<u64, Vec<Change>>>,
    group_merged: Mutex<HashMap<(String, String), Vec<Change>>>,
    comments: Mutex<HashMap<(u64, u64), Vec<Comment>>>,
    issues: Mutex<HashMap<(u64, u64), Vec<IssueNode>>>,
    // Call tracking
    writes: Mutex<Vec<WriteCall>>,
    list_comments_calls: Mutex<Vec<String>>,
    // Error injection
    fail_tag_for: Mutex<HashSet<String>>,
    fail_release_for: Mutex<HashSet<String>>,
    fail_comment: Mutex<Option<String>>,
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

impl MockForge {
    /// Create an empty mock forge
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            projects: Mutex::new(HashMap::new()),
            milestones: Mutex::new(HashMap::new()),
            open_changes: Mutex::new(HashMap::new()),
            merged_changes: Mutex::new(HashMap::new()),
            unmilestoned: Mutex::new(HashMap::new()),
            group_merged: Mutex::new(HashMap::new()),
            comments: Mutex::new(HashMap::new()),
            issues: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            list_comments_calls: Mutex::new(Vec::new()),
            fail_tag_for: Mutex::new(HashSet::new()),
            fail_release_for: Mutex::new(HashSet::new()),
            fail_comment: Mutex::new(None),
        }
    }

    // === Setup methods ===

    /// Register a project
    pub fn add_project(&self, project: &Project) {
        self.projects
            .lock()
            .unwrap()
            .insert(project.path.clone(), project.clone());
    }

    /// Register a milestone visible to a project
    pub fn add_milestone(&self, project: &Project, milestone: &Milestone) {
        self.milestones
            .lock()
            .unwrap()
            .entry(project.id)
            .or_default()
            .push(milestone.clone());
    }

    /// Set the merged changes of a project's milestone
    pub fn set_merged(&self, project: &Project, milestone: &Milestone, changes: Vec<Change>) {
        self.merged_changes
            .lock()
            .unwrap()
            .insert((project.id, milestone.id), changes);
    }

    /// Set the open changes of a project
    pub fn set_open(&self, project: &Project, changes: Vec<Change>) {
        self.open_changes.lock().unwrap().insert(project.id, changes);
    }

    /// Set the merged changes without milestone of a project
    pub fn set_unmilestoned(&self, project: &Project, changes: Vec<Change>) {
        self.unmilestoned.lock().unwrap().insert(project.id, changes);
    }

    /// Set the merged changes of a group milestone
    pub fn set_group_merged(&self, group: &str, milestone: &str, changes: Vec<Change>) {
        self.group_merged
            .lock()
            .unwrap()
            .insert((group.to_string(), milestone.to_string()), changes);
    }

    /// Set the existing comments of a change
    pub fn set_comments(&self, change: &Change, comments: Vec<Comment>) {
        self.comments
            .lock()
            .unwrap()
            .insert((change.project_id, change.iid), comments);
    }

    /// Set the issues of a project's milestone
    pub fn set_issues(&self, project: &Project, milestone: &Milestone, issues: Vec<IssueNode>) {
        self.issues
            .lock()
            .unwrap()
            .insert((project.id, milestone.id), issues);
    }

    // === Error injection methods ===

    /// Make `create_tag` fail for a project
    pub fn fail_tag_for(&self, path: &str) {
        self.fail_tag_for.lock().unwrap().insert(path.to_string());
    }

    /// Make `create_release` fail for a project
    pub fn fail_release_for(&self, path: &str) {
        self.fail_release_for.lock().unwrap().insert(path.to_string());
    }

    /// Make `create_comment` fail
    pub fn fail_comment(&self, msg: &str) {
        *self.fail_comment.lock().unwrap() = Some(msg.to_string());
    }

    // === Call verification methods ===

    /// All writes in call order
    pub fn writes(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    /// Comments posted through the mock
    pub fn posted_comments(&self) -> Vec<(String, String)> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                WriteCall::Comment { reference, body } => Some((reference, body)),
                _ => None,
            })
            .collect()
    }

    /// Writes that touched a project (tags and releases)
    pub fn project_writes(&self, path: &str) -> Vec<WriteCall> {
        self.writes()
            .into_iter()
            .filter(|w| match w {
                WriteCall::CreateTag { project, .. } | WriteCall::CreateRelease { project, .. } => {
                    project == path
                }
                _ => false,
            })
            .collect()
    }

    /// References passed to `list_comments`
    pub fn list_comments_calls(&self) -> Vec<String> {
        self.list_comments_calls.lock().unwrap().clone()
    }

    fn record(&self, call: WriteCall) {
        self.writes.lock().unwrap().push(call);
    }

    fn project_path(&self, id: u64) -> String {
        self.projects
            .lock()
            .unwrap()
            .values()
            .find(|p| p.id == id)
            .map(|p| p.path.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ForgeService for MockForge {
    async fn current_user(&self) -> Result<User> {
        Ok(User {
            id: 1,
            username: "nagger-bot".to_string(),
        })
    }

    async fn get_project(&self, path: &str) -> Result<Project> {
        self.projects
            .lock()
            .unwrap()
            .values()
            .find(|p| p.path == path || p.id.to_string() == path)
            .cloned()
            .ok_or_else(|| Error::ProjectNotFound(path.to_string()))
    }

    async fn list_open_changes(&self, project: &Project) -> Result<Vec<Change>> {
        Ok(self
            .open_changes
            .lock()
            .unwrap()
            .get(&project.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_change(&self, project: &Project, iid: u64) -> Result<Change> {
        self.open_changes
            .lock()
            .unwrap()
            .get(&project.id)
            .and_then(|changes| changes.iter().find(|c| c.iid == iid).cloned())
            .ok_or_else(|| Error::NotFound(format!("{}!{iid}", project.path)))
    }

    async fn list_merged_changes(
        &self,
        project: &Project,
        milestone: &Milestone,
    ) -> Result<Vec<Change>> {
        Ok(self
            .merged_changes
            .lock()
            .unwrap()
            .get(&(project.id, milestone.id))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_group_merged_changes(
        &self,
        group: &str,
        milestone: &str,
    ) -> Result<Vec<Change>> {
        Ok(self
            .group_merged
            .lock()
            .unwrap()
            .get(&(group.to_string(), milestone.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_unmilestoned_merged_changes(&self, project: &Project) -> Result<Vec<Change>> {
        Ok(self
            .unmilestoned
            .lock()
            .unwrap()
            .get(&project.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn assign_milestone(&self, change: &Change, milestone: &Milestone) -> Result<()> {
        self.record(WriteCall::AssignMilestone {
            reference: change.reference.clone(),
            milestone: milestone.title.clone(),
        });
        Ok(())
    }

    async fn list_comments(&self, change: &Change) -> Result<Vec<Comment>> {
        self.list_comments_calls
            .lock()
            .unwrap()
            .push(change.reference.clone());

        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(&(change.project_id, change.iid))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(&self, change: &Change, body: &str) -> Result<Comment> {
        if let Some(msg) = self.fail_comment.lock().unwrap().as_ref() {
            return Err(Error::Transient(msg.clone()));
        }

        self.record(WriteCall::Comment {
            reference: change.reference.clone(),
            body: body.to_string(),
        });

        let comment = Comment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            body: body.to_string(),
            author: "nagger-bot".to_string(),
        };
        self.comments
            .lock()
            .unwrap()
            .entry((change.project_id, change.iid))
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    async fn get_milestone(&self, project: &Project, title: &str) -> Result<Milestone> {
        self.milestones
            .lock()
            .unwrap()
            .get(&project.id)
            .and_then(|ms| ms.iter().find(|m| m.title == title).cloned())
            .ok_or_else(|| Error::MilestoneNotFound {
                milestone: title.to_string(),
                project: project.path.clone(),
            })
    }

    async fn list_active_milestones(&self, project: &Project) -> Result<Vec<Milestone>> {
        Ok(self
            .milestones
            .lock()
            .unwrap()
            .get(&project.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_issues(
        &self,
        project: &Project,
        milestone: &Milestone,
    ) -> Result<Vec<IssueNode>> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .get(&(project.id, milestone.id))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_tag(
        &self,
        project: &Project,
        name: &str,
        git_ref: &str,
        message: &str,
    ) -> Result<Tag> {
        if self.fail_tag_for.lock().unwrap().contains(&project.path) {
            return Err(Error::GitLabApi(format!("tag {name} already exists")));
        }

        self.record(WriteCall::CreateTag {
            project: project.path.clone(),
            name: name.to_string(),
            git_ref: git_ref.to_string(),
            message: message.to_string(),
        });
        Ok(Tag {
            name: name.to_string(),
            commit: format!("{:040x}", project.id),
        })
    }

    async fn create_release(
        &self,
        project: &Project,
        tag: &Tag,
        name: &str,
        notes: &str,
    ) -> Result<Release> {
        if self.fail_release_for.lock().unwrap().contains(&project.path) {
            return Err(Error::GitLabApi("release failed".to_string()));
        }

        self.record(WriteCall::CreateRelease {
            project: self.project_path(project.id),
            tag: tag.name.clone(),
            notes: notes.to_string(),
        });
        Ok(Release {
            tag_name: tag.name.clone(),
            name: name.to_string(),
            web_url: Some(format!("{}/-/releases/{}", project.web_url, tag.name)),
        })
    }
}
