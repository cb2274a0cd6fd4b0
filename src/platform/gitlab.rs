//! GitLab forge service implementation

use crate::config::ForgeConfig;
use crate::error::{Error, Result};
use crate::platform::{api_v4_url, ForgeService};
use crate::types::{
    kind_tag_from_labels, Change, Comment, IssueNode, Milestone, MilestoneRef, MilestoneState,
    Project, Release, Tag, User,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    api_base: String,
    limiter: Semaphore,
    read_retries: usize,
}

#[derive(Deserialize)]
struct GlProject {
    id: u64,
    path_with_namespace: String,
    web_url: String,
    default_branch: Option<String>,
}

#[derive(Deserialize)]
struct GlUserRef {
    #[serde(default)]
    id: u64,
    username: String,
}

#[derive(Deserialize)]
struct GlReferences {
    full: String,
}

#[derive(Deserialize)]
struct GlMilestoneRef {
    id: u64,
    title: String,
}

#[derive(Deserialize)]
struct GlMergeRequest {
    iid: u64,
    project_id: u64,
    title: String,
    web_url: String,
    #[serde(default)]
    labels: Vec<String>,
    milestone: Option<GlMilestoneRef>,
    merged_at: Option<DateTime<Utc>>,
    references: GlReferences,
    author: GlUserRef,
}

#[derive(Deserialize)]
struct GlNote {
    id: u64,
    body: String,
    system: bool,
    author: GlUserRef,
}

#[derive(Deserialize)]
struct GlMilestone {
    id: u64,
    title: String,
    description: Option<String>,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    web_url: Option<String>,
    state: MilestoneState,
}

#[derive(Deserialize)]
struct GlIssue {
    iid: u64,
    title: String,
    state: String,
    web_url: String,
}

#[derive(Deserialize)]
struct GlIssueLink {
    iid: u64,
    project_id: u64,
    link_type: String,
}

#[derive(Deserialize)]
struct GlCommit {
    id: String,
}

#[derive(Deserialize)]
struct GlTag {
    name: String,
    commit: GlCommit,
}

#[derive(Deserialize, Default)]
struct GlReleaseLinks {
    #[serde(rename = "self")]
    self_url: Option<String>,
}

#[derive(Deserialize)]
struct GlRelease {
    tag_name: String,
    name: String,
    #[serde(rename = "_links", default)]
    links: GlReleaseLinks,
}

#[derive(Serialize)]
struct CreateTagPayload<'a> {
    tag_name: &'a str,
    #[serde(rename = "ref")]
    git_ref: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct CreateReleasePayload<'a> {
    tag_name: &'a str,
    name: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct AssignMilestonePayload {
    milestone_id: u64,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints
const PER_PAGE: &str = "100";

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(config: &ForgeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(concat!("nagger/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            token: config.token.clone(),
            api_base: api_v4_url(&config.base_url),
            limiter: Semaphore::new(config.max_in_flight.max(1)),
            read_retries: config.read_retries,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn project_url(&self, project_id: u64, path: &str) -> String {
        self.api_url(&format!("/projects/{project_id}{path}"))
    }

    fn retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(self.read_retries)
    }

    /// Send a request while holding a slot of the per-host limiter
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| Error::Internal("request limiter closed".to_string()))?;

        let response = request.header("PRIVATE-TOKEN", &self.token).send().await?;
        check_status(response).await
    }

    async fn get_once<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(self.client.get(url).query(query)).await?;
        Ok(response.json().await?)
    }

    /// GET with retries on transient failures
    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        RetryIf::spawn(
            self.retry_strategy(),
            || self.get_once(url, query),
            |e: &Error| {
                let retry = e.is_transient();
                if retry {
                    warn!(%url, error = %e, "Retrying read");
                }
                retry
            },
        )
        .await
    }

    async fn get_page_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        page: &str,
    ) -> Result<(Vec<T>, Option<String>)> {
        let request = self
            .client
            .get(url)
            .query(query)
            .query(&[("per_page", PER_PAGE), ("page", page)]);
        let response = self.send(request).await?;

        let next = response
            .headers()
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string);

        Ok((response.json().await?, next))
    }

    /// GET every page of a list endpoint, following `x-next-page`
    async fn get_paged<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = "1".to_string();

        loop {
            let (mut batch, next) = RetryIf::spawn(
                self.retry_strategy(),
                || self.get_page_once::<T>(url, query, &page),
                |e: &Error| e.is_transient(),
            )
            .await?;
            items.append(&mut batch);

            match next {
                Some(next) if next != page => page = next,
                _ => break,
            }
        }

        debug!(%url, count = items.len(), "Fetched paged listing");
        Ok(items)
    }

    /// Send a write request exactly once
    async fn write<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }

    async fn list_changes(&self, project: &Project, query: &[(&str, &str)]) -> Result<Vec<Change>> {
        let url = self.project_url(project.id, "/merge_requests");
        let mrs: Vec<GlMergeRequest> = self.get_paged(&url, query).await?;
        Ok(mrs.into_iter().map(Change::from).collect())
    }

    async fn issue_relations(
        &self,
        project: &Project,
        iid: u64,
    ) -> Result<(Option<u64>, Vec<u64>)> {
        let url = self.project_url(project.id, &format!("/issues/{iid}/links"));
        let links: Vec<GlIssueLink> = self.get_json(&url, &[]).await?;

        let mut parent = None;
        let mut related = Vec::new();
        for link in links.into_iter().filter(|l| l.project_id == project.id) {
            match link.link_type.as_str() {
                "relates_to" => related.push(link.iid),
                "blocks" if parent.is_none() => parent = Some(link.iid),
                _ => {}
            }
        }

        Ok((parent, related))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let path = response.url().path().to_string();
    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::NOT_FOUND {
        Err(Error::NotFound(path))
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(Error::Transient(format!("{status} from {path}")))
    } else {
        Err(Error::GitLabApi(format!("{status} from {path}: {body}")))
    }
}

impl From<GlProject> for Project {
    fn from(p: GlProject) -> Self {
        Self {
            id: p.id,
            path: p.path_with_namespace,
            web_url: p.web_url,
            default_branch: p.default_branch,
        }
    }
}

impl From<GlMergeRequest> for Change {
    fn from(mr: GlMergeRequest) -> Self {
        Self {
            project_id: mr.project_id,
            iid: mr.iid,
            title: mr.title,
            reference: mr.references.full,
            web_url: mr.web_url,
            author: mr.author.username,
            kind_tag: kind_tag_from_labels(&mr.labels),
            labels: mr.labels,
            milestone: mr.milestone.map(|m| MilestoneRef {
                id: m.id,
                title: m.title,
            }),
            merged_at: mr.merged_at,
        }
    }
}

impl From<GlMilestone> for Milestone {
    fn from(m: GlMilestone) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            start_date: m.start_date,
            due_date: m.due_date,
            web_url: m.web_url,
            state: m.state,
        }
    }
}

impl From<GlNote> for Comment {
    fn from(n: GlNote) -> Self {
        Self {
            id: n.id,
            body: n.body,
            author: n.author.username,
        }
    }
}

#[async_trait]
impl ForgeService for GitLabService {
    async fn current_user(&self) -> Result<User> {
        let user: GlUserRef = self.get_json(&self.api_url("/user"), &[]).await?;
        Ok(User {
            id: user.id,
            username: user.username,
        })
    }

    async fn get_project(&self, path: &str) -> Result<Project> {
        let url = self.api_url(&format!("/projects/{}", urlencoding::encode(path)));
        match self.get_json::<GlProject>(&url, &[]).await {
            Ok(project) => Ok(project.into()),
            Err(Error::NotFound(_)) => Err(Error::ProjectNotFound(path.to_string())),
            Err(e) => Err(e),
        }
    }

    async fn list_open_changes(&self, project: &Project) -> Result<Vec<Change>> {
        self.list_changes(project, &[("state", "opened")]).await
    }

    async fn get_change(&self, project: &Project, iid: u64) -> Result<Change> {
        let url = self.project_url(project.id, &format!("/merge_requests/{iid}"));
        let mr: GlMergeRequest = self.get_json(&url, &[]).await?;
        Ok(mr.into())
    }

    async fn list_merged_changes(
        &self,
        project: &Project,
        milestone: &Milestone,
    ) -> Result<Vec<Change>> {
        self.list_changes(
            project,
            &[("state", "merged"), ("milestone", milestone.title.as_str())],
        )
        .await
    }

    async fn list_group_merged_changes(
        &self,
        group: &str,
        milestone: &str,
    ) -> Result<Vec<Change>> {
        let url = self.api_url(&format!(
            "/groups/{}/merge_requests",
            urlencoding::encode(group)
        ));
        let mrs: Vec<GlMergeRequest> = match self
            .get_paged(&url, &[("state", "merged"), ("milestone", milestone)])
            .await
        {
            Ok(mrs) => mrs,
            Err(Error::NotFound(_)) => {
                return Err(Error::Config(format!("group '{group}' not found")));
            }
            Err(e) => return Err(e),
        };
        Ok(mrs.into_iter().map(Change::from).collect())
    }

    async fn list_unmilestoned_merged_changes(&self, project: &Project) -> Result<Vec<Change>> {
        self.list_changes(
            project,
            &[
                ("state", "merged"),
                ("milestone", "None"),
                ("order_by", "created_at"),
            ],
        )
        .await
    }

    async fn assign_milestone(&self, change: &Change, milestone: &Milestone) -> Result<()> {
        let url = self.project_url(change.project_id, &format!("/merge_requests/{}", change.iid));
        let payload = AssignMilestonePayload {
            milestone_id: milestone.id,
        };
        let _: GlMergeRequest = self.write(self.client.put(&url).json(&payload)).await?;
        Ok(())
    }

    async fn list_comments(&self, change: &Change) -> Result<Vec<Comment>> {
        let url = self.project_url(
            change.project_id,
            &format!("/merge_requests/{}/notes", change.iid),
        );
        let notes: Vec<GlNote> = self.get_paged(&url, &[("sort", "asc")]).await?;

        Ok(notes
            .into_iter()
            .filter(|n| !n.system)
            .map(Comment::from)
            .collect())
    }

    async fn create_comment(&self, change: &Change, body: &str) -> Result<Comment> {
        let url = self.project_url(
            change.project_id,
            &format!("/merge_requests/{}/notes", change.iid),
        );
        let note: GlNote = self
            .write(
                self.client
                    .post(&url)
                    .json(&serde_json::json!({ "body": body })),
            )
            .await?;
        Ok(note.into())
    }

    async fn get_milestone(&self, project: &Project, title: &str) -> Result<Milestone> {
        let url = self.project_url(project.id, "/milestones");
        let milestones: Vec<GlMilestone> = self
            .get_paged(
                &url,
                &[
                    ("title", title),
                    ("state", "active"),
                    ("include_ancestors", "true"),
                ],
            )
            .await?;

        milestones
            .into_iter()
            .find(|m| m.title == title && m.state == MilestoneState::Active)
            .map(Milestone::from)
            .ok_or_else(|| Error::MilestoneNotFound {
                milestone: title.to_string(),
                project: project.path.clone(),
            })
    }

    async fn list_active_milestones(&self, project: &Project) -> Result<Vec<Milestone>> {
        let url = self.project_url(project.id, "/milestones");
        let milestones: Vec<GlMilestone> = self
            .get_paged(&url, &[("state", "active"), ("include_ancestors", "true")])
            .await?;
        Ok(milestones.into_iter().map(Milestone::from).collect())
    }

    async fn list_issues(
        &self,
        project: &Project,
        milestone: &Milestone,
    ) -> Result<Vec<IssueNode>> {
        let url = self.project_url(project.id, "/issues");
        let issues: Vec<GlIssue> = self
            .get_paged(&url, &[("milestone", milestone.title.as_str())])
            .await?;

        let mut nodes = Vec::with_capacity(issues.len());
        for issue in issues {
            let (parent, related) = self.issue_relations(project, issue.iid).await?;
            nodes.push(IssueNode {
                id: issue.iid,
                title: issue.title,
                closed: issue.state == "closed",
                web_url: issue.web_url,
                parent,
                related,
            });
        }

        Ok(nodes)
    }

    async fn create_tag(
        &self,
        project: &Project,
        name: &str,
        git_ref: &str,
        message: &str,
    ) -> Result<Tag> {
        let url = self.project_url(project.id, "/repository/tags");
        let payload = CreateTagPayload {
            tag_name: name,
            git_ref,
            message,
        };
        let tag: GlTag = self.write(self.client.post(&url).json(&payload)).await?;
        Ok(Tag {
            name: tag.name,
            commit: tag.commit.id,
        })
    }

    async fn create_release(
        &self,
        project: &Project,
        tag: &Tag,
        name: &str,
        notes: &str,
    ) -> Result<Release> {
        let url = self.project_url(project.id, "/releases");
        let payload = CreateReleasePayload {
            tag_name: &tag.name,
            name,
            description: notes,
        };
        let release: GlRelease = self.write(self.client.post(&url).json(&payload)).await?;
        Ok(Release {
            tag_name: release.tag_name,
            name: release.name,
            web_url: release.links.self_url,
        })
    }
}
