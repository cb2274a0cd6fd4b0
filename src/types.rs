//! Core types for nagger

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Label marking a change as internal-only
pub const INTERNAL_LABEL: &str = "internal";

/// Prefix of the scoped label carrying a raw kind tag (`kind::fix`)
pub const KIND_LABEL_PREFIX: &str = "kind::";

/// A forge project (repository)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    /// Numeric project ID
    pub id: u64,
    /// Full path, e.g. "group/app"
    pub path: String,
    /// Web URL of the project
    pub web_url: String,
    /// Default branch, if the repository has one
    pub default_branch: Option<String>,
}

/// Milestone state as reported by the forge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    /// Open milestone
    Active,
    /// Closed milestone
    Closed,
}

/// A named delivery target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Milestone {
    /// Milestone ID (project or group scoped)
    pub id: u64,
    /// Milestone title, e.g. "v3.15"
    pub title: String,
    /// Free-form description
    pub description: Option<String>,
    /// Start date
    pub start_date: Option<NaiveDate>,
    /// Due date
    pub due_date: Option<NaiveDate>,
    /// Web URL
    pub web_url: Option<String>,
    /// Open or closed
    pub state: MilestoneState,
}

/// Reference from a change to its milestone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MilestoneRef {
    /// Milestone ID
    pub id: u64,
    /// Milestone title
    pub title: String,
}

/// Whether a change shows up in public release notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Exposure {
    /// Visible to the outside
    External,
    /// Internal-only change
    Internal,
}

/// A merge request, merged or open
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Change {
    /// Owning project ID
    pub project_id: u64,
    /// Project-scoped MR number
    pub iid: u64,
    /// MR title
    pub title: String,
    /// Full reference slug, e.g. "group/app!12"
    pub reference: String,
    /// Web URL for the MR
    pub web_url: String,
    /// Author username
    pub author: String,
    /// Labels attached to the MR
    pub labels: Vec<String>,
    /// Raw kind tag, taken from a `kind::` scoped label
    pub kind_tag: Option<String>,
    /// Milestone the MR is attached to
    pub milestone: Option<MilestoneRef>,
    /// When the MR was merged
    pub merged_at: Option<DateTime<Utc>>,
}

impl Change {
    /// Raw tags considered by the classifier: kind tag first, then labels
    pub fn raw_tags(&self) -> impl Iterator<Item = &str> {
        self.kind_tag
            .as_deref()
            .into_iter()
            .chain(self.labels.iter().map(String::as_str))
    }

    /// Exposure derived from the `internal` label
    pub fn exposure(&self) -> Exposure {
        if self
            .labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(INTERNAL_LABEL))
        {
            Exposure::Internal
        } else {
            Exposure::External
        }
    }
}

/// Extract the raw kind tag from a label list (`kind::fix` -> `fix`)
pub fn kind_tag_from_labels(labels: &[String]) -> Option<String> {
    labels
        .iter()
        .find_map(|l| l.strip_prefix(KIND_LABEL_PREFIX))
        .map(ToString::to_string)
}

/// A comment (note) on a merge request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// Comment ID
    pub id: u64,
    /// Comment body text
    pub body: String,
    /// Author username
    pub author: String,
}

/// A project-management issue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueNode {
    /// Project-scoped issue number
    pub id: u64,
    /// Issue title
    pub title: String,
    /// Whether the issue is closed
    pub closed: bool,
    /// Web URL
    pub web_url: String,
    /// Parent issue, if any
    pub parent: Option<u64>,
    /// Related issues
    pub related: Vec<u64>,
}

/// A created tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    /// Tag name
    pub name: String,
    /// Commit the tag points at
    pub commit: String,
}

/// A created release
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Tag the release references
    pub tag_name: String,
    /// Release title
    pub name: String,
    /// Web URL, when the forge reports one
    pub web_url: Option<String>,
}

/// The authenticated forge user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// User ID
    pub id: u64,
    /// Username
    pub username: String,
}
