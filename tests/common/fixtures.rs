//! Test data factories for nagger types
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use nagger::types::{Change, Comment, IssueNode, Milestone, MilestoneRef, MilestoneState, Project};

/// Create a project with a `main` default branch
pub fn make_project(id: u64, path: &str) -> Project {
    Project {
        id,
        path: path.to_string(),
        web_url: format!("https://gitlab.example.com/{path}"),
        default_branch: Some("main".to_string()),
    }
}

/// Create an active milestone without dates
pub fn make_milestone(id: u64, title: &str) -> Milestone {
    Milestone {
        id,
        title: title.to_string(),
        description: None,
        start_date: None,
        due_date: None,
        web_url: Some(format!("https://gitlab.example.com/-/milestones/{id}")),
        state: MilestoneState::Active,
    }
}

/// Create an active milestone with a date window
pub fn make_milestone_with_window(
    id: u64,
    title: &str,
    start: (i32, u32, u32),
    due: (i32, u32, u32),
) -> Milestone {
    Milestone {
        start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2),
        due_date: NaiveDate::from_ymd_opt(due.0, due.1, due.2),
        ..make_milestone(id, title)
    }
}

/// Create a merged change of a project
pub fn make_change(project: &Project, iid: u64, title: &str, labels: &[&str]) -> Change {
    Change {
        project_id: project.id,
        iid,
        title: title.to_string(),
        reference: format!("{}!{iid}", project.path),
        web_url: format!("{}/-/merge_requests/{iid}", project.web_url),
        author: "alice".to_string(),
        labels: labels.iter().map(ToString::to_string).collect(),
        kind_tag: None,
        milestone: None,
        merged_at: None,
    }
}

/// Attach a change to a milestone
pub fn with_milestone(change: Change, milestone: &Milestone) -> Change {
    Change {
        milestone: Some(MilestoneRef {
            id: milestone.id,
            title: milestone.title.clone(),
        }),
        ..change
    }
}

/// Set the merge time of a change
pub fn merged_at(change: Change, at: DateTime<Utc>) -> Change {
    Change {
        merged_at: Some(at),
        ..change
    }
}

/// UTC timestamp helper
pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// Create a plain user comment
pub fn make_comment(id: u64, body: &str) -> Comment {
    Comment {
        id,
        body: body.to_string(),
        author: "bob".to_string(),
    }
}

/// Create an issue
pub fn make_issue(id: u64, parent: Option<u64>, related: &[u64]) -> IssueNode {
    IssueNode {
        id,
        title: format!("Issue {id}"),
        closed: false,
        web_url: format!("https://gitlab.example.com/group/app/-/issues/{id}"),
        parent,
        related: related.to_vec(),
    }
}
