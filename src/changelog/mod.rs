//! Changelog aggregation and rendering
//!
//! Groups classified changes by kind (and by project for multi-project
//! reports) and renders them into tag messages, release notes and
//! milestone changelogs.

mod aggregate;
mod render;

pub use aggregate::{aggregate, aggregate_project, Grouping, KindGroup, ProjectChangelog};
pub use render::{
    labels_to_md, render, IssueSection, RenderContext, Template, NO_CHANGES, NO_ISSUES,
};
