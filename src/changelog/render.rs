//! Report rendering
//!
//! Rendering is a pure function of a [`Template`] and a [`RenderContext`].
//! A template fails only when a field it requires is missing; optional data
//! that is empty simply renders as an omitted section.

use crate::changelog::{Grouping, KindGroup, ProjectChangelog};
use crate::error::{Error, Result};
use crate::issues::{IssueForest, Relation};
use crate::types::{Change, Exposure, Milestone};
use std::fmt::Write;

/// Rendered in place of an empty change set
pub const NO_CHANGES: &str = "No changes.";

/// Rendered in place of an empty issue set
pub const NO_ISSUES: &str = "No issues.";

/// Available report layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Annotated tag message for one project (by kind)
    TagMessage,
    /// Release description for one project (by kind)
    ReleaseNotes,
    /// Public milestone changelog (by project, then kind)
    ExternalChangelog,
    /// Concise internal milestone changelog (by project)
    InternalChangelog,
    /// Issue forest of each project
    IssueReport,
}

impl Template {
    const fn name(self) -> &'static str {
        match self {
            Self::TagMessage => "tag message",
            Self::ReleaseNotes => "release notes",
            Self::ExternalChangelog => "external changelog",
            Self::InternalChangelog => "internal changelog",
            Self::IssueReport => "issue report",
        }
    }
}

/// Issues of one project for [`Template::IssueReport`]
#[derive(Debug, Clone, Copy)]
pub struct IssueSection<'a> {
    /// Project path
    pub project: &'a str,
    /// Issue forest of the milestone
    pub forest: &'a IssueForest,
}

/// Values available to templates
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Tag being created
    pub tag_name: Option<&'a str>,
    /// Release milestone
    pub milestone: Option<&'a Milestone>,
    /// Report title (milestone name for multi-project reports)
    pub title: Option<&'a str>,
    /// Changes of a single project
    pub changes: Option<&'a Grouping>,
    /// Per-project changelogs
    pub projects: &'a [ProjectChangelog],
    /// Per-project issue forests
    pub issues: &'a [IssueSection<'a>],
}

/// Render a template
pub fn render(template: Template, ctx: &RenderContext<'_>) -> Result<String> {
    match template {
        Template::TagMessage => render_tag_message(ctx),
        Template::ReleaseNotes => render_release_notes(ctx),
        Template::ExternalChangelog => render_external_changelog(ctx),
        Template::InternalChangelog => render_internal_changelog(ctx),
        Template::IssueReport => render_issue_report(ctx),
    }
}

fn require<'a, T: ?Sized>(value: Option<&'a T>, template: Template, field: &str) -> Result<&'a T> {
    value.ok_or_else(|| Error::Render(format!("{} requires '{field}'", template.name())))
}

/// Convert labels to GitLab markdown label references
pub fn labels_to_md(labels: &[String]) -> String {
    labels
        .iter()
        .map(|label| {
            if label.contains(char::is_whitespace) {
                format!("~\"{label}\"")
            } else {
                format!("~{label}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_tag_message(ctx: &RenderContext<'_>) -> Result<String> {
    let tag_name = require(ctx.tag_name, Template::TagMessage, "tag_name")?;
    let changes = require(ctx.changes, Template::TagMessage, "changes")?;

    let mut out = format!("{tag_name}\n\n");
    if changes.is_empty() {
        let _ = writeln!(out, "{NO_CHANGES}");
        return Ok(out);
    }

    for group in changes.non_empty() {
        let _ = writeln!(out, "{}:", group.kind);
        for change in &group.changes {
            let _ = writeln!(out, "- {} ({})", change.title, change.reference);
        }
        out.push('\n');
    }

    Ok(out.trim_end().to_string() + "\n")
}

fn render_release_notes(ctx: &RenderContext<'_>) -> Result<String> {
    let tag_name = require(ctx.tag_name, Template::ReleaseNotes, "tag_name")?;
    let milestone = require(ctx.milestone, Template::ReleaseNotes, "milestone")?;
    let changes = require(ctx.changes, Template::ReleaseNotes, "changes")?;

    let mut out = format!("## {tag_name}\n\n");
    match &milestone.web_url {
        Some(url) => {
            let _ = writeln!(out, "Milestone: [{}]({url})\n", milestone.title);
        }
        None => {
            let _ = writeln!(out, "Milestone: {}\n", milestone.title);
        }
    }
    if let Some(description) = milestone.description.as_deref().map(str::trim) {
        if !description.is_empty() {
            let _ = writeln!(out, "{description}\n");
        }
    }

    write_kind_sections(&mut out, changes, "###", true);
    Ok(out)
}

fn render_external_changelog(ctx: &RenderContext<'_>) -> Result<String> {
    let title = require(ctx.title, Template::ExternalChangelog, "title")?;

    let mut out = format!("# Release notes for {title}\n\n");
    let mut wrote_any = false;

    for project in ctx.projects {
        let external = project.grouping.with_exposure(Exposure::External);
        if external.is_empty() {
            continue;
        }
        wrote_any = true;
        let _ = writeln!(out, "## {}\n", project.project.path);
        write_kind_sections(&mut out, &external, "###", false);
    }

    if !wrote_any {
        let _ = writeln!(out, "{NO_CHANGES}");
    }
    Ok(out)
}

fn render_internal_changelog(ctx: &RenderContext<'_>) -> Result<String> {
    let title = require(ctx.title, Template::InternalChangelog, "title")?;

    let mut out = format!("# Internal changes for {title}\n\n");
    let mut wrote_any = false;

    for project in ctx.projects {
        if project.grouping.is_empty() {
            continue;
        }
        wrote_any = true;
        let _ = writeln!(out, "## {}\n", project.project.path);
        for group in project.grouping.non_empty() {
            for change in &group.changes {
                let _ = writeln!(
                    out,
                    "- [{}] {} {}",
                    group.kind,
                    change.title,
                    change.reference
                );
            }
        }
        out.push('\n');
    }

    if !wrote_any {
        let _ = writeln!(out, "{NO_CHANGES}");
    }
    Ok(out)
}

fn render_issue_report(ctx: &RenderContext<'_>) -> Result<String> {
    let title = require(ctx.title, Template::IssueReport, "title")?;

    let mut out = format!("# Issues for {title}\n\n");
    if ctx.issues.is_empty() {
        let _ = writeln!(out, "{NO_ISSUES}");
        return Ok(out);
    }

    for section in ctx.issues {
        let _ = writeln!(out, "## {}\n", section.project);
        if section.forest.is_empty() {
            let _ = writeln!(out, "{NO_ISSUES}\n");
            continue;
        }
        for entry in section.forest.walk() {
            let indent = "  ".repeat(entry.depth);
            let check = if entry.node.closed { "x" } else { " " };
            let related = if entry.relation == Relation::Related {
                " (related)"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "{indent}- [{check}] [#{}]({}) {}{related}",
                entry.node.id, entry.node.web_url, entry.node.title
            );
        }
        out.push('\n');
    }

    Ok(out)
}

/// Kind sections; empty kinds get no header
fn write_kind_sections(out: &mut String, grouping: &Grouping, level: &str, with_labels: bool) {
    if grouping.is_empty() {
        let _ = writeln!(out, "{NO_CHANGES}");
        return;
    }

    for group in grouping.non_empty() {
        write_kind_group(out, group, level, with_labels);
    }
}

fn write_kind_group(out: &mut String, group: &KindGroup, level: &str, with_labels: bool) {
    let _ = writeln!(out, "{level} {}\n", group.kind);
    for change in &group.changes {
        let _ = writeln!(out, "{}", change_line(change, with_labels));
    }
    out.push('\n');
}

fn change_line(change: &Change, with_labels: bool) -> String {
    let mut line = format!("- {} ([{}]({}))", change.title, change.reference, change.web_url);
    if with_labels && !change.labels.is_empty() {
        let _ = write!(line, " {}", labels_to_md(&change.labels));
    }
    line
}
