//! Release progress with one spinner per project

use crate::cli::style::{check, cross, hyperlink_url, spinner_style, Stream, Stylize};
use async_trait::async_trait;
use indicatif::{MultiProgress, ProgressBar};
use nagger::error::Error;
use nagger::release::{ReleaseProgress, Step};
use nagger::types::{Release, Tag};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress callback
///
/// Project pipelines run concurrently, so every project gets its own spinner
/// line; finished lines stay on screen with their result.
pub struct CliProgress {
    bars: MultiProgress,
    projects: Mutex<HashMap<String, ProgressBar>>,
}

impl CliProgress {
    /// Create progress output on stderr
    pub fn new() -> Self {
        Self {
            bars: MultiProgress::new(),
            projects: Mutex::new(HashMap::new()),
        }
    }

    fn with_bar(&self, project: &str, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut projects) = self.projects.lock() else {
            return;
        };
        let bar = projects.entry(project.to_string()).or_insert_with(|| {
            let bar = self
                .bars
                .add(ProgressBar::new_spinner().with_style(spinner_style()));
            bar.set_prefix(project.to_string());
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        f(bar);
    }

    /// Clear spinners of projects that are still ticking (dry run)
    pub fn finish(&self) {
        if let Ok(projects) = self.projects.lock() {
            for bar in projects.values().filter(|bar| !bar.is_finished()) {
                bar.finish_and_clear();
            }
        }
    }
}

#[async_trait]
impl ReleaseProgress for CliProgress {
    async fn on_project_started(&self, project: &str) {
        self.with_bar(project, |bar| bar.set_message("starting"));
    }

    async fn on_step(&self, project: &str, step: Step) {
        self.with_bar(project, |bar| bar.set_message(format!("{step}...")));
    }

    async fn on_tag_created(&self, project: &str, tag: &Tag) {
        let short = &tag.commit[..8.min(tag.commit.len())];
        self.with_bar(project, |bar| {
            bar.set_message(format!("tagged {} at {}", tag.name, short));
        });
    }

    async fn on_release_created(&self, project: &str, release: &Release) {
        let link = release
            .web_url
            .as_deref()
            .map(|url| hyperlink_url(Stream::Stderr, url))
            .unwrap_or_default();
        self.with_bar(project, |bar| {
            bar.finish_with_message(format!(
                "{} released {} {}",
                check(),
                release.name.accent(),
                link
            ));
        });
    }

    async fn on_project_failed(&self, project: &str, step: Step, error: &Error) {
        self.with_bar(project, |bar| {
            bar.abandon_with_message(format!(
                "{} {} failed: {}",
                cross(),
                step,
                error.to_string().error()
            ));
        });
    }

    async fn on_message(&self, message: &str) {
        let _ = self.bars.println(message.muted().to_string());
    }
}
