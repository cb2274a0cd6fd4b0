//! nagger - GitLab milestone and release automation
//!
//! Keeps merge requests attached to milestones and turns milestones into
//! tags, releases and changelogs across many projects.
//!
//! - [`nag`]: remind authors of merge requests without a milestone
//! - [`release`]: tag and release projects, build milestone reports
//! - [`changelog`]: group changes by kind and render reports
//! - [`issues`]: order a milestone's issues into a forest
//! - [`platform`]: the forge interface and its GitLab implementation

pub mod auth;
pub mod changelog;
pub mod classify;
pub mod config;
pub mod error;
pub mod issues;
pub mod nag;
pub mod platform;
pub mod release;
pub mod types;
