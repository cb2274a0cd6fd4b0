//! Issue tree building
//!
//! Assembles the flat issue listing of a milestone into an immutable forest
//! that can be walked any number of times.

mod builder;

pub use builder::{build_issue_forest, IssueForest, Relation, Walk, WalkEntry};
