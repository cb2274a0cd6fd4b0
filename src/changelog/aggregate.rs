//! Grouping of changes by kind

use crate::classify::{Kind, Taxonomy};
use crate::types::{Change, Exposure, Project};

/// Changes of one kind, in fetch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindGroup {
    /// Kind shared by every change in the group
    pub kind: Kind,
    /// Changes classified to this kind
    pub changes: Vec<Change>,
}

/// One group per kind, in taxonomy order
///
/// Empty groups are kept so iteration order never depends on the input;
/// renderers skip them via [`Grouping::non_empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    groups: Vec<KindGroup>,
}

impl Grouping {
    /// All groups, including empty ones
    pub fn groups(&self) -> &[KindGroup] {
        &self.groups
    }

    /// Groups that contain at least one change
    pub fn non_empty(&self) -> impl Iterator<Item = &KindGroup> {
        self.groups.iter().filter(|g| !g.changes.is_empty())
    }

    /// Total number of changes
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.changes.len()).sum()
    }

    /// Whether no group has a change
    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.changes.is_empty())
    }

    /// Copy of this grouping keeping only changes with the given exposure
    pub fn with_exposure(&self, exposure: Exposure) -> Self {
        let groups = self
            .groups
            .iter()
            .map(|g| KindGroup {
                kind: g.kind,
                changes: g
                    .changes
                    .iter()
                    .filter(|c| c.exposure() == exposure)
                    .cloned()
                    .collect(),
            })
            .collect();
        Self { groups }
    }
}

/// Group changes by kind in taxonomy order, preserving fetch order per group
pub fn aggregate(changes: &[Change], taxonomy: &Taxonomy) -> Grouping {
    let mut groups: Vec<KindGroup> = taxonomy
        .kinds()
        .iter()
        .map(|&kind| KindGroup {
            kind,
            changes: Vec::new(),
        })
        .collect();

    for change in changes {
        let kind = taxonomy.classify(change);
        if let Some(group) = groups.iter_mut().find(|g| g.kind == kind) {
            group.changes.push(change.clone());
        }
    }

    Grouping { groups }
}

/// Changelog of a single project within a multi-project report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectChangelog {
    /// Project the changes belong to
    pub project: Project,
    /// Changes grouped by kind
    pub grouping: Grouping,
}

/// Aggregate the changes of one project
pub fn aggregate_project(
    project: Project,
    changes: &[Change],
    taxonomy: &Taxonomy,
) -> ProjectChangelog {
    ProjectChangelog {
        project,
        grouping: aggregate(changes, taxonomy),
    }
}
