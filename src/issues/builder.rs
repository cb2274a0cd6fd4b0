//! Issue forest builder
//!
//! Builds an [`IssueForest`] from a flat issue listing. Parent and related
//! references come straight from the forge and may form cycles, so every
//! walk over them is bounded by an ancestor check or a visited set.

use crate::types::{IssueNode, Milestone};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// How a node was reached during a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Top-level node
    Root,
    /// Reached through a parent/child edge
    Child,
    /// Reached through a related-issue link
    Related,
}

/// One node emitted by [`IssueForest::walk`]
#[derive(Debug, Clone, Copy)]
pub struct WalkEntry<'a> {
    /// Nesting depth (roots are 0)
    pub depth: usize,
    /// Edge that led to this node
    pub relation: Relation,
    /// The issue itself
    pub node: &'a IssueNode,
}

/// Immutable forest of issues for one milestone
#[derive(Debug, Clone)]
pub struct IssueForest {
    milestone: Milestone,
    nodes: Vec<IssueNode>,
    index: HashMap<u64, usize>,
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
}

/// Build the issue forest of a milestone
///
/// Roots keep the order of the listing; children keep discovery order.
/// Duplicate identifiers keep their first occurrence.
pub fn build_issue_forest(milestone: &Milestone, issues: Vec<IssueNode>) -> IssueForest {
    let mut nodes: Vec<IssueNode> = Vec::with_capacity(issues.len());
    let mut index: HashMap<u64, usize> = HashMap::new();

    for issue in issues {
        if index.contains_key(&issue.id) {
            debug!("Skipping duplicate issue #{}", issue.id);
            continue;
        }
        index.insert(issue.id, nodes.len());
        nodes.push(issue);
    }

    let mut parent_of: HashMap<usize, usize> = HashMap::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for (idx, node) in nodes.iter().enumerate() {
        let Some(parent_id) = node.parent else {
            continue;
        };
        let Some(&parent_idx) = index.get(&parent_id) else {
            debug!("Parent #{parent_id} of #{} not in milestone", node.id);
            continue;
        };

        // Attaching under one of our own descendants (or ourselves) would close a loop
        if build_path_to_root(parent_idx, &parent_of).contains(&idx) {
            debug!("Parent cycle at #{} -> #{parent_id}, keeping as root", node.id);
            continue;
        }

        parent_of.insert(idx, parent_idx);
        children[parent_idx].push(idx);
    }

    let roots = (0..nodes.len())
        .filter(|idx| !parent_of.contains_key(idx))
        .collect();

    IssueForest {
        milestone: milestone.clone(),
        nodes,
        index,
        roots,
        children,
    }
}

/// Path from a node up to its root, following attached edges only
fn build_path_to_root(start: usize, parent_of: &HashMap<usize, usize>) -> Vec<usize> {
    let mut path = vec![start];
    let mut current = start;

    while let Some(&parent) = parent_of.get(&current) {
        path.push(parent);
        current = parent;
    }

    path
}

impl IssueForest {
    /// Milestone the forest was built for
    pub const fn milestone(&self) -> &Milestone {
        &self.milestone
    }

    /// Number of distinct issues
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest has no issues
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up an issue by identifier
    pub fn get(&self, id: u64) -> Option<&IssueNode> {
        self.index.get(&id).map(|&idx| &self.nodes[idx])
    }

    /// Root issues in listing order
    pub fn roots(&self) -> impl Iterator<Item = &IssueNode> {
        self.roots.iter().map(|&idx| &self.nodes[idx])
    }

    /// Direct children of an issue in discovery order
    pub fn children(&self, id: u64) -> impl Iterator<Item = &IssueNode> {
        self.index
            .get(&id)
            .into_iter()
            .flat_map(|&idx| self.children[idx].iter())
            .map(|&idx| &self.nodes[idx])
    }

    /// Depth-first walk over child and related edges
    ///
    /// Each issue is emitted at most once per walk. The walk is lazy and can
    /// be restarted by calling this again.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            forest: self,
            roots: self.roots.iter(),
            stack: Vec::new(),
            visited: HashSet::new(),
        }
    }
}

/// Lazy depth-first iterator returned by [`IssueForest::walk`]
#[derive(Debug)]
pub struct Walk<'a> {
    forest: &'a IssueForest,
    roots: std::slice::Iter<'a, usize>,
    stack: Vec<(usize, usize, Relation)>,
    visited: HashSet<usize>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = WalkEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, depth, relation) = match self.stack.pop() {
                Some(frame) => frame,
                None => (*self.roots.next()?, 0, Relation::Root),
            };

            if !self.visited.insert(idx) {
                continue;
            }

            let forest = self.forest;
            let node = &forest.nodes[idx];

            // Pushed in reverse so children pop before related, both in order
            for related_id in node.related.iter().rev() {
                if let Some(&related_idx) = forest.index.get(related_id) {
                    self.stack.push((related_idx, depth + 1, Relation::Related));
                }
            }
            for &child_idx in forest.children[idx].iter().rev() {
                self.stack.push((child_idx, depth + 1, Relation::Child));
            }

            return Some(WalkEntry {
                depth,
                relation,
                node,
            });
        }
    }
}
