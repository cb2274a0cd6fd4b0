//! Change classification
//!
//! Maps the raw labels of a [`Change`] onto a fixed, ordered taxonomy of
//! [`Kind`]s using a data-driven rule table. The first matching rule wins.

use crate::error::{Error, Result};
use crate::types::Change;
use regex::Regex;
use std::fmt;

/// What kind of changelog item a change is
///
/// Declaration order is the canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// New functionality
    Feature,
    /// Bug fix
    Fix,
    /// Documentation
    Docs,
    /// Anything unclassified (always rendered last)
    Other,
}

impl Kind {
    /// All kinds in taxonomy order
    pub const ALL: [Self; 4] = [Self::Feature, Self::Fix, Self::Docs, Self::Other];

    /// Position in the taxonomy
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Section header used in rendered notes
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Feature => "New features",
            Self::Fix => "Bug fixes",
            Self::Docs => "Documentation",
            Self::Other => "Misc changes",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_label())
    }
}

/// Default rule table: (pattern, kind), evaluated top to bottom
pub const DEFAULT_RULES: &[(&str, Kind)] = &[
    (r"^(feature|feat|enhancement)$", Kind::Feature),
    (r"^(bug|fix|bugfix|regression)$", Kind::Fix),
    (r"^(docs?|documentation)$", Kind::Docs),
];

/// A single classification rule
#[derive(Debug, Clone)]
pub struct KindRule {
    pattern: Regex,
    kind: Kind,
}

impl KindRule {
    /// Build a case-insensitive rule from a pattern
    pub fn new(pattern: &str, kind: Kind) -> Result<Self> {
        let pattern = Regex::new(&format!("(?i){pattern}"))
            .map_err(|e| Error::Config(format!("invalid kind rule '{pattern}': {e}")))?;
        Ok(Self { pattern, kind })
    }

    fn matches(&self, change: &Change) -> bool {
        change.raw_tags().any(|tag| self.pattern.is_match(tag))
    }
}

/// Ordered rule table plus the fallback kind
#[derive(Debug, Clone)]
pub struct Taxonomy {
    rules: Vec<KindRule>,
}

impl Taxonomy {
    /// Build a taxonomy from (pattern, kind) pairs
    pub fn from_rules(rules: &[(&str, Kind)]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|(pattern, kind)| KindRule::new(pattern, *kind))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Kinds in output order
    pub const fn kinds(&self) -> &'static [Kind] {
        &Kind::ALL
    }

    /// Classify a change; total over all inputs
    pub fn classify(&self, change: &Change) -> Kind {
        self.rules
            .iter()
            .find(|rule| rule.matches(change))
            .map_or(Kind::Other, |rule| rule.kind)
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::from_rules(DEFAULT_RULES).expect("default kind rules are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(labels: &[&str], kind_tag: Option<&str>) -> Change {
        Change {
            project_id: 1,
            iid: 7,
            title: "Some change".to_string(),
            reference: "group/app!7".to_string(),
            web_url: "https://gitlab.com/group/app/-/merge_requests/7".to_string(),
            author: "dev".to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
            kind_tag: kind_tag.map(ToString::to_string),
            milestone: None,
            merged_at: None,
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let taxonomy = Taxonomy::default();
        // Label order must not matter, rule order does
        assert_eq!(taxonomy.classify(&change(&["Docs", "Bug"], None)), Kind::Fix);
        assert_eq!(taxonomy.classify(&change(&["Bug", "Docs"], None)), Kind::Fix);
    }

    #[test]
    fn test_unmatched_falls_back_to_other() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.classify(&change(&[], None)), Kind::Other);
        assert_eq!(taxonomy.classify(&change(&["backend", "Ready"], None)), Kind::Other);
    }

    #[test]
    fn test_matching_is_case_insensitive_and_anchored() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.classify(&change(&["FEATURE"], None)), Kind::Feature);
        assert_eq!(taxonomy.classify(&change(&["prefix"], None)), Kind::Other);
    }

    #[test]
    fn test_kind_tag_is_considered() {
        let taxonomy = Taxonomy::default();
        assert_eq!(taxonomy.classify(&change(&[], Some("docs"))), Kind::Docs);
    }

    #[test]
    fn test_custom_rule_order() {
        let taxonomy =
            Taxonomy::from_rules(&[("^docs$", Kind::Docs), ("^bug$", Kind::Fix)]).unwrap();
        assert_eq!(taxonomy.classify(&change(&["bug", "docs"], None)), Kind::Docs);
    }

    #[test]
    fn test_invalid_rule_is_config_error() {
        let err = Taxonomy::from_rules(&[("(unclosed", Kind::Fix)]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_ordinals_follow_declaration() {
        let ordinals: Vec<usize> = Kind::ALL.iter().map(|k| k.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert_eq!(Kind::Other.to_string(), "Misc changes");
    }
}
