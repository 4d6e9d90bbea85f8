//! Tag sets and the tag filter.
//!
//! Tags are plain strings attached to sections. A run carries two sets: the
//! run-only set (if non-empty, only matching sections run) and the exclude set
//! (matching sections never run). Exclusion always wins.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::errors::{BoughError, BoughResult};

/// Default separator between tags in a raw tag string.
pub const DEFAULT_SEPARATOR: char = ',';

/// An unordered set of tags. Stored sorted so reports are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.0.insert(tag.into())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// True if at least one tag appears in both sets.
    pub fn intersects(&self, other: &TagSet) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().any(|tag| large.contains(tag))
    }

    /// Adds every tag of `other` to this set.
    pub fn extend_from(&mut self, other: &TagSet) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        TagSet(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "#{tag}")?;
            first = false;
        }
        Ok(())
    }
}

/// Splits `raw` on `separator` into a tag set.
///
/// Whitespace around each piece is trimmed and empty pieces are dropped, so
/// `"fast, db,,"` yields `{db, fast}`. A piece with interior whitespace is
/// rejected.
pub fn parse_tags(separator: char, raw: &str) -> BoughResult<TagSet> {
    let mut tags = TagSet::new();
    for piece in raw.split(separator) {
        let tag = piece.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().any(char::is_whitespace) {
            return Err(BoughError::InvalidTag {
                tag: tag.to_string(),
                raw: raw.to_string(),
                separator,
            });
        }
        tags.insert(tag);
    }
    Ok(tags)
}

// ============================================================================
// TAG FILTER
// ============================================================================

/// The run-only and exclude sets for one run.
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    pub run_only: TagSet,
    pub exclude: TagSet,
}

impl TagFilter {
    pub fn new(run_only: TagSet, exclude: TagSet) -> Self {
        Self { run_only, exclude }
    }

    pub fn is_excluded(&self, tags: &TagSet) -> bool {
        is_excluded(tags, &self.run_only, &self.exclude)
    }

    /// Exclude set only; run-only selection does not apply to containers.
    pub fn is_vetoed(&self, tags: &TagSet) -> bool {
        self.exclude.intersects(tags)
    }
}

/// Decides whether a section carrying `tags` must be skipped.
pub fn is_excluded(tags: &TagSet, run_only: &TagSet, exclude: &TagSet) -> bool {
    if !exclude.is_empty() && exclude.intersects(tags) {
        return true;
    }
    !run_only.is_empty() && !run_only.intersects(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> TagSet {
        tags.iter().copied().collect()
    }

    #[test]
    fn parse_trims_and_drops_empty_pieces() {
        let tags = parse_tags(',', " fast, db,,").unwrap();
        assert_eq!(tags, set(&["db", "fast"]));
    }

    #[test]
    fn parse_honours_custom_separator() {
        let tags = parse_tags(';', "a;b,c").unwrap();
        assert_eq!(tags, set(&["a", "b,c"]));
    }

    #[test]
    fn parse_rejects_interior_whitespace() {
        let err = parse_tags(',', "ok, not ok").unwrap_err();
        assert!(matches!(err, BoughError::InvalidTag { ref tag, .. } if tag == "not ok"));
    }

    #[test]
    fn empty_sets_exclude_nothing() {
        assert!(!is_excluded(&set(&["x"]), &TagSet::new(), &TagSet::new()));
        assert!(!is_excluded(&TagSet::new(), &TagSet::new(), &TagSet::new()));
    }

    #[test]
    fn run_only_requires_a_common_tag() {
        let run_only = set(&["fast"]);
        assert!(!is_excluded(&set(&["fast", "db"]), &run_only, &TagSet::new()));
        assert!(is_excluded(&set(&["slow"]), &run_only, &TagSet::new()));
        assert!(is_excluded(&TagSet::new(), &run_only, &TagSet::new()));
    }

    #[test]
    fn exclude_wins_over_run_only() {
        let both = set(&["flaky"]);
        assert!(is_excluded(&set(&["flaky"]), &both, &both));
    }

    #[test]
    fn display_lists_tags_in_order() {
        assert_eq!(set(&["b", "a"]).to_string(), "#a, #b");
    }
}
