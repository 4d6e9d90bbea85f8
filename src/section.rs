//! The persistent section tree.
//!
//! One [`SectionNode`] exists per syntactic branch point reached during a run.
//! Nodes are resolved by *position* within their parent, never by description:
//! every pass replays the same source nesting, and the parent's
//! `current_child_index` says which child the next encounter refers to.

use std::fmt::{self, Write as _};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::tags::TagSet;

/// Index of a section in its [`SectionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SectionId(pub usize);

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionKind {
    Root,
    Suite,
    TestCase,
    /// Alternative branch: at most one sibling runs per pass.
    When,
    /// Unconditional branch: runs on every pass that reaches it.
    Then,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Root => "Root",
            SectionKind::Suite => "Suite",
            SectionKind::TestCase => "TestCase",
            SectionKind::When => "When",
            SectionKind::Then => "Then",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SectionStatus {
    Unvisited,
    PartiallyVisited,
    FullyVisited,
    SignalDetected,
    SkippedByTag,
}

impl SectionStatus {
    /// Terminal sections never need another pass.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SectionStatus::FullyVisited | SectionStatus::SignalDetected | SectionStatus::SkippedByTag
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionStatus::Unvisited => "Unvisited",
            SectionStatus::PartiallyVisited => "PartiallyVisited",
            SectionStatus::FullyVisited => "FullyVisited",
            SectionStatus::SignalDetected => "SignalDetected",
            SectionStatus::SkippedByTag => "SkippedByTag",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traversal metadata for one branch point.
#[derive(Debug, Clone)]
pub struct SectionNode {
    pub id: SectionId,
    pub kind: SectionKind,
    pub description: String,
    pub tags: Arc<TagSet>,
    pub parent: Option<SectionId>,
    pub children: Vec<SectionId>,
    /// Set once the body has run to completion; the child list is then final.
    pub children_known: bool,
    pub current_child_index: usize,
    pub status: SectionStatus,
    pub already_found_branch: bool,
    pub times_encountered: u64,
    /// Panic message recorded when the status became `SignalDetected`.
    pub signal: Option<String>,
}

impl SectionNode {
    /// A section is (re)run while it is unvisited or partially visited.
    pub fn still_needs_execution(&self) -> bool {
        matches!(
            self.status,
            SectionStatus::Unvisited | SectionStatus::PartiallyVisited
        )
    }
}

// ============================================================================
// SECTION TREE
// ============================================================================

/// Arena of sections rooted at a single `Root` node.
#[derive(Debug, Clone)]
pub struct SectionTree {
    nodes: Vec<SectionNode>,
    revision: u64,
}

impl Default for SectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionTree {
    pub fn new() -> Self {
        let root = SectionNode {
            id: SectionId(0),
            kind: SectionKind::Root,
            description: "root".to_string(),
            tags: Arc::new(TagSet::new()),
            parent: None,
            children: Vec::new(),
            children_known: false,
            current_child_index: 0,
            status: SectionStatus::Unvisited,
            already_found_branch: false,
            times_encountered: 0,
            signal: None,
        };
        Self {
            nodes: vec![root],
            revision: 0,
        }
    }

    pub fn root(&self) -> SectionId {
        SectionId(0)
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn get(&self, id: SectionId) -> Option<&SectionNode> {
        self.nodes.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionNode> {
        self.nodes.iter()
    }

    /// Bumped on every node creation and status change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Resolves the section at the parent's current position, creating it if
    /// this position has never been reached before.
    ///
    /// Once a position exists it is returned as-is; description, kind, and
    /// tags of later encounters are ignored. New children are appended only
    /// while `children_known` is false.
    pub fn fetch_or_create(
        &mut self,
        parent: SectionId,
        kind: SectionKind,
        description: &str,
        tags: TagSet,
    ) -> SectionId {
        let index = self[parent].current_child_index;
        if let Some(&existing) = self[parent].children.get(index) {
            return existing;
        }
        debug_assert!(
            !self[parent].children_known,
            "section {parent} reached an unknown child after its children were final"
        );

        let id = SectionId(self.nodes.len());
        self.nodes.push(SectionNode {
            id,
            kind,
            description: description.to_string(),
            tags: Arc::new(tags),
            parent: Some(parent),
            children: Vec::new(),
            children_known: false,
            current_child_index: 0,
            status: SectionStatus::Unvisited,
            already_found_branch: false,
            times_encountered: 0,
            signal: None,
        });
        self[parent].children.push(id);
        self.revision += 1;
        trace!(section = %id, %parent, %kind, description, "discovered section");
        id
    }

    /// Moves the parent's cursor to its next child position.
    pub fn advance(&mut self, parent: SectionId) {
        self[parent].current_child_index += 1;
    }

    pub fn set_status(&mut self, id: SectionId, status: SectionStatus) {
        let node = &mut self[id];
        if node.status != status {
            node.status = status;
            self.revision += 1;
        }
    }

    /// True if the section's body completed at least once and every child is
    /// terminal.
    pub fn is_fully_visited(&self, id: SectionId) -> bool {
        self[id].children_known && self.discovered_children_terminal(id)
    }

    /// True if every child discovered so far is terminal.
    pub fn discovered_children_terminal(&self, id: SectionId) -> bool {
        self[id]
            .children
            .iter()
            .all(|&child| self[child].status.is_terminal())
    }

    /// Status rule for a section whose body was interrupted by a fault.
    ///
    /// Children after the fault point were not reached, so discovered
    /// children only settle the section if its body completed in an earlier
    /// pass, or if no alternative was taken under it in this pass (the next
    /// pass would then follow the same path into the same fault).
    pub fn exhausted_after_fault(&self, id: SectionId) -> bool {
        let node = &self[id];
        self.discovered_children_terminal(id) && (node.children_known || !node.already_found_branch)
    }

    pub fn still_needs_execution(&self, id: SectionId) -> bool {
        self[id].still_needs_execution()
    }

    /// Own tags united with every ancestor's tags.
    pub fn effective_tags(&self, id: SectionId) -> TagSet {
        let mut tags = TagSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            tags.extend_from(&self[current].tags);
            cursor = self[current].parent;
        }
        tags
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: SectionId) -> impl Iterator<Item = SectionId> + '_ {
        std::iter::successors(self[id].parent, move |&p| self[p].parent)
    }

    /// Renders the tree as a Graphviz digraph.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph sections {\n    node [shape=box, fontname=\"monospace\"];\n");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "    {} [label=\"{}\\n{} · {}\"];",
                node.id,
                escape_dot(&node.description),
                node.kind,
                node.status
            );
        }
        for node in &self.nodes {
            for child in &node.children {
                let _ = writeln!(out, "    {} -> {};", node.id, child);
            }
        }
        out.push_str("}\n");
        out
    }
}

fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Index<SectionId> for SectionTree {
    type Output = SectionNode;

    fn index(&self, id: SectionId) -> &SectionNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<SectionId> for SectionTree {
    fn index_mut(&mut self, id: SectionId) -> &mut SectionNode {
        &mut self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> TagSet {
        list.iter().copied().collect()
    }

    #[test]
    fn first_discovery_appends_children_in_call_order() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let a = tree.fetch_or_create(root, SectionKind::When, "same", TagSet::new());
        tree.advance(root);
        let b = tree.fetch_or_create(root, SectionKind::When, "same", TagSet::new());
        assert_ne!(a, b);
        assert_eq!(tree[root].children, vec![a, b]);
        assert_eq!(tree[a].parent, Some(root));
    }

    #[test]
    fn replay_resolves_by_position_without_creating_nodes() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let a = tree.fetch_or_create(root, SectionKind::When, "a", TagSet::new());
        tree.advance(root);
        let b = tree.fetch_or_create(root, SectionKind::When, "b", TagSet::new());
        tree[root].children_known = true;
        tree[root].current_child_index = 0;
        let len = tree.len();

        assert_eq!(tree.fetch_or_create(root, SectionKind::When, "a", TagSet::new()), a);
        tree.advance(root);
        assert_eq!(tree.fetch_or_create(root, SectionKind::When, "b", TagSet::new()), b);
        assert_eq!(tree.len(), len);
    }

    #[test]
    fn partially_discovered_parent_keeps_appending_after_known_prefix() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let a = tree.fetch_or_create(root, SectionKind::When, "a", TagSet::new());
        tree[root].current_child_index = 0;
        assert_eq!(tree.fetch_or_create(root, SectionKind::When, "a", TagSet::new()), a);
        tree.advance(root);
        let b = tree.fetch_or_create(root, SectionKind::When, "b", TagSet::new());
        assert_eq!(tree[root].children, vec![a, b]);
    }

    #[test]
    fn fully_visited_requires_known_children_all_terminal() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let a = tree.fetch_or_create(root, SectionKind::When, "a", TagSet::new());
        assert!(!tree.is_fully_visited(root));
        tree[root].children_known = true;
        assert!(!tree.is_fully_visited(root));
        tree.set_status(a, SectionStatus::SignalDetected);
        assert!(tree.is_fully_visited(root));
    }

    #[test]
    fn leaf_with_completed_body_is_fully_visited() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        tree[root].children_known = true;
        assert!(tree.is_fully_visited(root));
    }

    #[test]
    fn fault_after_a_taken_alternative_keeps_the_section_open() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let a = tree.fetch_or_create(root, SectionKind::When, "a", TagSet::new());
        tree.set_status(a, SectionStatus::FullyVisited);
        tree[root].already_found_branch = true;
        assert!(!tree.exhausted_after_fault(root));

        tree[root].already_found_branch = false;
        assert!(tree.exhausted_after_fault(root));
    }

    #[test]
    fn fault_after_the_last_known_alternative_settles_the_section() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let a = tree.fetch_or_create(root, SectionKind::When, "a", TagSet::new());
        tree.set_status(a, SectionStatus::FullyVisited);
        tree[root].children_known = true;
        tree[root].already_found_branch = true;
        assert!(tree.exhausted_after_fault(root));
    }

    #[test]
    fn fault_with_an_open_child_keeps_the_section_open() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let then = tree.fetch_or_create(root, SectionKind::Then, "t", TagSet::new());
        tree.set_status(then, SectionStatus::PartiallyVisited);
        assert!(!tree.exhausted_after_fault(root));
    }

    #[test]
    fn set_status_bumps_revision_only_on_change() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let before = tree.revision();
        tree.set_status(root, SectionStatus::Unvisited);
        assert_eq!(tree.revision(), before);
        tree.set_status(root, SectionStatus::PartiallyVisited);
        assert_eq!(tree.revision(), before + 1);
    }

    #[test]
    fn effective_tags_inherit_from_ancestors() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let suite = tree.fetch_or_create(root, SectionKind::Suite, "s", tags(&["db"]));
        let case = tree.fetch_or_create(suite, SectionKind::TestCase, "c", tags(&["fast"]));
        assert_eq!(tree.effective_tags(case), tags(&["db", "fast"]));
        assert_eq!(tree.ancestors(case).collect::<Vec<_>>(), vec![suite, root]);
    }

    #[test]
    fn dot_export_has_a_node_per_section_and_an_edge_per_child() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        tree.fetch_or_create(root, SectionKind::Suite, "say \"hi\"", TagSet::new());
        let dot = tree.to_dot();
        assert!(dot.starts_with("digraph sections {"));
        assert!(dot.contains("s1 [label=\"say \\\"hi\\\"\\nSuite · Unvisited\"];"));
        assert!(dot.contains("s0 -> s1;"));
    }
}
