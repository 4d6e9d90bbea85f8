//! Per-kind access policy: may a section's body run on this encounter?

use tracing::debug;

use crate::section::{SectionId, SectionKind, SectionStatus, SectionTree};
use crate::tags::TagFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Excluded by the tag filter; the section is now `SkippedByTag`.
    SkippedByTag,
    /// The section is terminal and must not be re-entered.
    Exhausted,
    /// A sibling alternative already ran in this pass.
    BranchTaken,
}

impl Access {
    pub fn is_granted(self) -> bool {
        self == Access::Granted
    }
}

/// Applies the tag filter and then the rule for the section's kind.
///
/// Granting a `When` claims its parent's branch slot for the rest of the pass.
pub fn decide(tree: &mut SectionTree, id: SectionId, filter: &TagFilter) -> Access {
    let access = evaluate(tree, id, filter);
    match access {
        Access::Granted => {
            if tree[id].kind == SectionKind::When {
                if let Some(parent) = tree[id].parent {
                    tree[parent].already_found_branch = true;
                }
            }
        }
        Access::SkippedByTag => tree.set_status(id, SectionStatus::SkippedByTag),
        Access::Exhausted | Access::BranchTaken => {}
    }
    debug!(section = %id, kind = %tree[id].kind, ?access, "access decided");
    access
}

fn evaluate(tree: &SectionTree, id: SectionId, filter: &TagFilter) -> Access {
    let node = &tree[id];
    if node.status == SectionStatus::SkippedByTag {
        return Access::SkippedByTag;
    }
    if node.status == SectionStatus::SignalDetected {
        return Access::Exhausted;
    }
    let tags = tree.effective_tags(id);
    let excluded = match node.kind {
        SectionKind::Root => false,
        SectionKind::Suite => filter.is_vetoed(&tags),
        SectionKind::TestCase | SectionKind::When | SectionKind::Then => filter.is_excluded(&tags),
    };
    if excluded {
        return Access::SkippedByTag;
    }
    match node.kind {
        SectionKind::Root | SectionKind::Suite | SectionKind::TestCase | SectionKind::Then => {
            Access::Granted
        }
        SectionKind::When => {
            if node.status == SectionStatus::FullyVisited {
                return Access::Exhausted;
            }
            let branch_taken = node
                .parent
                .map(|parent| tree[parent].already_found_branch)
                .unwrap_or(false);
            if branch_taken {
                Access::BranchTaken
            } else {
                Access::Granted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagSet;

    fn tree_with_whens(count: usize) -> (SectionTree, Vec<SectionId>) {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let mut ids = Vec::new();
        for i in 0..count {
            ids.push(tree.fetch_or_create(root, SectionKind::When, &format!("w{i}"), TagSet::new()));
            tree.advance(root);
        }
        (tree, ids)
    }

    #[test]
    fn only_the_first_eligible_when_is_granted() {
        let (mut tree, ids) = tree_with_whens(3);
        let filter = TagFilter::default();
        assert_eq!(decide(&mut tree, ids[0], &filter), Access::Granted);
        assert_eq!(decide(&mut tree, ids[1], &filter), Access::BranchTaken);
        assert_eq!(decide(&mut tree, ids[2], &filter), Access::BranchTaken);
        assert!(tree[tree.root()].already_found_branch);
    }

    #[test]
    fn fully_visited_when_lets_the_next_sibling_run() {
        let (mut tree, ids) = tree_with_whens(2);
        tree.set_status(ids[0], SectionStatus::FullyVisited);
        let filter = TagFilter::default();
        assert_eq!(decide(&mut tree, ids[0], &filter), Access::Exhausted);
        assert_eq!(decide(&mut tree, ids[1], &filter), Access::Granted);
    }

    #[test]
    fn then_repeats_even_when_fully_visited() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let then = tree.fetch_or_create(root, SectionKind::Then, "t", TagSet::new());
        tree.set_status(then, SectionStatus::FullyVisited);
        tree[root].already_found_branch = true;
        assert_eq!(decide(&mut tree, then, &TagFilter::default()), Access::Granted);
    }

    #[test]
    fn signalled_sections_are_never_reentered() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let then = tree.fetch_or_create(root, SectionKind::Then, "t", TagSet::new());
        tree.set_status(then, SectionStatus::SignalDetected);
        assert_eq!(decide(&mut tree, then, &TagFilter::default()), Access::Exhausted);
    }

    #[test]
    fn run_only_selects_test_cases_but_not_suites() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let suite = tree.fetch_or_create(root, SectionKind::Suite, "s", TagSet::new());
        let case = tree.fetch_or_create(suite, SectionKind::TestCase, "c", TagSet::new());
        let filter = TagFilter::new(["fast"].into_iter().collect(), TagSet::new());
        assert_eq!(decide(&mut tree, suite, &filter), Access::Granted);
        assert_eq!(decide(&mut tree, case, &filter), Access::SkippedByTag);
    }

    #[test]
    fn excluded_when_is_marked_and_does_not_claim_the_branch() {
        let mut tree = SectionTree::new();
        let root = tree.root();
        let skipped = tree.fetch_or_create(
            root,
            SectionKind::When,
            "skip me",
            ["skip"].into_iter().collect(),
        );
        let filter = TagFilter::new(TagSet::new(), ["skip"].into_iter().collect());
        assert_eq!(decide(&mut tree, skipped, &filter), Access::SkippedByTag);
        assert_eq!(tree[skipped].status, SectionStatus::SkippedByTag);
        assert!(!tree[root].already_found_branch);
    }
}
