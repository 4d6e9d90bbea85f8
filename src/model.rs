//! Run-wide state shared by the scheduler, the scopes, and the reporters.

use regex::Regex;
use serde::Serialize;

use crate::errors::BoughError;
use crate::fault::FaultState;
use crate::section::{SectionId, SectionKind, SectionTree};
use crate::snapshot::{SnapshotId, TestReport};
use crate::tags::{parse_tags, TagFilter, TagSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    Tag,
    NameFilter,
}

/// A suite or test case that produced no passes.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEntry {
    pub suite: String,
    pub description: String,
    pub kind: SectionKind,
    pub reason: SkipReason,
}

/// Aggregate counts over a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of passes (one report each).
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub test_cases: usize,
    pub skipped: usize,
    pub assertions: usize,
    pub failed_assertions: usize,
    /// Test cases ended by the progress guard rather than by exhaustion.
    pub stalled: usize,
}

impl RunSummary {
    pub fn pass_percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.passed as f64 * 100.0 / self.total as f64
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Everything one run knows: the section tree, the cursor into it, the
/// finished reports, and the tag/name filters.
///
/// Each [`Runner`](crate::Runner) owns its own model; nothing is global.
#[derive(Debug)]
pub struct Model {
    pub(crate) tree: SectionTree,
    pub(crate) current: SectionId,
    pub(crate) reports: Vec<TestReport>,
    /// The report of the pass in progress, not yet in `reports`.
    pub(crate) active_report: Option<TestReport>,
    pub(crate) active_snapshot: Option<SnapshotId>,
    pub(crate) filter: TagFilter,
    pub(crate) name_filter: Option<Regex>,
    pub(crate) tag_separator: char,
    pub(crate) fault: FaultState,
    pub(crate) suite_name: String,
    pub(crate) skipped: Vec<SkippedEntry>,
    pub(crate) pending_error: Option<BoughError>,
    pub(crate) stalled: Vec<SectionId>,
}

impl Model {
    pub fn new(filter: TagFilter, name_filter: Option<Regex>, tag_separator: char) -> Self {
        let tree = SectionTree::new();
        let current = tree.root();
        Self {
            tree,
            current,
            reports: Vec::new(),
            active_report: None,
            active_snapshot: None,
            filter,
            name_filter,
            tag_separator,
            fault: FaultState::Running,
            suite_name: String::new(),
            skipped: Vec::new(),
            pending_error: None,
            stalled: Vec::new(),
        }
    }

    pub fn tree(&self) -> &SectionTree {
        &self.tree
    }

    pub fn reports(&self) -> &[TestReport] {
        &self.reports
    }

    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Test cases whose replay stopped because a pass changed nothing.
    pub fn stalled(&self) -> &[SectionId] {
        &self.stalled
    }

    pub fn current_section(&self) -> SectionId {
        self.current
    }

    pub fn fault_state(&self) -> FaultState {
        self.fault
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_faulted()
    }

    pub fn summary(&self) -> RunSummary {
        let passed = self.reports.iter().filter(|r| r.is_success()).count();
        let mut test_cases: Vec<SectionId> = self.reports.iter().map(|r| r.test_case).collect();
        test_cases.dedup();
        let assertions = self.reports.iter().flat_map(|r| r.assertions());
        let (total_assertions, failed_assertions) =
            assertions.fold((0, 0), |(all, failed), a| (all + 1, failed + usize::from(!a.passed)));
        RunSummary {
            total: self.reports.len(),
            passed,
            failed: self.reports.len() - passed,
            test_cases: test_cases.len(),
            skipped: self.skipped.len(),
            assertions: total_assertions,
            failed_assertions,
            stalled: self.stalled.len(),
        }
    }

    /// Parses a raw tag string; a malformed tag is remembered and reported
    /// when the run ends, and the section continues with the valid pieces.
    pub(crate) fn tags_from(&mut self, raw: &str) -> TagSet {
        match parse_tags(self.tag_separator, raw) {
            Ok(tags) => tags,
            Err(err) => {
                if self.pending_error.is_none() {
                    self.pending_error = Some(err);
                }
                raw.split(self.tag_separator)
                    .map(str::trim)
                    .filter(|t| !t.is_empty() && !t.chars().any(char::is_whitespace))
                    .collect()
            }
        }
    }
}
