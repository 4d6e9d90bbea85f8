//! Per-pass snapshots and test reports.
//!
//! Every pass produces one [`TestReport`] owning a tree of [`Snapshot`]s that
//! mirrors the path actually taken through the section tree in that pass.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::section::{SectionId, SectionKind};
use crate::tags::TagSet;

/// Index of a snapshot inside its report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SnapshotId(pub usize);

/// Ordered from best to worst so the worst status of a tree is its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SnapshotStatus {
    Ok,
    Failed,
    Signaled,
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotStatus::Ok => "ok",
            SnapshotStatus::Failed => "FAILED",
            SnapshotStatus::Signaled => "SIGNALED",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportOutcome {
    Success,
    Failure,
}

/// One executed assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionRecord {
    pub mandatory: bool,
    pub passed: bool,
    pub text: String,
    pub file: String,
    pub line: u32,
    /// Only kept for failed assertions.
    pub expected: Option<String>,
    pub actual: Option<String>,
}

/// An assertion as written at the call site, before it is recorded.
///
/// Usually built by the `check!`/`require!` family of macros.
#[derive(Debug, Clone)]
pub struct Assertion {
    pub passed: bool,
    pub text: &'static str,
    pub file: &'static str,
    pub line: u32,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl Assertion {
    pub fn new(passed: bool, text: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            passed,
            text,
            file,
            line,
            expected: None,
            actual: None,
        }
    }

    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    pub(crate) fn into_record(self, mandatory: bool) -> AssertionRecord {
        let (expected, actual) = if self.passed {
            (None, None)
        } else {
            (self.expected, self.actual)
        };
        AssertionRecord {
            mandatory,
            passed: self.passed,
            text: self.text.to_string(),
            file: self.file.to_string(),
            line: self.line,
            expected,
            actual,
        }
    }
}

/// A section's outcome in one specific pass.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub section: SectionId,
    pub description: String,
    pub tags: Arc<TagSet>,
    pub kind: SectionKind,
    pub status: SnapshotStatus,
    pub elapsed: Duration,
    pub assertions: Vec<AssertionRecord>,
    pub parent: Option<SnapshotId>,
    pub children: Vec<SnapshotId>,
    /// Panic message for a `Signaled` snapshot.
    pub fault: Option<String>,
    #[serde(skip)]
    started: Instant,
}

impl Snapshot {
    pub fn failed_assertions(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.assertions.iter().filter(|a| !a.passed)
    }
}

/// The record of one pass through a test case.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub suite: String,
    pub test_case: SectionId,
    pub description: String,
    /// 1-based pass number within the test case.
    pub pass: usize,
    pub outcome: ReportOutcome,
    pub elapsed: Duration,
    snapshots: Vec<Snapshot>,
    #[serde(skip)]
    started: Instant,
}

impl TestReport {
    /// Starts a report whose root snapshot is the test case itself.
    pub fn begin(
        suite: impl Into<String>,
        pass: usize,
        section: SectionId,
        description: &str,
        tags: Arc<TagSet>,
    ) -> Self {
        let mut report = Self {
            suite: suite.into(),
            test_case: section,
            description: description.to_string(),
            pass,
            outcome: ReportOutcome::Success,
            elapsed: Duration::ZERO,
            snapshots: Vec::new(),
            started: Instant::now(),
        };
        report.push(None, section, SectionKind::TestCase, description, tags);
        report
    }

    pub fn root(&self) -> SnapshotId {
        SnapshotId(0)
    }

    pub fn snapshot(&self, id: SnapshotId) -> &Snapshot {
        &self.snapshots[id.0]
    }

    pub fn snapshot_mut(&mut self, id: SnapshotId) -> &mut Snapshot {
        &mut self.snapshots[id.0]
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ReportOutcome::Success
    }

    /// Descriptions along the path taken, root first, in entry order.
    pub fn path(&self) -> Vec<&str> {
        self.snapshots
            .iter()
            .map(|snapshot| snapshot.description.as_str())
            .collect()
    }

    pub fn assertions(&self) -> impl Iterator<Item = &AssertionRecord> {
        self.snapshots.iter().flat_map(|s| s.assertions.iter())
    }

    /// Appends a snapshot as the last child of `parent` (or as the root).
    pub fn push(
        &mut self,
        parent: Option<SnapshotId>,
        section: SectionId,
        kind: SectionKind,
        description: &str,
        tags: Arc<TagSet>,
    ) -> SnapshotId {
        let id = SnapshotId(self.snapshots.len());
        self.snapshots.push(Snapshot {
            id,
            section,
            description: description.to_string(),
            tags,
            kind,
            status: SnapshotStatus::Ok,
            elapsed: Duration::ZERO,
            assertions: Vec::new(),
            parent,
            children: Vec::new(),
            fault: None,
            started: Instant::now(),
        });
        if let Some(parent) = parent {
            self.snapshots[parent.0].children.push(id);
        }
        id
    }

    /// Stops the clock on a snapshot; returns its parent.
    pub fn close(&mut self, id: SnapshotId) -> Option<SnapshotId> {
        let snapshot = &mut self.snapshots[id.0];
        snapshot.elapsed = snapshot.started.elapsed();
        snapshot.parent
    }

    /// Raises a snapshot's status; a status never improves.
    pub fn mark(&mut self, id: SnapshotId, status: SnapshotStatus) {
        let snapshot = &mut self.snapshots[id.0];
        snapshot.status = snapshot.status.max(status);
    }

    /// Closes the pass: the root takes the worst status in the tree and the
    /// outcome follows it.
    pub fn finalize(&mut self) {
        let root = self.root();
        let worst = self
            .snapshots
            .iter()
            .map(|s| s.status)
            .max()
            .unwrap_or(SnapshotStatus::Ok);
        self.mark(root, worst);
        for snapshot in &mut self.snapshots {
            if snapshot.elapsed.is_zero() {
                snapshot.elapsed = snapshot.started.elapsed();
            }
        }
        self.elapsed = self.started.elapsed();
        self.outcome = if worst == SnapshotStatus::Ok {
            ReportOutcome::Success
        } else {
            ReportOutcome::Failure
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> TestReport {
        TestReport::begin("suite", 1, SectionId(1), "case", Arc::new(TagSet::new()))
    }

    #[test]
    fn pushed_snapshots_form_the_taken_path() {
        let mut report = report();
        let root = report.root();
        let when = report.push(Some(root), SectionId(2), SectionKind::When, "A", Arc::default());
        report.close(when);
        report.push(Some(root), SectionId(4), SectionKind::Then, "T", Arc::default());
        assert_eq!(report.path(), vec!["case", "A", "T"]);
        assert_eq!(report.snapshot(root).children.len(), 2);
        assert_eq!(report.close(when), Some(root));
    }

    #[test]
    fn finalize_propagates_the_worst_status_to_the_root() {
        let mut report = report();
        let root = report.root();
        let when = report.push(Some(root), SectionId(2), SectionKind::When, "A", Arc::default());
        report.mark(when, SnapshotStatus::Signaled);
        report.mark(when, SnapshotStatus::Failed);
        report.finalize();
        assert_eq!(report.snapshot(when).status, SnapshotStatus::Signaled);
        assert_eq!(report.snapshot(root).status, SnapshotStatus::Signaled);
        assert_eq!(report.outcome, ReportOutcome::Failure);
    }

    #[test]
    fn clean_pass_is_a_success() {
        let mut report = report();
        report.finalize();
        assert!(report.is_success());
    }

    #[test]
    fn passing_assertions_drop_expected_and_actual() {
        let record = Assertion::new(true, "x == 1", "f.rs", 3)
            .with_values("1", "1")
            .into_record(false);
        assert_eq!(record.expected, None);
        let record = Assertion::new(false, "x == 1", "f.rs", 3)
            .with_values("1", "2")
            .into_record(true);
        assert_eq!(record.actual.as_deref(), Some("2"));
        assert!(record.mandatory);
    }
}
