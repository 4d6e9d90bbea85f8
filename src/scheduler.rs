//! The replay scheduler.
//!
//! Each branch point is handled in two phases per encounter. Phase A resolves
//! the section by position under the current section and, once the body is
//! done, runs the exit bookkeeping. Phase B asks the access policy whether the
//! body may run and, if so, enters the section and pushes its snapshot.
//!
//! A test case is driven by re-invoking its whole body once per pass until its
//! section is terminal.

use tracing::{debug, warn};

use crate::access::{self, Access};
use crate::fault::{FaultKind, FaultState, PassOutcome};
use crate::model::{Model, SkipReason, SkippedEntry};
use crate::section::{SectionId, SectionKind, SectionStatus};
use crate::snapshot::{SnapshotStatus, TestReport};
use crate::tags::TagSet;

impl Model {
    // ------------------------------------------------------------------------
    // Phase A: resolve and exit
    // ------------------------------------------------------------------------

    /// Resolves (or discovers) the section at the current position.
    pub(crate) fn encounter(&mut self, kind: SectionKind, description: &str, tags: TagSet) -> SectionId {
        let id = self.tree.fetch_or_create(self.current, kind, description, tags);
        self.tree[id].times_encountered += 1;
        id
    }

    /// Exit bookkeeping for a section whose body ran to completion.
    pub(crate) fn leave(&mut self, id: SectionId) {
        let node = &mut self.tree[id];
        node.children_known = true;
        node.current_child_index = 0;
        if self.tree.is_fully_visited(id) {
            self.tree.set_status(id, SectionStatus::FullyVisited);
            self.tree[id].already_found_branch = false;
        } else {
            self.tree.set_status(id, SectionStatus::PartiallyVisited);
        }

        if matches!(self.tree[id].kind, SectionKind::When | SectionKind::Then) {
            self.exit_snapshot(id);
        }
        if let Some(parent) = self.tree[id].parent {
            self.current = parent;
        }
    }

    /// Moves the parent's cursor past the section just handled.
    pub(crate) fn step_over(&mut self, parent: SectionId) {
        self.tree.advance(parent);
    }

    // ------------------------------------------------------------------------
    // Phase B: access and entry
    // ------------------------------------------------------------------------

    /// Applies the access policy and, on grant, makes `id` the current
    /// section.
    pub(crate) fn try_enter(&mut self, id: SectionId) -> Access {
        let access = access::decide(&mut self.tree, id, &self.filter);
        if access.is_granted() {
            self.enter(id);
        }
        access
    }

    fn enter(&mut self, id: SectionId) {
        self.current = id;
        let node = &mut self.tree[id];
        node.current_child_index = 0;
        node.already_found_branch = false;
        if node.status == SectionStatus::Unvisited {
            self.tree.set_status(id, SectionStatus::PartiallyVisited);
        }
        if matches!(self.tree[id].kind, SectionKind::When | SectionKind::Then) {
            self.enter_snapshot(id);
        }
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    fn enter_snapshot(&mut self, id: SectionId) {
        let node = &self.tree[id];
        if let Some(report) = self.active_report.as_mut() {
            let parent = self.active_snapshot.or(Some(report.root()));
            let snapshot = report.push(parent, id, node.kind, &node.description, node.tags.clone());
            self.active_snapshot = Some(snapshot);
        }
    }

    fn exit_snapshot(&mut self, id: SectionId) {
        let signalled = self.tree[id].status == SectionStatus::SignalDetected;
        if let (Some(report), Some(snapshot)) = (self.active_report.as_mut(), self.active_snapshot) {
            if signalled {
                report.mark(snapshot, SnapshotStatus::Signaled);
            }
            self.active_snapshot = report.close(snapshot);
        }
    }

    /// Marks the active snapshot (the innermost section of the pass).
    pub(crate) fn mark_active(&mut self, status: SnapshotStatus) {
        if let (Some(report), Some(snapshot)) = (self.active_report.as_mut(), self.active_snapshot) {
            report.mark(snapshot, status);
        }
    }

    // ------------------------------------------------------------------------
    // Pass driver
    // ------------------------------------------------------------------------

    /// Decides whether a test case runs at all. Excluded cases are recorded
    /// as skipped.
    pub(crate) fn admit_test_case(&mut self, id: SectionId) -> bool {
        if let Some(pattern) = &self.name_filter {
            if !pattern.is_match(&self.tree[id].description) {
                self.record_skip(id, SkipReason::NameFilter);
                return false;
            }
        }
        match access::decide(&mut self.tree, id, &self.filter) {
            Access::Granted => true,
            Access::SkippedByTag => {
                self.record_skip(id, SkipReason::Tag);
                false
            }
            Access::Exhausted | Access::BranchTaken => false,
        }
    }

    pub(crate) fn record_skip(&mut self, id: SectionId, reason: SkipReason) {
        let node = &self.tree[id];
        debug!(section = %id, description = %node.description, ?reason, "skipped");
        self.skipped.push(SkippedEntry {
            suite: self.suite_name.clone(),
            description: node.description.clone(),
            kind: node.kind,
            reason,
        });
    }

    /// Starts pass number `pass` of test case `id`.
    pub(crate) fn begin_pass(&mut self, id: SectionId, pass: usize) {
        debug!(test_case = %id, pass, "pass started");
        self.fault = FaultState::Running;
        self.current = id;
        let node = &mut self.tree[id];
        node.current_child_index = 0;
        node.already_found_branch = false;
        if node.status == SectionStatus::Unvisited {
            self.tree.set_status(id, SectionStatus::PartiallyVisited);
        }
        let node = &self.tree[id];
        self.active_report = Some(TestReport::begin(
            self.suite_name.clone(),
            pass,
            id,
            &node.description,
            node.tags.clone(),
        ));
        self.active_snapshot = None;
    }

    /// Closes the pass, applying fault recovery if the pass was cut short.
    pub(crate) fn end_pass(&mut self, id: SectionId, outcome: PassOutcome) {
        match outcome {
            PassOutcome::Completed => {
                self.current = id;
                self.leave(id);
            }
            PassOutcome::Faulted(kind) => self.recover(id, kind),
        }

        if let Some(mut report) = self.active_report.take() {
            report.finalize();
            debug!(test_case = %id, pass = report.pass, outcome = ?report.outcome, "pass finished");
            self.reports.push(report);
        }
        self.active_snapshot = None;
        self.fault = FaultState::Running;
        self.current = self.tree[id].parent.unwrap_or(id);
    }

    /// Fault bookkeeping for the sections that were open when the pass was
    /// interrupted, innermost first up to the test case.
    fn recover(&mut self, test_case: SectionId, kind: FaultKind) {
        let innermost = self.current;
        match kind {
            FaultKind::Signal(record) => {
                warn!(section = %innermost, panic = %record, "panic in section body");
                self.fault = FaultState::FaultSignal;
                self.tree.set_status(innermost, SectionStatus::SignalDetected);
                self.tree[innermost].signal = Some(record.to_string());
                if let Some(report) = self.active_report.as_mut() {
                    let target = self.active_snapshot.unwrap_or_else(|| report.root());
                    report.snapshot_mut(target).fault = Some(record.to_string());
                }
                self.mark_active_or_root(SnapshotStatus::Signaled);
            }
            FaultKind::Assertion => {
                self.fault = FaultState::FaultAssertion;
                self.mark_active_or_root(SnapshotStatus::Failed);
                self.settle_after_fault(innermost);
            }
        }

        if innermost != test_case {
            let ancestors: Vec<SectionId> = self
                .tree
                .ancestors(innermost)
                .take_while(|&a| a != test_case)
                .chain(std::iter::once(test_case))
                .collect();
            for section in ancestors {
                self.settle_after_fault(section);
            }
        }
        self.current = test_case;
    }

    /// A section cut short by a fault is only exhausted when replaying it
    /// could not take a different path up to the fault point.
    fn settle_after_fault(&mut self, id: SectionId) {
        let status = if self.tree.exhausted_after_fault(id) {
            SectionStatus::FullyVisited
        } else {
            SectionStatus::PartiallyVisited
        };
        self.tree.set_status(id, status);
    }

    pub(crate) fn mark_active_or_root(&mut self, status: SnapshotStatus) {
        if self.active_snapshot.is_some() {
            self.mark_active(status);
        } else if let Some(report) = self.active_report.as_mut() {
            let root = report.root();
            report.mark(root, status);
        }
    }

    /// Forces a test case terminal when a whole pass changed nothing in the
    /// tree; replaying it again would produce the same pass forever.
    pub(crate) fn guard_progress(&mut self, id: SectionId, revision_before: u64) {
        if self.tree.still_needs_execution(id) && self.tree.revision() == revision_before {
            warn!(
                test_case = %id,
                description = %self.tree[id].description,
                "pass made no progress; remaining sections are unreachable"
            );
            self.tree.set_status(id, SectionStatus::FullyVisited);
            self.stalled.push(id);
        }
    }
}
