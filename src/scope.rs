//! User-facing handles passed into suite and test-case bodies.

use tracing::info;

use crate::fault::{self, Abort, FaultKind, FaultState, Outcome, PassOutcome};
use crate::model::Model;
use crate::section::{SectionId, SectionKind};
use crate::snapshot::{Assertion, SnapshotStatus};

/// Handle given to a test-case body on every pass.
///
/// Nested sections are opened with [`when`](Scope::when) and
/// [`then`](Scope::then); assertions are recorded with
/// [`check`](Scope::check) and [`require`](Scope::require), usually through
/// the `check!`/`require!` macros.
pub struct Scope<'m> {
    model: &'m mut Model,
}

impl<'m> Scope<'m> {
    pub(crate) fn new(model: &'m mut Model) -> Self {
        Self { model }
    }

    /// An alternative branch. Exactly one eligible `when` per nesting level
    /// runs in each pass; the others get their turn in later passes.
    pub fn when<F>(&mut self, description: &str, body: F) -> Outcome
    where
        F: FnOnce(&mut Scope<'m>) -> Outcome,
    {
        self.section(SectionKind::When, description, "", body)
    }

    pub fn when_tagged<F>(&mut self, description: &str, tags: &str, body: F) -> Outcome
    where
        F: FnOnce(&mut Scope<'m>) -> Outcome,
    {
        self.section(SectionKind::When, description, tags, body)
    }

    /// An unconditional branch, run on every pass that reaches it.
    pub fn then<F>(&mut self, description: &str, body: F) -> Outcome
    where
        F: FnOnce(&mut Scope<'m>) -> Outcome,
    {
        self.section(SectionKind::Then, description, "", body)
    }

    pub fn then_tagged<F>(&mut self, description: &str, tags: &str, body: F) -> Outcome
    where
        F: FnOnce(&mut Scope<'m>) -> Outcome,
    {
        self.section(SectionKind::Then, description, tags, body)
    }

    /// Records a non-mandatory assertion and returns whether it passed.
    pub fn check(&mut self, assertion: Assertion) -> bool {
        self.record(assertion, false)
    }

    /// Records a mandatory assertion; a failure aborts the rest of the pass.
    pub fn require(&mut self, assertion: Assertion) -> Outcome {
        if self.record(assertion, true) {
            Ok(())
        } else {
            Err(self.abort())
        }
    }

    /// True once the pass has been aborted; every further call is inert.
    pub fn is_faulted(&self) -> bool {
        self.model.is_faulted()
    }

    /// The section whose body is currently running.
    pub fn current_section(&self) -> SectionId {
        self.model.current_section()
    }

    fn record(&mut self, assertion: Assertion, mandatory: bool) -> bool {
        if self.model.is_faulted() {
            return false;
        }
        let passed = assertion.passed;
        let target = self.model.active_snapshot;
        if let Some(report) = self.model.active_report.as_mut() {
            let id = target.unwrap_or_else(|| report.root());
            report.snapshot_mut(id).assertions.push(assertion.into_record(mandatory));
        }
        if !passed {
            self.model.mark_active_or_root(SnapshotStatus::Failed);
        }
        passed
    }

    fn abort(&mut self) -> Abort {
        if !self.model.is_faulted() {
            self.model.fault = FaultState::FaultAssertion;
        }
        Abort
    }

    fn section<F>(&mut self, kind: SectionKind, description: &str, raw_tags: &str, body: F) -> Outcome
    where
        F: FnOnce(&mut Scope<'m>) -> Outcome,
    {
        if self.model.is_faulted() {
            return Err(Abort);
        }
        let parent = self.model.current;
        let tags = self.model.tags_from(raw_tags);
        let id = self.model.encounter(kind, description, tags);

        if self.model.try_enter(id).is_granted() {
            if body(self).is_err() {
                return Err(self.abort());
            }
            if self.model.is_faulted() {
                return Err(Abort);
            }
            self.model.leave(id);
        }
        self.model.step_over(parent);
        Ok(())
    }
}

/// Handle given to a suite body, which runs once per run.
pub struct SuiteScope<'m> {
    model: &'m mut Model,
}

impl<'m> SuiteScope<'m> {
    pub(crate) fn new(model: &'m mut Model) -> Self {
        Self { model }
    }

    /// Registers and exhaustively runs a test case: the body is replayed
    /// until every reachable branch has been explored.
    pub fn test_case<F>(&mut self, description: &str, body: F)
    where
        F: FnMut(&mut Scope<'_>) -> Outcome,
    {
        self.test_case_tagged(description, "", body);
    }

    pub fn test_case_tagged<F>(&mut self, description: &str, tags: &str, mut body: F)
    where
        F: FnMut(&mut Scope<'_>) -> Outcome,
    {
        let model = &mut *self.model;
        let suite = model.current;
        let tags = model.tags_from(tags);
        let id = model.encounter(SectionKind::TestCase, description, tags);

        if model.admit_test_case(id) {
            info!(suite = %model.suite_name, test_case = description, "running test case");
            let mut pass = 0;
            while model.tree.still_needs_execution(id) {
                pass += 1;
                model.begin_pass(id, pass);
                let revision = model.tree.revision();
                let caught = fault::catch_pass(|| body(&mut Scope::new(&mut *model)));
                let outcome = match caught {
                    Ok(Ok(())) if !model.is_faulted() => PassOutcome::Completed,
                    Ok(_) => PassOutcome::Faulted(FaultKind::Assertion),
                    Err(record) => PassOutcome::Faulted(FaultKind::Signal(record)),
                };
                model.end_pass(id, outcome);
                model.guard_progress(id, revision);
            }
        }
        model.current = suite;
        model.step_over(suite);
    }

    pub fn description(&self) -> &str {
        &self.model.suite_name
    }
}
