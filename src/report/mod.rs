//! Reporters render the finished model once a run is over.
//!
//! The [`Reporter`] trait mirrors the shape of a report: one call for the
//! whole run, one per pass, one per snapshot subtree, one per assertion list,
//! and a closing summary. Default bodies walk the tree so an implementation
//! only overrides the levels it cares about.

use std::io;

use crate::model::Model;
use crate::snapshot::{Snapshot, SnapshotId, TestReport};

mod json;
mod text;

pub use json::JsonReporter;
pub use text::TextReporter;

pub trait Reporter {
    fn report(&mut self, model: &Model) -> io::Result<()> {
        for report in model.reports() {
            self.report_one_test(model, report)?;
        }
        self.report_summary(model)
    }

    fn report_one_test(&mut self, model: &Model, report: &TestReport) -> io::Result<()> {
        self.report_snapshot_subtree(model, report, report.root(), 0)
    }

    fn report_snapshot_subtree(
        &mut self,
        model: &Model,
        report: &TestReport,
        snapshot: SnapshotId,
        depth: usize,
    ) -> io::Result<()> {
        let node = report.snapshot(snapshot);
        self.report_assertions(model, node, depth + 1)?;
        for &child in &node.children {
            self.report_snapshot_subtree(model, report, child, depth + 1)?;
        }
        Ok(())
    }

    fn report_assertions(&mut self, _model: &Model, _snapshot: &Snapshot, _depth: usize) -> io::Result<()> {
        Ok(())
    }

    fn report_summary(&mut self, _model: &Model) -> io::Result<()> {
        Ok(())
    }
}
