//! Machine-readable report: the finished reports and summary as one JSON
//! document.

use std::io::{self, Write};

use serde::Serialize;

use super::Reporter;
use crate::model::{Model, RunSummary, SkippedEntry};
use crate::snapshot::TestReport;

#[derive(Serialize)]
struct JsonDocument<'a> {
    summary: RunSummary,
    pass_percentage: f64,
    reports: &'a [TestReport],
    skipped: &'a [SkippedEntry],
}

pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, model: &Model) -> io::Result<()> {
        let summary = model.summary();
        let document = JsonDocument {
            summary,
            pass_percentage: summary.pass_percentage(),
            reports: model.reports(),
            skipped: model.skipped(),
        };
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
