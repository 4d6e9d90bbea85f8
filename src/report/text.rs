//! Indented, colorized console report.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::Reporter;
use crate::model::{Model, SkipReason};
use crate::snapshot::{AssertionRecord, Snapshot, SnapshotId, SnapshotStatus, TestReport};

const INDENT: &str = "  ";

pub struct TextReporter<W: WriteColor> {
    out: W,
    show_passing_assertions: bool,
}

impl TextReporter<StandardStream> {
    pub fn stdout(choice: ColorChoice) -> Self {
        Self::new(StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_passing_assertions: false,
        }
    }

    pub fn show_passing_assertions(mut self, show: bool) -> Self {
        self.show_passing_assertions = show;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }

    fn indent(&mut self, depth: usize) -> io::Result<()> {
        write!(self.out, "{}", INDENT.repeat(depth))
    }

    fn status_marker(&mut self, status: SnapshotStatus) -> io::Result<()> {
        match status {
            SnapshotStatus::Ok => self.colored(Color::Green, false, "ok"),
            SnapshotStatus::Failed => self.colored(Color::Red, true, "FAILED"),
            SnapshotStatus::Signaled => self.colored(Color::Magenta, true, "SIGNALED"),
        }
    }

    fn assertion(&mut self, record: &AssertionRecord, depth: usize) -> io::Result<()> {
        self.indent(depth)?;
        if record.passed {
            self.colored(Color::Green, false, "✓")?;
        } else {
            self.colored(Color::Red, true, "✗")?;
        }
        let required = if record.mandatory { " [required]" } else { "" };
        writeln!(
            self.out,
            "{required} {} ({}:{})",
            record.text, record.file, record.line
        )?;
        if let (Some(expected), Some(actual)) = (&record.expected, &record.actual) {
            if expected.contains('\n') || actual.contains('\n') {
                self.diff(expected, actual, depth + 2)?;
            } else {
                self.indent(depth + 2)?;
                writeln!(self.out, "expected: {expected}")?;
                self.indent(depth + 2)?;
                writeln!(self.out, "actual:   {actual}")?;
            }
        }
        Ok(())
    }

    fn diff(&mut self, expected: &str, actual: &str, depth: usize) -> io::Result<()> {
        let changeset = Changeset::new(expected, actual, "\n");
        for diff in &changeset.diffs {
            let (sign, color, text) = match diff {
                Difference::Same(x) => (' ', None, x),
                Difference::Rem(x) => ('-', Some(Color::Green), x),
                Difference::Add(x) => ('+', Some(Color::Red), x),
            };
            for line in text.lines() {
                self.indent(depth)?;
                match color {
                    Some(color) => self.colored(color, false, &format!("{sign}{line}"))?,
                    None => write!(self.out, "{sign}{line}")?,
                }
                writeln!(self.out)?;
            }
        }
        Ok(())
    }
}

impl<W: WriteColor> Reporter for TextReporter<W> {
    fn report(&mut self, model: &Model) -> io::Result<()> {
        for report in model.reports() {
            self.report_one_test(model, report)?;
        }
        if !model.skipped().is_empty() {
            writeln!(self.out)?;
            self.colored(Color::Yellow, true, "Skipped:")?;
            writeln!(self.out)?;
            for entry in model.skipped() {
                let reason = match entry.reason {
                    SkipReason::Tag => "tag",
                    SkipReason::NameFilter => "filter",
                };
                writeln!(
                    self.out,
                    "{INDENT}- {} › {} ({}, {reason})",
                    entry.suite, entry.description, entry.kind
                )?;
            }
        }
        self.report_summary(model)?;
        self.out.flush()
    }

    fn report_one_test(&mut self, model: &Model, report: &TestReport) -> io::Result<()> {
        if report.is_success() {
            self.colored(Color::Green, true, "[PASS]")?;
        } else {
            self.colored(Color::Red, true, "[FAIL]")?;
        }
        writeln!(
            self.out,
            " {} › {} (pass {}, {:.2?})",
            report.suite, report.description, report.pass, report.elapsed
        )?;
        self.report_snapshot_subtree(model, report, report.root(), 1)
    }

    fn report_snapshot_subtree(
        &mut self,
        model: &Model,
        report: &TestReport,
        snapshot: SnapshotId,
        depth: usize,
    ) -> io::Result<()> {
        let node = report.snapshot(snapshot);
        self.indent(depth)?;
        self.status_marker(node.status)?;
        write!(self.out, " {}: {}", node.kind, node.description)?;
        if !node.tags.is_empty() {
            write!(self.out, " [{}]", node.tags)?;
        }
        if let Some(fault) = &node.fault {
            write!(self.out, " - ")?;
            self.colored(Color::Magenta, false, fault)?;
        }
        writeln!(self.out)?;

        self.report_assertions(model, node, depth + 1)?;
        for &child in &node.children {
            self.report_snapshot_subtree(model, report, child, depth + 1)?;
        }
        Ok(())
    }

    fn report_assertions(&mut self, _model: &Model, snapshot: &Snapshot, depth: usize) -> io::Result<()> {
        for record in &snapshot.assertions {
            if record.passed && !self.show_passing_assertions {
                continue;
            }
            self.assertion(record, depth)?;
        }
        Ok(())
    }

    fn report_summary(&mut self, model: &Model) -> io::Result<()> {
        let summary = model.summary();
        writeln!(self.out)?;
        write!(self.out, "Summary: {} passes, ", summary.total)?;
        self.colored(Color::Green, false, &format!("{} passed", summary.passed))?;
        write!(self.out, ", ")?;
        let failed = format!("{} failed", summary.failed);
        if summary.failed > 0 {
            self.colored(Color::Red, true, &failed)?;
        } else {
            write!(self.out, "{failed}")?;
        }
        writeln!(
            self.out,
            ", {} skipped ({:.1}%)",
            summary.skipped,
            summary.pass_percentage()
        )?;
        writeln!(
            self.out,
            "Assertions: {} total, {} failed",
            summary.assertions, summary.failed_assertions
        )
    }
}
