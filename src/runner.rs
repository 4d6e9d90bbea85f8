//! Suite registration and the top-level run.

use std::fs;
use std::io;

use regex::Regex;
use tracing::info;

use crate::config::{ReportFormat, RunConfig};
use crate::errors::{BoughError, BoughResult};
use crate::model::{Model, RunSummary, SkipReason};
use crate::report::{JsonReporter, Reporter, TextReporter};
use crate::scope::SuiteScope;
use crate::section::{SectionKind, SectionStatus};
use crate::tags::{parse_tags, TagFilter, TagSet};

type SuiteBody = Box<dyn FnMut(&mut SuiteScope<'_>)>;

struct RegisteredSuite {
    description: String,
    tags: String,
    body: SuiteBody,
}

/// Owns the registered suites, the reporters, and the model of the last run.
pub struct Runner {
    config: RunConfig,
    suites: Vec<RegisteredSuite>,
    reporters: Vec<Box<dyn Reporter>>,
    model: Option<Model>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(RunConfig::default())
    }
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            suites: Vec::new(),
            reporters: Vec::new(),
            model: None,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RunConfig {
        &mut self.config
    }

    /// Registers a suite. Suites run once each, in registration order.
    pub fn suite<F>(&mut self, description: &str, body: F) -> &mut Self
    where
        F: FnMut(&mut SuiteScope<'_>) + 'static,
    {
        self.suite_tagged(description, "", body)
    }

    pub fn suite_tagged<F>(&mut self, description: &str, tags: &str, body: F) -> &mut Self
    where
        F: FnMut(&mut SuiteScope<'_>) + 'static,
    {
        self.suites.push(RegisteredSuite {
            description: description.to_string(),
            tags: tags.to_string(),
            body: Box::new(body),
        });
        self
    }

    /// Adds a reporter. Without any, the configured default format is used.
    pub fn reporter(&mut self, reporter: Box<dyn Reporter>) -> &mut Self {
        self.reporters.push(reporter);
        self
    }

    /// The model of the most recent run.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    /// Runs every suite without invoking any reporter.
    ///
    /// A malformed tag met during the run is returned as the error once all
    /// suites have finished; the model stays available through [`model`].
    ///
    /// [`model`]: Runner::model
    pub fn execute(&mut self) -> BoughResult<RunSummary> {
        let summary = self.run_suites()?;
        match self.model.as_mut().and_then(|model| model.pending_error.take()) {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    /// Runs every suite, then reports and exports diagnostics. Reports are
    /// written even when the run ends with a pending tag error.
    pub fn run(&mut self) -> BoughResult<RunSummary> {
        let summary = self.run_suites()?;
        let Some(model) = self.model.as_mut() else {
            return Ok(summary);
        };
        let pending = model.pending_error.take();
        let model = &*model;

        if self.reporters.is_empty() {
            let mut reporter = default_reporter(&self.config);
            reporter
                .report(model)
                .map_err(|source| BoughError::Report { source })?;
        } else {
            for reporter in &mut self.reporters {
                reporter
                    .report(model)
                    .map_err(|source| BoughError::Report { source })?;
            }
        }

        if let Some(path) = &self.config.dot_output {
            fs::write(path, model.tree().to_dot()).map_err(|e| BoughError::io(path, e))?;
        }
        match pending {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    fn run_suites(&mut self) -> BoughResult<RunSummary> {
        let mut model = self.build_model()?;
        for suite in &mut self.suites {
            run_suite(&mut model, suite);
        }
        let summary = model.summary();
        info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "run finished"
        );
        self.model = Some(model);
        Ok(summary)
    }

    fn build_model(&self) -> BoughResult<Model> {
        let separator = self.config.tag_separator;
        let filter = TagFilter::new(
            collect_tags(separator, &self.config.run_only)?,
            collect_tags(separator, &self.config.exclude)?,
        );
        let name_filter = match &self.config.filter {
            Some(pattern) => Some(Regex::new(pattern).map_err(|source| BoughError::InvalidFilter {
                pattern: pattern.clone(),
                source,
            })?),
            None => None,
        };
        Ok(Model::new(filter, name_filter, separator))
    }
}

fn collect_tags(separator: char, raw: &[String]) -> BoughResult<TagSet> {
    let mut tags = TagSet::new();
    for item in raw {
        tags.extend_from(&parse_tags(separator, item)?);
    }
    Ok(tags)
}

fn default_reporter(config: &RunConfig) -> Box<dyn Reporter> {
    match config.format {
        ReportFormat::Text => Box::new(
            TextReporter::stdout(config.color.choice())
                .show_passing_assertions(config.show_passing_assertions),
        ),
        ReportFormat::Json => Box::new(JsonReporter::new(io::stdout())),
    }
}

/// Phase A/B for a suite section: suites have no alternatives and no
/// snapshots, and their body runs exactly once.
fn run_suite(model: &mut Model, suite: &mut RegisteredSuite) {
    let root = model.tree.root();
    model.current = root;
    let tags = model.tags_from(&suite.tags);
    let id = model.encounter(SectionKind::Suite, &suite.description, tags);
    model.suite_name = suite.description.clone();

    if model.try_enter(id).is_granted() {
        info!(suite = %suite.description, "running suite");
        (suite.body)(&mut SuiteScope::new(model));
        model.current = id;
        model.leave(id);
    } else if model.tree()[id].status == SectionStatus::SkippedByTag {
        model.record_skip(id, SkipReason::Tag);
    }
    model.step_over(root);
}
