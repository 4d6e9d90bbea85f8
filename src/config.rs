//! Run configuration.
//!
//! A [`RunConfig`] can be built in code, loaded from YAML, or layered from the
//! command line (see [`crate::cli`]).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use termcolor::ColorChoice;

use crate::errors::{BoughError, BoughResult};
use crate::tags::DEFAULT_SEPARATOR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Resolves `Auto` against whether stdout is a terminal.
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for one run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Raw tag lists; only sections sharing a tag with these run.
    pub run_only: Vec<String>,
    /// Raw tag lists; sections sharing a tag with these never run.
    pub exclude: Vec<String>,
    pub tag_separator: char,
    /// Regular expression over test-case descriptions.
    pub filter: Option<String>,
    pub color: ColorMode,
    pub format: ReportFormat,
    pub show_passing_assertions: bool,
    /// Where to write the section tree as a Graphviz digraph.
    pub dot_output: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_only: Vec::new(),
            exclude: Vec::new(),
            tag_separator: DEFAULT_SEPARATOR,
            filter: None,
            color: ColorMode::Auto,
            format: ReportFormat::Text,
            show_passing_assertions: false,
            dot_output: None,
        }
    }
}

impl RunConfig {
    pub fn from_yaml_str(source: &str) -> BoughResult<Self> {
        let config: RunConfig = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> BoughResult<Self> {
        let source = fs::read_to_string(path).map_err(|e| BoughError::io(path, e))?;
        Self::from_yaml_str(&source)
    }

    fn validate(&self) -> BoughResult<()> {
        if self.tag_separator.is_whitespace() {
            return Err(BoughError::config(
                "tag_separator may not be whitespace",
                Some("use a punctuation character such as ',' or ';'"),
            ));
        }
        Ok(())
    }

    pub fn with_run_only(mut self, tags: impl Into<String>) -> Self {
        self.run_only.push(tags.into());
        self
    }

    pub fn with_exclude(mut self, tags: impl Into<String>) -> Self {
        self.exclude.push(tags.into());
        self
    }

    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }
}
