//! Command-line arguments understood by a bough test binary.
//!
//! Every flag is optional and maps onto one [`RunConfig`] field; tag lists
//! are kept raw here and parsed when the run starts.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::{ColorMode, ReportFormat, RunConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for ColorMode {
    fn from(v: ColorArg) -> Self {
        match v {
            ColorArg::Auto => ColorMode::Auto,
            ColorArg::Always => ColorMode::Always,
            ColorArg::Never => ColorMode::Never,
        }
    }
}

/// Flags accepted by any binary that hands its runner to [`crate::cli::run`].
#[derive(Debug, Parser)]
#[command(
    version,
    about = "Run registered suites, exploring every when/then branch.",
    long_about = None
)]
pub struct CliArgs {
    /// Only run sections tagged with one of these (separator-delimited).
    #[arg(short = 't', long = "tags", value_name = "LIST")]
    pub tags: Vec<String>,

    /// Never run sections tagged with one of these (separator-delimited).
    #[arg(short = 'x', long = "exclude", value_name = "LIST")]
    pub exclude: Vec<String>,

    /// Only run test cases whose description matches this regex.
    #[arg(short = 'f', long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// YAML file with a run configuration; flags override it.
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    #[arg(long, value_enum)]
    pub color: Option<ColorArg>,

    /// Also list assertions that passed.
    #[arg(long = "show-passing")]
    pub show_passing: bool,

    /// Write the section tree as a Graphviz digraph.
    #[arg(long, value_name = "FILE")]
    pub dot: Option<PathBuf>,

    /// Log engine activity (RUST_LOG overrides).
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Layers the flags over `base`.
    pub fn apply(&self, mut base: RunConfig) -> RunConfig {
        base.run_only.extend(self.tags.iter().cloned());
        base.exclude.extend(self.exclude.iter().cloned());
        if let Some(filter) = &self.filter {
            base.filter = Some(filter.clone());
        }
        if let Some(format) = self.format {
            base.format = format.into();
        }
        if let Some(color) = self.color {
            base.color = color.into();
        }
        if self.show_passing {
            base.show_passing_assertions = true;
        }
        if let Some(dot) = &self.dot {
            base.dot_output = Some(dot.clone());
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_layer_over_the_base_config() {
        let args = CliArgs::parse_from([
            "bough", "--tags", "fast", "-x", "slow,flaky", "--format", "json", "--show-passing",
        ]);
        let base = RunConfig::default().with_run_only("db");
        let config = args.apply(base);
        assert_eq!(config.run_only, vec!["db".to_string(), "fast".to_string()]);
        assert_eq!(config.exclude, vec!["slow,flaky".to_string()]);
        assert_eq!(config.format, ReportFormat::Json);
        assert!(config.show_passing_assertions);
    }

    #[test]
    fn absent_flags_keep_the_base_config() {
        let args = CliArgs::parse_from(["bough"]);
        let base = RunConfig::default().with_filter("^login");
        assert_eq!(args.apply(base.clone()), base);
    }
}
