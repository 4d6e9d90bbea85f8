//! Bough Error Handling
//!
//! Run-level failures (bad tags, bad configuration, unwritable output) are
//! represented by [`BoughError`]. Faults raised by code under test are *not*
//! errors: they are recorded in the report model and never leave the engine.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type BoughResult<T> = Result<T, BoughError>;

// ============================================================================
// ERROR TYPE
// ============================================================================

/// Every way a run can fail before, after, or around test execution.
#[derive(Debug, Error, Diagnostic)]
pub enum BoughError {
    #[error("invalid tag '{tag}' in \"{raw}\"")]
    #[diagnostic(
        code(bough::tags::invalid),
        help("tags may not contain whitespace; separate them with the configured tag separator")
    )]
    InvalidTag {
        tag: String,
        raw: String,
        separator: char,
    },

    #[error("configuration error: {message}")]
    #[diagnostic(code(bough::config::invalid))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("invalid test filter '{pattern}'")]
    #[diagnostic(
        code(bough::config::filter),
        help("the filter is a regular expression matched against test-case descriptions")
    )]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("could not access '{}'", path.display())]
    #[diagnostic(code(bough::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reporter failed while writing results")]
    #[diagnostic(code(bough::report::write))]
    Report {
        #[source]
        source: std::io::Error,
    },
}

impl BoughError {
    /// Builds a configuration error with an optional help line.
    pub fn config(message: impl Into<String>, help: Option<&str>) -> Self {
        BoughError::Config {
            message: message.into(),
            help: help.map(str::to_string),
        }
    }

    /// Wraps an I/O error together with the path that produced it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BoughError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_yaml::Error> for BoughError {
    fn from(err: serde_yaml::Error) -> Self {
        let help = err
            .location()
            .map(|loc| format!("check line {}, column {}", loc.line(), loc.column()));
        BoughError::Config {
            message: err.to_string(),
            help,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_errors_become_config_errors_with_location_help() {
        let err: BoughError = serde_yaml::from_str::<Vec<u32>>("[1, two]")
            .map_err(BoughError::from)
            .unwrap_err();
        match err {
            BoughError::Config { help, .. } => assert!(help.unwrap().contains("line 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn diagnostic_codes_are_namespaced() {
        let err = BoughError::InvalidTag {
            tag: "a b".into(),
            raw: "a b,c".into(),
            separator: ',',
        };
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("bough::tags::invalid"));
    }
}
