//! Bough: exhaustive exploration of nested BDD sections by replay.
//!
//! A test case is a closure containing nested `when` (alternative) and `then`
//! (unconditional) sections. The engine re-invokes the whole closure once per
//! pass, and a persistent [`SectionTree`] remembers which alternative to take
//! next, until every reachable combination has run. Panics and failed
//! mandatory assertions end only the current pass.
//!
//! ```rust,no_run
//! use bough::{check_eq, require, Runner};
//!
//! let mut runner = Runner::default();
//! runner.suite("arithmetic", |suite| {
//!     suite.test_case("division", |t| {
//!         let mut divisor = 1;
//!         t.when("dividing by two", |_| {
//!             divisor = 2;
//!             Ok(())
//!         })?;
//!         t.when("dividing by four", |_| {
//!             divisor = 4;
//!             Ok(())
//!         })?;
//!         t.then("the quotient is smaller", |t| {
//!             require!(t, 8 / divisor < 8)?;
//!             check_eq!(t, 0, 8 % divisor);
//!             Ok(())
//!         })
//!     });
//! });
//! let summary = runner.run().expect("run failed");
//! assert!(summary.is_success());
//! ```

pub mod access;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fault;
pub mod model;
pub mod report;
pub mod section;
pub mod snapshot;
pub mod tags;

mod macros;
mod runner;
mod scheduler;
mod scope;

pub use crate::config::{ColorMode, ReportFormat, RunConfig};
pub use crate::errors::{BoughError, BoughResult};
pub use crate::fault::{Abort, Outcome};
pub use crate::model::{Model, RunSummary};
pub use crate::report::{JsonReporter, Reporter, TextReporter};
pub use crate::runner::Runner;
pub use crate::scope::{Scope, SuiteScope};
pub use crate::section::{SectionId, SectionKind, SectionStatus, SectionTree};
pub use crate::snapshot::{Assertion, AssertionRecord, ReportOutcome, SnapshotStatus, TestReport};
pub use crate::tags::{parse_tags, TagSet};
