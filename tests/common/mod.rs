// Shared helpers for the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use bough::{Model, RunConfig, Runner, SuiteScope};

/// Records which section bodies ran, in order, across every pass.
pub type Trace = Rc<RefCell<Vec<String>>>;

pub fn trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn log(trace: &Trace, entry: &str) {
    trace.borrow_mut().push(entry.to_string());
}

/// Runs a single suite without reporters and returns the runner.
pub fn execute<F>(config: RunConfig, body: F) -> Runner
where
    F: FnMut(&mut SuiteScope<'_>) + 'static,
{
    let mut runner = Runner::new(config);
    runner.suite("suite", body);
    runner.execute().expect("run should succeed");
    runner
}

pub fn model(runner: &Runner) -> &Model {
    runner.model().expect("runner has run")
}

/// Snapshot paths of every pass, in pass order.
pub fn paths(runner: &Runner) -> Vec<Vec<String>> {
    model(runner)
        .reports()
        .iter()
        .map(|r| r.path().into_iter().map(str::to_string).collect())
        .collect()
}

pub fn path(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
