//! Fault recovery: turning panics and failed mandatory assertions into a
//! structured end-of-pass outcome.
//!
//! A failed `require` returns [`Abort`], which section helpers propagate with
//! `?`. A panic unwinds to [`catch_pass`]. In both cases no exit bookkeeping
//! runs for the interrupted sections, so the model's current section is still
//! the innermost one when recovery starts.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::OnceCell;

/// Returned by section helpers and `require` once the pass is aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("pass aborted")
    }
}

impl std::error::Error for Abort {}

/// Result type of every section body.
pub type Outcome = Result<(), Abort>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultState {
    #[default]
    Running,
    FaultSignal,
    FaultAssertion,
}

impl FaultState {
    pub fn is_faulted(self) -> bool {
        self != FaultState::Running
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    Signal(PanicRecord),
    Assertion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    Faulted(FaultKind),
}

/// What a caught panic said and where it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicRecord {
    pub message: String,
    pub location: Option<String>,
}

impl fmt::Display for PanicRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} (at {location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

// ============================================================================
// PANIC CAPTURE
// ============================================================================

#[derive(Default)]
struct CaptureSlot {
    depth: usize,
    location: Option<String>,
}

thread_local! {
    static CAPTURE: RefCell<CaptureSlot> = RefCell::new(CaptureSlot::default());
}

static HOOK: OnceCell<()> = OnceCell::new();

/// Installs the process-wide hook once. While a pass is running on the
/// current thread the hook only records the location; otherwise it defers to
/// whatever hook was installed before.
fn install_hook() {
    HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()));
            let captured = CAPTURE.with(|slot| {
                let mut slot = slot.borrow_mut();
                if slot.depth > 0 {
                    slot.location = location.clone();
                    true
                } else {
                    false
                }
            });
            if !captured {
                previous(info);
            }
        }));
    });
}

struct CaptureGuard;

impl CaptureGuard {
    fn enter() -> Self {
        CAPTURE.with(|slot| {
            let mut slot = slot.borrow_mut();
            slot.depth += 1;
            slot.location = None;
        });
        CaptureGuard
    }

    fn take_location(&self) -> Option<String> {
        CAPTURE.with(|slot| slot.borrow_mut().location.take())
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        CAPTURE.with(|slot| slot.borrow_mut().depth -= 1);
    }
}

/// Runs one pass body, converting a panic into a [`PanicRecord`].
pub fn catch_pass<R>(body: impl FnOnce() -> R) -> Result<R, PanicRecord> {
    install_hook();
    let guard = CaptureGuard::enter();
    let result = panic::catch_unwind(AssertUnwindSafe(body));
    result.map_err(|payload| PanicRecord {
        message: panic_message(payload.as_ref()),
        location: guard.take_location(),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_body_returns_its_value() {
        assert_eq!(catch_pass(|| 7), Ok(7));
    }

    #[test]
    fn string_panics_are_captured_with_location() {
        let record = catch_pass(|| -> () { panic!("boom {}", 1) }).unwrap_err();
        assert_eq!(record.message, "boom 1");
        assert!(record.location.unwrap().contains("fault.rs"));
    }

    #[test]
    fn arithmetic_faults_are_captured() {
        let divisor = std::hint::black_box(0);
        let record = catch_pass(|| 10 / divisor).unwrap_err();
        assert!(record.message.contains("divide by zero"));
    }

    #[test]
    fn non_string_payloads_get_a_placeholder() {
        let record = catch_pass(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(record.message, "panic with a non-string payload");
    }

    #[test]
    fn capture_depth_is_restored_after_a_pass() {
        let _ = catch_pass(|| panic!("inner"));
        CAPTURE.with(|slot| assert_eq!(slot.borrow().depth, 0));
    }
}
