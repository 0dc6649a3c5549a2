//! Live mock-expectation surface.
//!
//! Bridges the pure FIFO queue from `gauntlet-core` to running test
//! code: mocked functions are free functions without an engine handle,
//! so the live queue sits behind a process-wide mutex. Only the driver
//! thread ever touches it; the mutex exists for API safety, not for
//! contention. Every queue operation runs inside a deferred-jump window
//! so a timer expiry cannot leak the lock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use gauntlet_core::expect::{ExpectKind, Expectation, SourceInfo};
use gauntlet_core::run::Diagnostic;
use gauntlet_core::{Comparator, ExpectError, ExpectQueue, Expected, Outcome, Value};

use crate::contain::{self, DeferredJumps};

static QUEUE: Mutex<ExpectQueue> = Mutex::new(ExpectQueue::new());
static ASSERT_ARMED: AtomicBool = AtomicBool::new(false);

/// Panic payload of a trapped assertion; consumed by
/// [`expect_assertion`].
pub(crate) struct AssertTrip;

/// Schedule a call-only expectation for `func`.
#[track_caller]
pub fn expect_call(func: &str) {
    let expectation = Expectation {
        func: func.to_owned(),
        kind: ExpectKind::Call,
        origin: SourceInfo::caller(),
    };
    schedule(expectation);
}

/// Schedule a parameter expectation for `func`'s parameter `parm`.
#[track_caller]
pub fn expect_parm(func: &str, parm: &str, comparator: Comparator, expected: Expected) {
    let expectation = Expectation {
        func: func.to_owned(),
        kind: ExpectKind::Parm {
            parm: parm.to_owned(),
            comparator,
            expected,
        },
        origin: SourceInfo::caller(),
    };
    schedule(expectation);
}

/// Schedule the value the next mocked call of `func` must return.
#[track_caller]
pub fn expect_retval(func: &str, value: Value) {
    let expectation = Expectation {
        func: func.to_owned(),
        kind: ExpectKind::Retval { value },
        origin: SourceInfo::caller(),
    };
    schedule(expectation);
}

/// Mocked-function side: verify the head expectation is a call of
/// `func`. Aborts the phase on any mismatch.
pub fn mock_call(func: &str) {
    let result = {
        let _window = DeferredJumps::enter();
        let mut queue = QUEUE.lock();
        queue.check_call(func)
    };
    if let Err(err) = result {
        fail_expect(err);
    }
}

/// Mocked-function side: verify `observed` against the head parameter
/// expectation.
pub fn mock_parm(func: &str, parm: &str, observed: Value) {
    let result = {
        let _window = DeferredJumps::enter();
        let mut queue = QUEUE.lock();
        queue.check_parm(func, parm, &observed)
    };
    if let Err(err) = result {
        fail_expect(err);
    }
}

/// Mocked-function side: pop the scheduled return value for `func`.
pub fn mock_retval(func: &str) -> Value {
    let result = {
        let _window = DeferredJumps::enter();
        let mut queue = QUEUE.lock();
        queue.fetch_retval(func)
    };
    match result {
        Ok(value) => value,
        Err(err) => fail_expect(err),
    }
}

/// Assert that running `f` trips the assertion hook ([`mock_assert`]).
///
/// Fails the enclosing test when `f` returns without asserting; any
/// other panic propagates unchanged.
pub fn expect_assertion<F: FnOnce()>(f: F) {
    ASSERT_ARMED.store(true, Ordering::Release);
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    ASSERT_ARMED.store(false, Ordering::Release);
    match result {
        Ok(()) => contain::abort(
            Outcome::Fail,
            Diagnostic::new(
                "assertion check failed",
                "expected an assertion failure, none fired",
            ),
        ),
        Err(payload) if payload.is::<AssertTrip>() => {}
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Replacement assertion hook for code under test.
///
/// Inside an armed [`expect_assertion`] the trap is consumed and the
/// protected call unwinds; anywhere else a firing assertion fails the
/// test outright.
#[track_caller]
pub fn mock_assert(expr: &str) -> ! {
    let origin = SourceInfo::caller();
    if ASSERT_ARMED.swap(false, Ordering::AcqRel) {
        panic::panic_any(AssertTrip);
    }
    contain::abort(
        Outcome::Fail,
        Diagnostic::new("assertion failed", format!("assertion '{expr}' failed")).at(origin),
    );
}

/// Append under the lock; the deferral window drops after the guard so
/// a parked alarm can never abort while the queue is held.
#[inline]
fn schedule(expectation: Expectation) {
    let _window = DeferredJumps::enter();
    let mut queue = QUEUE.lock();
    queue.schedule(expectation);
}

fn fail_expect(err: ExpectError) -> ! {
    let mut diag = Diagnostic::new("mock expectation failed", err.to_string());
    if let Some(origin) = err.origin() {
        diag = diag.at(origin.clone());
    }
    if let ExpectError::ValueMismatch { wanted, found, .. } = &err {
        diag = diag.with_check(wanted, found);
    }
    contain::abort(Outcome::Fail, diag);
}

/// Start a run with a clean slate.
pub(crate) fn reset() {
    {
        let _window = DeferredJumps::enter();
        let mut queue = QUEUE.lock();
        queue.reset();
    }
    ASSERT_ARMED.store(false, Ordering::Release);
}

/// Drain the queue at run finalization; `verify` reports leftovers.
pub(crate) fn release(verify: bool) -> Option<Diagnostic> {
    let err = {
        let _window = DeferredJumps::enter();
        let mut queue = QUEUE.lock();
        queue.release(verify)
    };
    err.map(|err| {
        let why = "extra mock expectation left";
        match err {
            ExpectError::Leftover {
                func,
                origin,
                count,
            } => Diagnostic::new(
                format!("'{func}' scheduled but never checked ({count} left)"),
                why,
            )
            .at(origin),
            other => Diagnostic::new("mock expectation left", why).at(
                other
                    .origin()
                    .cloned()
                    .unwrap_or_else(|| SourceInfo {
                        file: String::new(),
                        line: 0,
                    }),
            ),
        }
    })
}

/// True when an armed assertion trap survived to finalization, which is
/// itself a failure. Clears the flag.
pub(crate) fn take_armed_assertion() -> bool {
    ASSERT_ARMED.swap(false, Ordering::AcqRel)
}
