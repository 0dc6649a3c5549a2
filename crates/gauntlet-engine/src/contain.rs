//! Fault and timeout containment.
//!
//! Lets a phase run arbitrary, possibly crashing or hanging code while
//! guaranteeing the driver regains control. Process-fatal signals and
//! the phase alarm land in handlers restricted to atomics plus a
//! non-local jump back to the recovery point; explicit in-test aborts
//! (`skip`, `fail`, check and mock mismatches) travel as a typed panic
//! payload caught at the same point. Diagnostics are allocated after
//! control is back in the driver frame, never inside a handler.

use std::any::Any;
use std::ffi::c_int;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicPtr, AtomicUsize, Ordering};
use std::time::Duration;

use gauntlet_core::expect::SourceInfo;
use gauntlet_core::run::Diagnostic;
use gauntlet_core::{Outcome, TestFn};

use crate::jump::{self, JumpBuf};
use crate::mock::AssertTrip;
use crate::{EngineError, signals, timer};

/// Phase of a test run, named in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Setup,
    Exec,
    Teardown,
}

impl Phase {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Exec => "exec",
            Phase::Teardown => "teardown",
        }
    }
}

/// How a phase ended.
#[derive(Debug)]
pub(crate) enum PhaseResult {
    Completed,
    Aborted { outcome: Outcome, diag: Diagnostic },
}

// sigsetjmp return codes used by the handlers. 0 is the direct return.
const JUMP_FAULT: c_int = 2;
const JUMP_ALARM: c_int = 3;

// The recovery point and phase bookkeeping shared with the handlers.
// Touched only by the driver thread and by handlers interrupting it.
static ESCAPE: AtomicPtr<JumpBuf> = AtomicPtr::new(std::ptr::null_mut());
static PHASE_LIVE: AtomicBool = AtomicBool::new(false);
static FAULT_SIGNAL: AtomicI32 = AtomicI32::new(0);

// Deferred-alarm window: while the driver holds an engine lock a jump
// would leak it, so the alarm is parked and re-raised on exit.
static DEFER_JUMPS: AtomicBool = AtomicBool::new(false);
static PENDING_ALARM: AtomicBool = AtomicBool::new(false);

// The thread owning the recovery point. ITIMER_REAL delivery may land
// on any thread with SIGALRM unblocked; a handler running elsewhere
// must forward the signal instead of jumping into a foreign stack.
static DRIVER_THREAD: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn on_fault(signum: c_int) {
    if !PHASE_LIVE.swap(false, Ordering::AcqRel) {
        return;
    }
    let env = ESCAPE.load(Ordering::Acquire);
    if env.is_null() {
        return;
    }
    FAULT_SIGNAL.store(signum, Ordering::Release);
    unsafe { jump::long_jump(env, JUMP_FAULT) };
}

unsafe extern "C" fn on_alarm(signum: c_int) {
    let driver = DRIVER_THREAD.load(Ordering::Acquire) as libc::pthread_t;
    if driver != 0 && unsafe { libc::pthread_equal(libc::pthread_self(), driver) } == 0 {
        unsafe { libc::pthread_kill(driver, signum) };
        return;
    }
    if DEFER_JUMPS.load(Ordering::Acquire) {
        PENDING_ALARM.store(true, Ordering::Release);
        return;
    }
    // A timer still pending after natural completion must be ignored,
    // not double-reported.
    if !PHASE_LIVE.swap(false, Ordering::AcqRel) {
        return;
    }
    let env = ESCAPE.load(Ordering::Acquire);
    if env.is_null() {
        return;
    }
    unsafe { jump::long_jump(env, JUMP_ALARM) };
}

/// Typed panic payload carrying an explicit phase abort.
pub(crate) struct PhaseAbort {
    pub outcome: Outcome,
    pub diag: Diagnostic,
}

/// Abort the current phase with `outcome`; resumes at the recovery
/// point via unwinding.
pub(crate) fn abort(outcome: Outcome, diag: Diagnostic) -> ! {
    panic::panic_any(PhaseAbort { outcome, diag });
}

/// Skip the rest of the current test with a reason.
#[track_caller]
pub fn skip(reason: &str) -> ! {
    let origin = SourceInfo::caller();
    abort(Outcome::Skip, Diagnostic::new("", reason).at(origin));
}

/// Fail the current test outright with a reason.
#[track_caller]
pub fn fail(reason: &str) -> ! {
    let origin = SourceInfo::caller();
    abort(Outcome::Fail, Diagnostic::new("", reason).at(origin));
}

pub(crate) fn phase_live() -> bool {
    PHASE_LIVE.load(Ordering::Acquire)
}

/// Marks a short engine-internal critical section during which the
/// alarm handler must not jump (it would leak the held lock). A parked
/// expiry aborts the phase on exit, through unwinding instead of the
/// jump.
pub(crate) struct DeferredJumps;

impl DeferredJumps {
    pub(crate) fn enter() -> Self {
        DEFER_JUMPS.store(true, Ordering::Release);
        DeferredJumps
    }
}

impl Drop for DeferredJumps {
    fn drop(&mut self) {
        DEFER_JUMPS.store(false, Ordering::Release);
        if PENDING_ALARM.swap(false, Ordering::AcqRel)
            && phase_live()
            && !std::thread::panicking()
        {
            abort(
                Outcome::Fail,
                Diagnostic::new("", "timer expired"),
            );
        }
    }
}

/// Suppress the default panic printer while a phase is live; explicit
/// aborts and contained test panics are reported through diagnostics,
/// not stderr noise. Outside phases the previous hook stays in charge.
pub(crate) fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !phase_live() {
                previous(info);
            }
        }));
    });
}

/// Execute one phase under containment.
///
/// With `debug` set no handlers or timer are installed: a crash kills
/// the process where it happened so a debugger can catch it. Explicit
/// aborts still classify normally.
pub(crate) fn run_phase(
    debug: bool,
    timeout: Option<Duration>,
    phase: Phase,
    body: TestFn,
) -> Result<PhaseResult, EngineError> {
    if debug {
        return Ok(execute_with_recovery(body, phase));
    }

    DRIVER_THREAD.store(unsafe { libc::pthread_self() } as usize, Ordering::Release);
    let faults = signals::install(&signals::FAULT_SIGNALS, on_fault)
        .map_err(EngineError::Containment)?;
    let alarm = match timeout {
        Some(t) if !t.is_zero() => {
            let saved = match signals::install(&[libc::SIGALRM], on_alarm) {
                Ok(saved) => saved,
                Err(err) => {
                    signals::restore(faults);
                    return Err(EngineError::Containment(err));
                }
            };
            if let Err(err) = timer::arm(t) {
                signals::restore(saved);
                signals::restore(faults);
                return Err(EngineError::Containment(err));
            }
            Some(saved)
        }
        _ => None,
    };

    let result = execute_with_recovery(body, phase);

    if let Some(saved) = alarm {
        timer::disarm();
        signals::restore(saved);
    }
    PENDING_ALARM.store(false, Ordering::Release);
    signals::restore(faults);
    Ok(result)
}

/// The recovery point itself. `sigsetjmp` is called directly in this
/// frame, which stays live for the whole phase; the handlers jump back
/// here. Kept free of locals that are written between the save and a
/// possible jump.
#[inline(never)]
fn execute_with_recovery(body: TestFn, phase: Phase) -> PhaseResult {
    let mut env = JumpBuf::new();
    ESCAPE.store(&raw mut env, Ordering::Release);
    FAULT_SIGNAL.store(0, Ordering::Release);
    PHASE_LIVE.store(true, Ordering::Release);

    let code = unsafe { jump::sigsetjmp_raw(&raw mut env, 1) };
    let result = if code == 0 {
        let caught = panic::catch_unwind(AssertUnwindSafe(body));
        PHASE_LIVE.store(false, Ordering::Release);
        match caught {
            Ok(()) => PhaseResult::Completed,
            Err(payload) => classify_panic(payload, phase),
        }
    } else {
        landed(code, phase)
    };

    ESCAPE.store(std::ptr::null_mut(), Ordering::Release);
    PHASE_LIVE.store(false, Ordering::Release);
    result
}

/// Classification after a handler jumped back.
fn landed(code: c_int, phase: Phase) -> PhaseResult {
    match code {
        JUMP_ALARM => PhaseResult::Aborted {
            outcome: Outcome::Fail,
            diag: Diagnostic::new(format!("{} failed", phase.as_str()), "timer expired"),
        },
        _ => {
            let signum = FAULT_SIGNAL.swap(0, Ordering::AcqRel);
            PhaseResult::Aborted {
                outcome: Outcome::Excp,
                diag: Diagnostic::new(
                    format!("{} crashed", phase.as_str()),
                    format!(
                        "caught {} (signal {signum})",
                        signals::signal_name(signum)
                    ),
                ),
            }
        }
    }
}

fn classify_panic(payload: Box<dyn Any + Send>, phase: Phase) -> PhaseResult {
    let payload = match payload.downcast::<PhaseAbort>() {
        Ok(explicit) => {
            let PhaseAbort { mut outcome, mut diag } = *explicit;
            // Skip is not a legal teardown outcome.
            if phase == Phase::Teardown && outcome == Outcome::Skip {
                outcome = Outcome::Fail;
                diag.why = format!("skip raised from teardown: {}", diag.why);
            }
            if diag.what.is_empty() {
                diag.what = match outcome {
                    Outcome::Skip => format!("{} skipped", phase.as_str()),
                    _ => format!("{} failed", phase.as_str()),
                };
            }
            return PhaseResult::Aborted { outcome, diag };
        }
        Err(other) => other,
    };
    if payload.is::<AssertTrip>() {
        return PhaseResult::Aborted {
            outcome: Outcome::Fail,
            diag: Diagnostic::new(
                format!("{} failed", phase.as_str()),
                "assertion trap fired outside expect_assertion",
            ),
        };
    }
    PhaseResult::Aborted {
        outcome: Outcome::Fail,
        diag: Diagnostic::new(
            format!("{} failed", phase.as_str()),
            format!("panicked: {}", panic_text(&*payload)),
        ),
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "<non-string panic payload>".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completes() {}

    fn skips() {
        skip("disabled");
    }

    fn fails() {
        fail("broken on purpose");
    }

    fn panics() {
        panic!("plain panic");
    }

    #[test]
    fn completed_phase() {
        let result = run_phase(true, None, Phase::Exec, completes).unwrap();
        assert!(matches!(result, PhaseResult::Completed));
    }

    #[test]
    fn explicit_skip_keeps_its_reason() {
        install_panic_hook();
        let result = run_phase(true, None, Phase::Exec, skips).unwrap();
        match result {
            PhaseResult::Aborted { outcome, diag } => {
                assert_eq!(outcome, Outcome::Skip);
                assert_eq!(diag.why, "disabled");
                assert_eq!(diag.what, "exec skipped");
                assert!(diag.origin.is_some());
            }
            PhaseResult::Completed => panic!("phase should have aborted"),
        }
    }

    #[test]
    fn explicit_fail_classifies() {
        install_panic_hook();
        let result = run_phase(true, None, Phase::Exec, fails).unwrap();
        match result {
            PhaseResult::Aborted { outcome, diag } => {
                assert_eq!(outcome, Outcome::Fail);
                assert_eq!(diag.why, "broken on purpose");
            }
            PhaseResult::Completed => panic!("phase should have aborted"),
        }
    }

    #[test]
    fn skip_from_teardown_becomes_fail() {
        install_panic_hook();
        let result = run_phase(true, None, Phase::Teardown, skips).unwrap();
        match result {
            PhaseResult::Aborted { outcome, diag } => {
                assert_eq!(outcome, Outcome::Fail);
                assert!(diag.why.contains("skip raised from teardown"));
            }
            PhaseResult::Completed => panic!("phase should have aborted"),
        }
    }

    #[test]
    fn plain_panic_is_a_failure() {
        install_panic_hook();
        let result = run_phase(true, None, Phase::Exec, panics).unwrap();
        match result {
            PhaseResult::Aborted { outcome, diag } => {
                assert_eq!(outcome, Outcome::Fail);
                assert_eq!(diag.what, "exec failed");
                assert!(diag.why.contains("plain panic"));
            }
            PhaseResult::Completed => panic!("phase should have aborted"),
        }
    }
}
