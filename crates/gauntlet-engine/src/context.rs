//! Process-wide engine context.
//!
//! Everything that would otherwise be a file-scope global (the capture
//! worker, the alternate signal stack, the activity slot) lives in one
//! `EngineContext`, constructed at init and torn down at fini. Exactly
//! one run tree may execute at a time.

use std::sync::atomic::{AtomicBool, Ordering};

use gauntlet_core::Config;

use crate::capture::CaptureSubsystem;
use crate::signals::AltStack;
use crate::{EngineError, contain, mock};

static ENGINE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Clears the activity flag when the context is fully torn down.
struct ActiveGuard;

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        ENGINE_ACTIVE.store(false, Ordering::Release);
    }
}

pub(crate) struct EngineContext {
    debug: bool,
    // Field order is drop order: the worker joins first, then the
    // alternate stack disarms, then the slot frees.
    capture: CaptureSubsystem,
    _altstack: Option<AltStack>,
    _active: ActiveGuard,
}

impl EngineContext {
    pub(crate) fn init(config: &Config) -> Result<Self, EngineError> {
        if ENGINE_ACTIVE.swap(true, Ordering::AcqRel) {
            return Err(EngineError::Busy);
        }
        let active = ActiveGuard;
        let altstack = if config.debug {
            None
        } else {
            Some(AltStack::install().map_err(EngineError::Containment)?)
        };
        let capture = CaptureSubsystem::start()?;
        contain::install_panic_hook();
        mock::reset();
        Ok(EngineContext {
            debug: config.debug,
            capture,
            _altstack: altstack,
            _active: active,
        })
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }

    pub(crate) fn capture(&self) -> &CaptureSubsystem {
        &self.capture
    }
}
