//! # gauntlet-engine
//!
//! The OS boundary of the gauntlet test runtime: signal-based fault and
//! timeout containment, the background standard-I/O capture worker, the
//! live mock-expectation surface, and the sequential driver that walks a
//! run tree.
//!
//! Everything `unsafe` in the workspace lives here, confined to the
//! `jump`, `signals`, `timer`, and `capture` modules. The data model it
//! drives is `gauntlet-core`.

pub mod capture;
mod check;
mod contain;
mod context;
mod driver;
mod jump;
mod mock;
mod signals;
mod timer;

use std::io;

use thiserror::Error;

pub use capture::CaptureError;
pub use check::check;
pub use contain::{fail, skip};
pub use driver::{RunSummary, run, show};
pub use mock::{
    expect_assertion, expect_call, expect_parm, expect_retval, mock_assert, mock_call, mock_parm,
    mock_retval,
};
pub use signals::signal_name;

/// Engine-internal failure; never raised by test code itself.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Exactly one run tree may execute at a time, process-wide.
    #[error("another engine run is already active")]
    Busy,
    #[error("fault containment setup failed: {0}")]
    Containment(#[source] io::Error),
    #[error("capture subsystem failure: {0}")]
    Capture(#[from] CaptureError),
}
