//! # gauntlet-report
//!
//! Renderers over the engine's per-run event stream: a colored console
//! view, TAP, a machine-readable JSON document, and a JSONL event log.
//! None of them execute anything; they only consume `Reporter`
//! callbacks and read-only run views.

#![forbid(unsafe_code)]

pub mod console;
pub mod document;
pub mod jsonl;
pub mod tap;

use std::io;

use thiserror::Error;

pub use console::{ConsoleReporter, Verbosity};
pub use document::{DocumentBuilder, ReportDocument, RunRecord, StatsRecord};
pub use jsonl::{EventRecord, JsonlReporter};
pub use tap::TapReporter;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("report serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no root run was observed; did the tree execute?")]
    Incomplete,
}
