//! # gauntlet-core
//!
//! Data model and pure logic for the gauntlet test runtime: descriptor
//! trees, the live run tree with its per-run state machine, statistics
//! aggregation, the comparison-value dispatcher shared by checks and mock
//! expectations, and the FIFO expectation queue.
//!
//! Everything in this crate is side-effect free. Signal containment, I/O
//! capture, and the tree driver live in `gauntlet-engine`; report
//! renderers live in `gauntlet-report`.

#![deny(unsafe_code)]

pub mod assess;
pub mod base;
pub mod capture;
pub mod config;
pub mod events;
pub mod expect;
pub mod filter;
pub mod outcome;
pub mod run;
pub mod state;
pub mod stats;
pub mod tree;

pub use assess::{Comparator, CompareError, Expected, Value, ValueKind};
pub use base::{Base, DEFAULT_TIMEOUT, Fixture, SuiteCase, TestCase, TestFn, TimeoutSpec};
pub use capture::CaptureBlock;
pub use config::Config;
pub use events::{FanoutReporter, Reporter, RunEvent, RunView};
pub use expect::{ExpectError, ExpectKind, ExpectQueue, Expectation, SourceInfo};
pub use filter::{FilterError, NameFilter};
pub use outcome::Outcome;
pub use run::{Diagnostic, Run, RunKind};
pub use state::RunState;
pub use stats::Stats;
pub use tree::{RunId, RunNode, RunTree};
