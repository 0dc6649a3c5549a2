//! # gauntlet
//!
//! A unit-test runtime for code that is allowed to crash: tests are
//! organized into a hierarchy of suites and executed sequentially while
//! the engine contains faults (fatal signals, timeouts, explicit
//! failures and skips), captures standard output per run, verifies
//! call-expectation mocks, and streams structured results to report
//! renderers.
//!
//! ```no_run
//! use gauntlet::{Comparator, Expected, SuiteCase, TestCase};
//!
//! fn arithmetic_holds() {
//!     gauntlet::check_sint!(1 + 1, Comparator::Equal, Expected::sint(2));
//! }
//!
//! fn needs_network() {
//!     gauntlet::skip("no network in this environment");
//! }
//!
//! fn main() -> std::process::ExitCode {
//!     let root = SuiteCase::new("demo")
//!         .test(TestCase::new("arithmetic", arithmetic_holds))
//!         .test(TestCase::new("network", needs_network));
//!     gauntlet::run_main(root)
//! }
//! ```

#![forbid(unsafe_code)]

mod checks;
mod cli;
mod entry;
mod registry;

pub use cli::{Cli, ColorMode, Format};
pub use entry::{HarnessError, execute, run_main};
pub use registry::Registry;

// The descriptor and matching surface.
pub use gauntlet_core::{
    Base, Comparator, Config, DEFAULT_TIMEOUT, Expected, FilterError, NameFilter, Outcome, Stats,
    SuiteCase, TestCase, TestFn, TimeoutSpec, Value,
};

// In-test primitives.
pub use gauntlet_engine::{
    EngineError, RunSummary, check, expect_assertion, expect_call, expect_parm, expect_retval,
    fail, mock_assert, mock_call, mock_parm, mock_retval, skip,
};

// Renderers, for embedders wiring their own process surface.
pub use gauntlet_report::{
    ConsoleReporter, DocumentBuilder, JsonlReporter, ReportDocument, ReportError, TapReporter,
    Verbosity,
};
