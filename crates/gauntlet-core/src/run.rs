//! The live execution instance of one descriptor.

use std::time::{Duration, Instant};

use crate::base::TestFn;
use crate::capture::CaptureBlock;
use crate::expect::SourceInfo;
use crate::outcome::Outcome;
use crate::state::RunState;

/// Kind of the underlying descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Test,
    Suite,
}

impl RunKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunKind::Test => "test",
            RunKind::Suite => "suite",
        }
    }
}

/// Captured detail describing why a run failed, skipped, or crashed.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The operation that raised the issue, e.g. "exec failed".
    pub what: String,
    /// Human-readable reason.
    pub why: String,
    /// Where the issue was raised from, when known.
    pub origin: Option<SourceInfo>,
    /// Rendered expectation of a failed check.
    pub wanted: Option<String>,
    /// Rendered observation of a failed check.
    pub found: Option<String>,
}

impl Diagnostic {
    /// Diagnostic without check detail.
    #[must_use]
    pub fn new(what: impl Into<String>, why: impl Into<String>) -> Self {
        Diagnostic {
            what: what.into(),
            why: why.into(),
            origin: None,
            wanted: None,
            found: None,
        }
    }

    #[must_use]
    pub fn at(mut self, origin: SourceInfo) -> Self {
        self.origin = Some(origin);
        self
    }

    #[must_use]
    pub fn with_check(mut self, wanted: impl Into<String>, found: impl Into<String>) -> Self {
        self.wanted = Some(wanted.into());
        self.found = Some(found.into());
        self
    }
}

/// Live state of one test or suite instance.
///
/// Mutated exclusively by the driver thread during its own traversal
/// step; renderers only ever see shared references.
#[derive(Debug)]
pub struct Run {
    name: String,
    full_name: String,
    kind: RunKind,
    state: RunState,
    outcome: Outcome,
    diag: Option<Diagnostic>,
    started: Option<Instant>,
    elapsed: Option<Duration>,
    // Inheritance already resolved against the ancestor chain.
    setup: Option<TestFn>,
    teardown: Option<TestFn>,
    timeout: Option<Duration>,
    stdout: CaptureBlock,
    stderr: CaptureBlock,
}

impl Run {
    #[must_use]
    pub(crate) fn new(
        name: String,
        full_name: String,
        kind: RunKind,
        off: bool,
        setup: Option<TestFn>,
        teardown: Option<TestFn>,
        timeout: Option<Duration>,
    ) -> Self {
        Run {
            name,
            full_name,
            kind,
            state: if off { RunState::Off } else { RunState::Init },
            outcome: Outcome::Unknown,
            diag: None,
            started: None,
            elapsed: None,
            setup,
            teardown,
            timeout,
            stdout: CaptureBlock::new(),
            stderr: CaptureBlock::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dotted full name built from ancestor names.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    #[must_use]
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        self.diag.as_ref()
    }

    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    #[must_use]
    pub fn is_off(&self) -> bool {
        self.state == RunState::Off || self.outcome == Outcome::Off
    }

    #[must_use]
    pub fn resolved_setup(&self) -> Option<TestFn> {
        self.setup
    }

    #[must_use]
    pub fn resolved_teardown(&self) -> Option<TestFn> {
        self.teardown
    }

    #[must_use]
    pub fn resolved_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn stdout(&self) -> &CaptureBlock {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &CaptureBlock {
        &self.stderr
    }

    /// Move the capture blocks out for the duration of a redirect.
    #[must_use]
    pub fn take_capture(&mut self) -> (CaptureBlock, CaptureBlock) {
        (
            std::mem::take(&mut self.stdout),
            std::mem::take(&mut self.stderr),
        )
    }

    /// Hand the filled capture blocks back after a redirect.
    pub fn put_capture(&mut self, stdout: CaptureBlock, stderr: CaptureBlock) {
        self.stdout = stdout;
        self.stderr = stderr;
    }

    /// Advance the state machine one legal step.
    ///
    /// State only moves forward; an illegal step is a driver bug.
    pub fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.may_step(next),
            "illegal run state step {} -> {} for '{}'",
            self.state,
            next,
            self.full_name,
        );
        self.state = next;
    }

    /// Record the start instant when the run is spawned.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Record elapsed time; called once, at finalization.
    pub fn stop(&mut self) {
        self.elapsed = self.started.map(|s| s.elapsed());
    }

    /// Record an issue. The first recorded issue wins; later ones on the
    /// same run (e.g. a teardown failure after an exec failure) are kept
    /// out of the diagnostic but never lose the run its first cause.
    pub fn raise(&mut self, outcome: Outcome, diag: Diagnostic) {
        if self.outcome == Outcome::Unknown {
            self.outcome = outcome;
            self.diag = Some(diag);
        }
    }

    /// Force the final outcome without a diagnostic (pass, or off).
    pub fn resolve(&mut self, outcome: Outcome) {
        if self.outcome == Outcome::Unknown {
            self.outcome = outcome;
        }
    }
}
