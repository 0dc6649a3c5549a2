//! Event stream exposed to report renderers.

use crate::outcome::Outcome;
use crate::run::Run;
use crate::stats::Stats;

/// Progress milestone of one run.
///
/// `Done` fires exactly once per run, after its outcome and (for suites)
/// statistics are final; a parent's `Done` always fires after all its
/// children's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Init,
    Setup,
    Exec,
    Teardown,
    Done,
}

impl RunEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RunEvent::Init => "init",
            RunEvent::Setup => "setup",
            RunEvent::Exec => "exec",
            RunEvent::Teardown => "teardown",
            RunEvent::Done => "done",
        }
    }
}

/// Read-only view of a run handed to renderers.
#[derive(Clone, Copy)]
pub struct RunView<'a> {
    pub run: &'a Run,
    /// Direct-children counters; suites only, final at `Done`.
    pub stats: Option<&'a Stats>,
    /// Whole-subtree counters; suites only, final at `Done`.
    pub sums: Option<&'a Stats>,
    /// Nesting depth below the root.
    pub depth: usize,
}

/// Consumer of the ordered per-run event stream.
///
/// Renderers implement the callbacks they care about; all of them
/// default to doing nothing. Callbacks fire on the driver thread while
/// no capture redirection is active, so writing to the real standard
/// streams is safe.
pub trait Reporter {
    /// The root run is about to execute.
    fn head(&mut self, _root: RunView<'_>) {}

    /// A run reached a progress milestone.
    fn event(&mut self, _event: RunEvent, _view: RunView<'_>) {}

    /// The root run finished; `verdict` is the overall result.
    fn foot(&mut self, _root: RunView<'_>, _verdict: Outcome) {}

    /// Listing mode: one callback per run, pre-order, nothing executes.
    fn show(&mut self, _view: RunView<'_>) {}
}

/// Forwards every event to several reporters in order.
#[derive(Default)]
pub struct FanoutReporter<'r> {
    sinks: Vec<&'r mut dyn Reporter>,
}

impl<'r> FanoutReporter<'r> {
    #[must_use]
    pub fn new() -> Self {
        FanoutReporter { sinks: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, sink: &'r mut dyn Reporter) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl Reporter for FanoutReporter<'_> {
    fn head(&mut self, root: RunView<'_>) {
        for sink in &mut self.sinks {
            sink.head(root);
        }
    }

    fn event(&mut self, event: RunEvent, view: RunView<'_>) {
        for sink in &mut self.sinks {
            sink.event(event, view);
        }
    }

    fn foot(&mut self, root: RunView<'_>, verdict: Outcome) {
        for sink in &mut self.sinks {
            sink.foot(root, verdict);
        }
    }

    fn show(&mut self, view: RunView<'_>) {
        for sink in &mut self.sinks {
            sink.show(view);
        }
    }
}
