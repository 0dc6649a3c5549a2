//! TAP (Test Anything Protocol) renderer, version 14, trailing plan.

use std::io::Write;

use gauntlet_core::run::RunKind;
use gauntlet_core::{Outcome, Reporter, RunEvent, RunView};

/// Streams one TAP line per finished test; suites appear as comments.
pub struct TapReporter<W: Write> {
    out: W,
    count: usize,
}

impl<W: Write> TapReporter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        TapReporter { out, count: 0 }
    }

    /// Hand the sink back, e.g. to inspect a buffer in tests.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn test_line(&mut self, view: RunView<'_>) {
        self.count += 1;
        let nr = self.count;
        let run = view.run;
        let line = match run.outcome() {
            Outcome::Pass => format!("ok {nr} - {}", run.full_name()),
            Outcome::Skip => format!(
                "ok {nr} - {} # SKIP {}",
                run.full_name(),
                run.diagnostic().map_or("", |d| d.why.as_str())
            ),
            Outcome::Off => format!("ok {nr} - {} # SKIP filtered out", run.full_name()),
            _ => format!("not ok {nr} - {}", run.full_name()),
        };
        let _ = writeln!(self.out, "{line}");
        if !run.outcome().is_success()
            && let Some(diag) = run.diagnostic()
        {
            let _ = writeln!(self.out, "# {}: {}", diag.what, diag.why);
            if let (Some(wanted), Some(found)) = (&diag.wanted, &diag.found) {
                let _ = writeln!(self.out, "# wanted: {wanted}");
                let _ = writeln!(self.out, "# found:  {found}");
            }
        }
    }
}

impl<W: Write> Reporter for TapReporter<W> {
    fn head(&mut self, _root: RunView<'_>) {
        let _ = writeln!(self.out, "TAP version 14");
    }

    fn event(&mut self, event: RunEvent, view: RunView<'_>) {
        if event != RunEvent::Done {
            return;
        }
        match view.run.kind() {
            RunKind::Test => self.test_line(view),
            RunKind::Suite => {
                let _ = writeln!(self.out, "# suite {} {}", view.run.full_name(), view.run.outcome());
            }
        }
    }

    fn foot(&mut self, _root: RunView<'_>, _verdict: Outcome) {
        let _ = writeln!(self.out, "1..{}", self.count);
    }
}
