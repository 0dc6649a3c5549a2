//! Human-readable console renderer.

use std::io::Write;
use std::time::Duration;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use gauntlet_core::run::RunKind;
use gauntlet_core::{Outcome, Reporter, RunEvent, RunView};

/// How much the console says about passing runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Failures, crashes, and the summary only.
    Terse,
    /// One line per finished run.
    Verbose,
}

/// Renders the event stream onto a terminal.
pub struct ConsoleReporter {
    out: StandardStream,
    verbosity: Verbosity,
}

impl ConsoleReporter {
    #[must_use]
    pub fn stdout(verbosity: Verbosity, color: ColorChoice) -> Self {
        ConsoleReporter {
            out: StandardStream::stdout(color),
            verbosity,
        }
    }

    fn outcome_color(outcome: Outcome) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match outcome {
            Outcome::Pass => spec.set_fg(Some(Color::Green)),
            Outcome::Skip | Outcome::Off => spec.set_fg(Some(Color::Yellow)),
            Outcome::Fail | Outcome::Excp => spec.set_fg(Some(Color::Red)).set_bold(true),
            Outcome::Unknown => spec.set_fg(Some(Color::Magenta)),
        };
        spec
    }

    fn print_outcome(&mut self, outcome: Outcome) {
        let _ = self.out.set_color(&Self::outcome_color(outcome));
        let _ = write!(self.out, "{outcome}");
        let _ = self.out.reset();
    }

    fn print_test_line(&mut self, view: RunView<'_>) {
        let run = view.run;
        let _ = write!(self.out, "{} {} ", run.full_name(), dots(run.full_name(), 48));
        self.print_outcome(run.outcome());
        if let Some(elapsed) = run.elapsed() {
            let _ = write!(self.out, " ({})", human_duration(elapsed));
        }
        let _ = writeln!(self.out);
        if let Some(diag) = run.diagnostic() {
            let _ = writeln!(self.out, "    {}: {}", diag.what, diag.why);
            if let Some(origin) = &diag.origin {
                let _ = writeln!(self.out, "    at {origin}");
            }
            if let (Some(wanted), Some(found)) = (&diag.wanted, &diag.found) {
                let _ = writeln!(self.out, "    wanted: {wanted}");
                let _ = writeln!(self.out, "    found:  {found}");
            }
        }
    }
}

impl Reporter for ConsoleReporter {
    fn head(&mut self, root: RunView<'_>) {
        let _ = writeln!(self.out, "running {}", root.run.full_name());
    }

    fn event(&mut self, event: RunEvent, view: RunView<'_>) {
        if event != RunEvent::Done || view.run.kind() != RunKind::Test {
            return;
        }
        let interesting = !view.run.outcome().is_success();
        if self.verbosity == Verbosity::Verbose || interesting {
            self.print_test_line(view);
        }
    }

    fn foot(&mut self, root: RunView<'_>, verdict: Outcome) {
        let sums = root.sums.copied().unwrap_or_default();
        let _ = write!(
            self.out,
            "#### {}: {} passed, {} failed, {} crashed, {} skipped, {} off ({} total) -> ",
            root.run.full_name(),
            sums.pass,
            sums.fail,
            sums.excp,
            sums.skip,
            sums.total - sums.exec,
            sums.total,
        );
        self.print_outcome(verdict);
        match root.run.elapsed() {
            Some(elapsed) => {
                let _ = writeln!(self.out, " in {}", human_duration(elapsed));
            }
            None => {
                let _ = writeln!(self.out);
            }
        }
    }

    fn show(&mut self, view: RunView<'_>) {
        let marker = if view.run.is_off() { " (off)" } else { "" };
        let _ = writeln!(
            self.out,
            "{:indent$}{}{marker}",
            "",
            view.run.name(),
            indent = view.depth * 2
        );
    }
}

fn dots(name: &str, col: usize) -> String {
    ".".repeat(col.saturating_sub(name.len()).max(3))
}

fn human_duration(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else if elapsed.as_millis() >= 1 {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{}us", elapsed.as_micros())
    }
}
