//! Sequential run-tree driver.
//!
//! One thread walks the tree depth-first with an explicit stack,
//! executing test phases under containment and capture, aggregating
//! suite statistics on the way back up, and feeding the reporter event
//! stream. A suite's `Done` always fires after all of its children's.

use gauntlet_core::run::Diagnostic;
use gauntlet_core::tree::NodePayload;
use gauntlet_core::{
    Config, Outcome, Reporter, RunEvent, RunId, RunState, RunTree, RunView, Stats, SuiteCase,
    TestFn,
};

use crate::contain::{Phase, PhaseResult, run_phase};
use crate::context::EngineContext;
use crate::{EngineError, mock};

/// Result of one whole-tree execution.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Overall outcome; success means pass, skip, or everything off.
    pub verdict: Outcome,
    /// Cumulative counters over every descendant of the root.
    pub stats: Stats,
}

impl RunSummary {
    /// Exit-status mapping of the verdict.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.verdict.is_success()
    }
}

/// Execute `root` under `config`, streaming events into `reporter`.
pub fn run(
    config: &Config,
    root: &SuiteCase,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary, EngineError> {
    let ctx = EngineContext::init(config)?;
    let mut tree = RunTree::build(root, config.filter.as_ref());

    reporter.head(view(&tree, tree.root(), 0));
    walk(&ctx, &mut tree, reporter)?;
    let verdict = tree.verdict();
    let stats = tree
        .suite_stats(tree.root())
        .map(|(_, sums)| *sums)
        .unwrap_or_default();
    reporter.foot(view(&tree, tree.root(), 0), verdict);
    tree.retire();
    drop(ctx);
    Ok(RunSummary { verdict, stats })
}

/// Listing mode: emit one `show` callback per run, pre-order, without
/// executing anything.
pub fn show(config: &Config, root: &SuiteCase, reporter: &mut dyn Reporter) {
    let tree = RunTree::build(root, config.filter.as_ref());
    for (id, depth) in tree.preorder() {
        reporter.show(view(&tree, id, depth));
    }
}

enum Step {
    Enter(RunId, usize),
    Leave(RunId, usize),
}

fn walk(
    ctx: &EngineContext,
    tree: &mut RunTree<'_>,
    reporter: &mut dyn Reporter,
) -> Result<(), EngineError> {
    let mut stack = vec![Step::Enter(tree.root(), 0)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id, depth) => {
                reporter.event(RunEvent::Init, view(tree, id, depth));
                let is_test = matches!(tree.node(id).payload, NodePayload::Test { .. });
                if is_test {
                    exec_test(ctx, tree, id, depth, reporter)?;
                } else {
                    if !tree.run(id).is_off() {
                        tree.run_mut(id).start();
                        tree.run_mut(id).advance(RunState::Setup);
                        reporter.event(RunEvent::Setup, view(tree, id, depth));
                        tree.run_mut(id).advance(RunState::Exec);
                        reporter.event(RunEvent::Exec, view(tree, id, depth));
                    }
                    stack.push(Step::Leave(id, depth));
                    for child in tree.children(id).iter().rev() {
                        stack.push(Step::Enter(*child, depth + 1));
                    }
                }
            }
            Step::Leave(id, depth) => {
                let off = tree.run(id).is_off();
                if !off {
                    tree.run_mut(id).advance(RunState::Teardown);
                    reporter.event(RunEvent::Teardown, view(tree, id, depth));
                } else {
                    tree.run_mut(id).resolve(Outcome::Off);
                }
                tree.aggregate(id);
                tree.run_mut(id).stop();
                tree.run_mut(id).advance(RunState::Done);
                reporter.event(RunEvent::Done, view(tree, id, depth));
            }
        }
    }
    Ok(())
}

fn exec_test(
    ctx: &EngineContext,
    tree: &mut RunTree<'_>,
    id: RunId,
    depth: usize,
    reporter: &mut dyn Reporter,
) -> Result<(), EngineError> {
    if tree.run(id).is_off() {
        tree.run_mut(id).resolve(Outcome::Off);
        tree.run_mut(id).advance(RunState::Done);
        reporter.event(RunEvent::Done, view(tree, id, depth));
        return Ok(());
    }

    mock::reset();
    tree.run_mut(id).start();
    tree.run_mut(id).advance(RunState::Setup);
    reporter.event(RunEvent::Setup, view(tree, id, depth));

    let mut setup_ok = true;
    if let Some(setup) = tree.run(id).resolved_setup() {
        setup_ok = phase(ctx, tree, id, Phase::Setup, setup)?;
    }
    if setup_ok {
        tree.run_mut(id).advance(RunState::Exec);
        reporter.event(RunEvent::Exec, view(tree, id, depth));
        let body = match tree.node(id).payload {
            NodePayload::Test { case } => case.body(),
            NodePayload::Suite { .. } => unreachable!("exec_test on a suite node"),
        };
        phase(ctx, tree, id, Phase::Exec, body)?;

        // Teardown runs whenever setup completed, even after an exec
        // issue; a failed setup skips it entirely.
        tree.run_mut(id).advance(RunState::Teardown);
        reporter.event(RunEvent::Teardown, view(tree, id, depth));
        if let Some(teardown) = tree.run(id).resolved_teardown() {
            phase(ctx, tree, id, Phase::Teardown, teardown)?;
        }
    }

    finalize_test(tree, id);
    tree.run_mut(id).advance(RunState::Done);
    reporter.event(RunEvent::Done, view(tree, id, depth));
    Ok(())
}

/// Execute one phase with capture redirected into the run's blocks.
///
/// Returns whether the phase completed without an issue; engine-internal
/// failures (not test failures) surface as errors.
fn phase(
    ctx: &EngineContext,
    tree: &mut RunTree<'_>,
    id: RunId,
    phase: Phase,
    body: TestFn,
) -> Result<bool, EngineError> {
    let (stdout, stderr) = tree.run_mut(id).take_capture();
    ctx.capture().begin_redirect(stdout, stderr)?;

    let timeout = tree.run(id).resolved_timeout();
    let result = run_phase(ctx.debug(), timeout, phase, body);

    // Restore the real descriptors before looking at the result so a
    // containment error cannot leave the process redirected.
    let (stdout, stderr) = ctx.capture().end_redirect()?;
    tree.run_mut(id).put_capture(stdout, stderr);

    match result? {
        PhaseResult::Completed => Ok(true),
        PhaseResult::Aborted { outcome, diag } => {
            tree.run_mut(id).raise(outcome, diag);
            Ok(false)
        }
    }
}

fn finalize_test(tree: &mut RunTree<'_>, id: RunId) {
    let clean = tree.run(id).outcome() == Outcome::Unknown;
    let leftover = mock::release(clean);
    if clean {
        if let Some(diag) = leftover {
            tree.run_mut(id).raise(Outcome::Fail, diag);
        } else if mock::take_armed_assertion() {
            tree.run_mut(id).raise(
                Outcome::Fail,
                Diagnostic::new("assertion check failed", "assertion trap left armed"),
            );
        } else {
            tree.run_mut(id).resolve(Outcome::Pass);
        }
    }
    tree.run_mut(id).stop();
}

fn view<'t>(tree: &'t RunTree<'_>, id: RunId, depth: usize) -> RunView<'t> {
    let (stats, sums) = match tree.suite_stats(id) {
        Some((stats, sums)) => (Some(stats), Some(sums)),
        None => (None, None),
    };
    RunView {
        run: tree.run(id),
        stats,
        sums,
        depth,
    }
}
