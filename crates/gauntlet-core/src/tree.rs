//! Arena-backed live run tree.
//!
//! One [`Run`] per descriptor, laid out pre-order in a flat arena with
//! index-based child links. Fixture and timeout inheritance is resolved
//! against the ancestor chain during construction; the descriptor tree
//! itself is never touched again afterwards.

use std::time::Duration;

use crate::base::{Base, DEFAULT_TIMEOUT, Fixture, SuiteCase, TestCase, TestFn, TimeoutSpec};
use crate::filter::NameFilter;
use crate::outcome::Outcome;
use crate::run::{Run, RunKind};
use crate::state::RunState;
use crate::stats::Stats;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(usize);

impl RunId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One arena slot: the run plus its tree links and, for suites, the
/// statistics records.
#[derive(Debug)]
pub struct RunNode<'d> {
    pub run: Run,
    /// Kept for lookup only; ownership flows root-down through `children`.
    pub parent: Option<RunId>,
    pub payload: NodePayload<'d>,
}

#[derive(Debug)]
pub enum NodePayload<'d> {
    Test {
        case: &'d TestCase,
    },
    Suite {
        case: &'d SuiteCase,
        /// Child array, fixed at construction, in declaration order.
        children: Vec<RunId>,
        /// Direct-children counters.
        stats: Stats,
        /// Whole-subtree counters.
        sums: Stats,
    },
}

/// Values a child inherits from its ancestor chain, fully resolved.
#[derive(Debug, Clone, Copy)]
struct Inherited {
    setup: Option<TestFn>,
    teardown: Option<TestFn>,
    timeout: Option<Duration>,
}

impl Inherited {
    const ROOT: Inherited = Inherited {
        setup: None,
        teardown: None,
        timeout: Some(DEFAULT_TIMEOUT),
    };
}

fn resolve_fixture(slot: Fixture, inherited: Option<TestFn>) -> Option<TestFn> {
    match slot {
        Fixture::Inherit => inherited,
        Fixture::None => None,
        Fixture::Explicit(f) => Some(f),
    }
}

fn resolve_timeout(slot: TimeoutSpec, inherited: Option<Duration>) -> Option<Duration> {
    match slot {
        TimeoutSpec::Inherit => inherited,
        TimeoutSpec::None => None,
        TimeoutSpec::Explicit(t) => Some(t),
    }
}

/// The live tree for one execution of a descriptor root.
#[derive(Debug)]
pub struct RunTree<'d> {
    nodes: Vec<RunNode<'d>>,
}

impl<'d> RunTree<'d> {
    /// Instantiate the whole tree pre-order and apply the name filter.
    ///
    /// A node stays live when its full name matches the filter or any
    /// descendant's does; everything else freezes at `Off`.
    #[must_use]
    pub fn build(root: &'d SuiteCase, filter: Option<&NameFilter>) -> Self {
        let mut tree = RunTree { nodes: Vec::new() };
        tree.add_suite(root, None);
        if let Some(filter) = filter {
            tree.apply_filter(filter);
        }
        tree
    }

    fn add_suite(&mut self, case: &'d SuiteCase, parent: Option<RunId>) -> RunId {
        let (full_name, inherited) = self.child_context(parent, case.name());
        let own = Inherited {
            setup: resolve_fixture(case.setup(), inherited.setup),
            teardown: resolve_fixture(case.teardown(), inherited.teardown),
            timeout: resolve_timeout(case.timeout(), inherited.timeout),
        };
        let id = RunId(self.nodes.len());
        self.nodes.push(RunNode {
            run: Run::new(
                case.name().to_owned(),
                full_name,
                RunKind::Suite,
                false,
                own.setup,
                own.teardown,
                own.timeout,
            ),
            parent,
            payload: NodePayload::Suite {
                case,
                children: Vec::with_capacity(case.children().len()),
                stats: Stats::new(),
                sums: Stats::new(),
            },
        });
        for child in case.children() {
            let child_id = match child {
                Base::Test(test) => self.add_test(test, id),
                Base::Suite(suite) => self.add_suite(suite, Some(id)),
            };
            if let NodePayload::Suite { children, .. } = &mut self.nodes[id.0].payload {
                children.push(child_id);
            }
        }
        id
    }

    fn add_test(&mut self, case: &'d TestCase, parent: RunId) -> RunId {
        let (full_name, inherited) = self.child_context(Some(parent), case.name());
        let id = RunId(self.nodes.len());
        self.nodes.push(RunNode {
            run: Run::new(
                case.name().to_owned(),
                full_name,
                RunKind::Test,
                false,
                resolve_fixture(case.setup(), inherited.setup),
                resolve_fixture(case.teardown(), inherited.teardown),
                resolve_timeout(case.timeout(), inherited.timeout),
            ),
            parent: Some(parent),
            payload: NodePayload::Test { case },
        });
        id
    }

    fn child_context(&self, parent: Option<RunId>, name: &str) -> (String, Inherited) {
        match parent {
            None => (name.to_owned(), Inherited::ROOT),
            Some(pid) => {
                let parent_run = &self.nodes[pid.0].run;
                let full = format!("{}::{name}", parent_run.full_name());
                (
                    full,
                    Inherited {
                        setup: parent_run.resolved_setup(),
                        teardown: parent_run.resolved_teardown(),
                        timeout: parent_run.resolved_timeout(),
                    },
                )
            }
        }
    }

    /// Freeze filtered-out subtrees at `Off`.
    ///
    /// Pre-order layout guarantees children sit at higher indices than
    /// their parent, so one reverse pass computes subtree liveness
    /// bottom-up without recursion.
    fn apply_filter(&mut self, filter: &NameFilter) {
        let mut live = vec![false; self.nodes.len()];
        for idx in (0..self.nodes.len()).rev() {
            let mut alive = filter.matches(self.nodes[idx].run.full_name());
            if let NodePayload::Suite { children, .. } = &self.nodes[idx].payload {
                alive = alive || children.iter().any(|c| live[c.0]);
            }
            live[idx] = alive;
        }
        for (idx, alive) in live.iter().enumerate() {
            if !alive {
                let old = &self.nodes[idx].run;
                let frozen = Run::new(
                    old.name().to_owned(),
                    old.full_name().to_owned(),
                    old.kind(),
                    true,
                    None,
                    None,
                    None,
                );
                self.nodes[idx].run = frozen;
            }
        }
    }

    #[must_use]
    pub fn root(&self) -> RunId {
        RunId(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: RunId) -> &RunNode<'d> {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn node_mut(&mut self, id: RunId) -> &mut RunNode<'d> {
        &mut self.nodes[id.0]
    }

    #[must_use]
    pub fn run(&self, id: RunId) -> &Run {
        &self.nodes[id.0].run
    }

    #[must_use]
    pub fn run_mut(&mut self, id: RunId) -> &mut Run {
        &mut self.nodes[id.0].run
    }

    /// Child ids of a suite node; empty for tests.
    #[must_use]
    pub fn children(&self, id: RunId) -> &[RunId] {
        match &self.nodes[id.0].payload {
            NodePayload::Suite { children, .. } => children,
            NodePayload::Test { .. } => &[],
        }
    }

    /// Direct and cumulative statistics of a suite node.
    #[must_use]
    pub fn suite_stats(&self, id: RunId) -> Option<(&Stats, &Stats)> {
        match &self.nodes[id.0].payload {
            NodePayload::Suite { stats, sums, .. } => Some((stats, sums)),
            NodePayload::Test { .. } => None,
        }
    }

    /// Aggregate one finalized suite from its direct children.
    ///
    /// Only legal once every child has reached `Done`; derives the suite
    /// outcome from the direct-children counters.
    pub fn aggregate(&mut self, id: RunId) {
        let child_ids: Vec<RunId> = self.children(id).to_vec();
        let mut stats = Stats::new();
        let mut sums = Stats::new();
        for child_id in child_ids {
            let child = &self.nodes[child_id.0];
            debug_assert!(child.run.outcome().is_final());
            stats.account(child.run.outcome());
            sums.account(child.run.outcome());
            if let NodePayload::Suite {
                sums: child_sums, ..
            } = &child.payload
            {
                sums.merge(child_sums);
            }
        }
        let outcome = derive_suite_outcome(&stats);
        if let NodePayload::Suite {
            stats: slot_stats,
            sums: slot_sums,
            ..
        } = &mut self.nodes[id.0].payload
        {
            *slot_stats = stats;
            *slot_sums = sums;
        }
        self.nodes[id.0].run.resolve(outcome);
    }

    /// Overall verdict of the finished tree.
    #[must_use]
    pub fn verdict(&self) -> Outcome {
        self.nodes[0].run.outcome()
    }

    /// Post-order retirement once every report event has fired.
    pub fn retire(&mut self) {
        for node in self.nodes.iter_mut().rev() {
            if node.run.state() == RunState::Done {
                node.run.advance(RunState::Fini);
            }
        }
    }

    /// Pre-order walk handing out `(id, depth)` pairs, explicit stack.
    #[must_use]
    pub fn preorder(&self) -> Vec<(RunId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root(), 0)];
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for child in self.children(id).iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }
}

fn derive_suite_outcome(stats: &Stats) -> Outcome {
    if stats.fail > 0 || stats.excp > 0 {
        Outcome::Fail
    } else if stats.exec > 0 && stats.skip == stats.exec {
        Outcome::Skip
    } else if stats.exec == 0 && stats.total > 0 {
        Outcome::Off
    } else {
        // Some child passed, or the suite was empty.
        Outcome::Pass
    }
}
