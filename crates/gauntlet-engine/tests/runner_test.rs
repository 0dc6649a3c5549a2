//! Driver behavior: outcomes, statistics, event ordering, filtering.

mod common;

use common::{Collector, engine_lock};

use gauntlet_core::run::RunKind;
use gauntlet_core::{Config, NameFilter, Outcome, RunEvent, SuiteCase, TestCase};
use gauntlet_engine::{fail, run, skip};

fn empty_body() {}

fn failing_body() {
    fail("broken on purpose");
}

fn skipping_body() {
    skip("disabled");
}

#[test]
fn empty_body_test_passes() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root").test(TestCase::new("empty", empty_body));
    let mut collector = Collector::new();
    let summary = run(&Config::new(), &root, &mut collector).unwrap();

    assert_eq!(summary.verdict, Outcome::Pass);
    assert!(summary.succeeded());
    assert_eq!(summary.stats.pass, 1);
    assert_eq!(summary.stats.exec, 1);
    assert_eq!(summary.stats.total, 1);

    let record = collector.record("root::empty");
    assert_eq!(record.outcome, Outcome::Pass);
    assert!(record.why.is_none());
}

#[test]
fn skip_carries_its_reason() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root").test(TestCase::new("skipped", skipping_body));
    let mut collector = Collector::new();
    let summary = run(&Config::new(), &root, &mut collector).unwrap();

    assert_eq!(summary.verdict, Outcome::Skip);
    assert!(summary.succeeded());
    let record = collector.record("root::skipped");
    assert_eq!(record.outcome, Outcome::Skip);
    assert_eq!(record.why.as_deref(), Some("disabled"));
    assert_eq!(record.what.as_deref(), Some("exec skipped"));
}

#[test]
fn one_failure_fails_the_suite_but_not_its_siblings() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root")
        .test(TestCase::new("first", empty_body))
        .test(TestCase::new("broken", failing_body))
        .test(TestCase::new("last", empty_body));
    let mut collector = Collector::new();
    let summary = run(&Config::new(), &root, &mut collector).unwrap();

    assert_eq!(summary.verdict, Outcome::Fail);
    assert!(!summary.succeeded());

    // Siblings after the failure still executed.
    assert_eq!(collector.record("root::first").outcome, Outcome::Pass);
    assert_eq!(collector.record("root::last").outcome, Outcome::Pass);

    let suite = collector.record("root");
    assert_eq!(suite.kind, RunKind::Suite);
    let stats = suite.stats.unwrap();
    assert_eq!(stats.pass, 2);
    assert_eq!(stats.fail, 1);
    assert_eq!(stats.exec, 3);
    assert_eq!(stats.total, 3);
    assert!(stats.balanced());
}

#[test]
fn nested_suites_aggregate_cumulatively() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root")
        .test(TestCase::new("top", empty_body))
        .suite(
            SuiteCase::new("inner")
                .test(TestCase::new("a", empty_body))
                .test(TestCase::new("b", failing_body)),
        );
    let mut collector = Collector::new();
    let summary = run(&Config::new(), &root, &mut collector).unwrap();

    assert_eq!(summary.verdict, Outcome::Fail);

    let inner = collector.record("root::inner");
    assert_eq!(inner.outcome, Outcome::Fail);
    let inner_stats = inner.stats.unwrap();
    assert_eq!((inner_stats.pass, inner_stats.fail), (1, 1));

    let root_record = collector.record("root");
    // Direct children: the test and the inner suite.
    let stats = root_record.stats.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.fail, 1);
    // Cumulative: every descendant, suites included.
    let sums = root_record.sums.unwrap();
    assert_eq!(sums.total, 4);
    assert_eq!(sums.pass, 2);
    assert_eq!(sums.fail, 2);
    assert_eq!(summary.stats.total, 4);
}

#[test]
fn event_stream_is_ordered_and_done_fires_once() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root").suite(
        SuiteCase::new("inner")
            .test(TestCase::new("a", empty_body))
            .test(TestCase::new("b", empty_body)),
    );
    let mut collector = Collector::new();
    run(&Config::new(), &root, &mut collector).unwrap();

    // Per-test event order.
    let a_events: Vec<RunEvent> = collector
        .events
        .iter()
        .filter(|(name, _)| name == "root::inner::a")
        .map(|(_, ev)| *ev)
        .collect();
    assert_eq!(
        a_events,
        [
            RunEvent::Init,
            RunEvent::Setup,
            RunEvent::Exec,
            RunEvent::Teardown,
            RunEvent::Done
        ]
    );

    // Done exactly once per run.
    for name in ["root", "root::inner", "root::inner::a", "root::inner::b"] {
        assert_eq!(collector.done_count(name), 1, "{name}");
    }

    // Parent Done strictly after every child's Done.
    let done_pos = |name: &str| {
        collector
            .events
            .iter()
            .position(|(n, ev)| n == name && *ev == RunEvent::Done)
            .unwrap()
    };
    assert!(done_pos("root::inner::a") < done_pos("root::inner"));
    assert!(done_pos("root::inner::b") < done_pos("root::inner"));
    assert!(done_pos("root::inner") < done_pos("root"));

    // Children execute in declaration order.
    assert!(done_pos("root::inner::a") < done_pos("root::inner::b"));
}

#[test]
fn name_filter_freezes_unmatched_runs_off() {
    let _guard = engine_lock();
    static ALPHA_RAN: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
    fn alpha_body() {
        ALPHA_RAN.store(true, std::sync::atomic::Ordering::Release);
    }

    let root = SuiteCase::new("root")
        .test(TestCase::new("alpha", alpha_body))
        .test(TestCase::new("beta", empty_body));
    let filter = NameFilter::new("beta", false).unwrap();
    let config = Config::new().with_filter(filter);
    let mut collector = Collector::new();
    let summary = run(&config, &root, &mut collector).unwrap();

    assert_eq!(summary.verdict, Outcome::Pass);
    assert!(!ALPHA_RAN.load(std::sync::atomic::Ordering::Acquire));
    assert_eq!(collector.record("root::alpha").outcome, Outcome::Off);
    assert_eq!(collector.record("root::beta").outcome, Outcome::Pass);

    // Off children count toward total only.
    let stats = collector.record("root").stats.unwrap();
    assert_eq!(stats.exec, 1);
    assert_eq!(stats.total, 2);
}

#[test]
fn fully_filtered_tree_is_off_and_successful() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root").test(TestCase::new("only", empty_body));
    let filter = NameFilter::new("no such test", false).unwrap();
    let config = Config::new().with_filter(filter);
    let mut collector = Collector::new();
    let summary = run(&config, &root, &mut collector).unwrap();

    assert_eq!(summary.verdict, Outcome::Off);
    assert!(summary.succeeded());
    // Even off runs get their Done event.
    assert_eq!(collector.done_count("root::only"), 1);
}

#[test]
fn all_skipped_suite_is_skip() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root")
        .test(TestCase::new("one", skipping_body))
        .test(TestCase::new("two", skipping_body));
    let mut collector = Collector::new();
    let summary = run(&Config::new(), &root, &mut collector).unwrap();
    assert_eq!(summary.verdict, Outcome::Skip);
    assert_eq!(collector.record("root").outcome, Outcome::Skip);
}

#[test]
fn empty_suite_passes() {
    let _guard = engine_lock();
    let root = SuiteCase::new("root");
    let mut collector = Collector::new();
    let summary = run(&Config::new(), &root, &mut collector).unwrap();
    assert_eq!(summary.verdict, Outcome::Pass);
}

#[test]
fn listing_mode_walks_without_executing() {
    let _guard = engine_lock();
    static LISTED_RAN: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
    fn listed_body() {
        LISTED_RAN.store(true, std::sync::atomic::Ordering::Release);
    }

    #[derive(Default)]
    struct Names(Vec<String>);
    impl gauntlet_core::Reporter for Names {
        fn show(&mut self, view: gauntlet_core::RunView<'_>) {
            self.0.push(view.run.full_name().to_owned());
        }
    }

    let root = SuiteCase::new("root").test(TestCase::new("listed", listed_body));
    let mut names = Names::default();
    gauntlet_engine::show(&Config::new(), &root, &mut names);
    assert_eq!(names.0, ["root", "root::listed"]);
    assert!(!LISTED_RAN.load(std::sync::atomic::Ordering::Acquire));
}
