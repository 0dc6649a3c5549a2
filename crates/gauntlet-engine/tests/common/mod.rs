//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use parking_lot::{Mutex, MutexGuard};

use gauntlet_core::run::RunKind;
use gauntlet_core::{Outcome, Reporter, RunEvent, RunView, Stats};

static ENGINE_LOCK: Mutex<()> = Mutex::new(());

/// The engine owns process-wide resources (descriptors 1/2, signal
/// dispositions, the interval timer); trees execute one at a time.
pub fn engine_lock() -> MutexGuard<'static, ()> {
    ENGINE_LOCK.lock()
}

/// Snapshot of one finished run, taken at its `Done` event.
#[derive(Debug, Clone)]
pub struct DoneRecord {
    pub full_name: String,
    pub kind: RunKind,
    pub outcome: Outcome,
    pub what: Option<String>,
    pub why: Option<String>,
    pub wanted: Option<String>,
    pub found: Option<String>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed_ms: Option<u128>,
    pub stats: Option<Stats>,
    pub sums: Option<Stats>,
}

/// Reporter recording the full event stream plus a `DoneRecord` per run.
#[derive(Debug, Default)]
pub struct Collector {
    pub events: Vec<(String, RunEvent)>,
    pub done: Vec<DoneRecord>,
}

impl Collector {
    pub fn new() -> Self {
        Collector::default()
    }

    pub fn record(&self, full_name: &str) -> &DoneRecord {
        self.done
            .iter()
            .find(|r| r.full_name == full_name)
            .unwrap_or_else(|| panic!("no Done record for '{full_name}'"))
    }

    pub fn done_count(&self, full_name: &str) -> usize {
        self.done.iter().filter(|r| r.full_name == full_name).count()
    }
}

impl Reporter for Collector {
    fn event(&mut self, event: RunEvent, view: RunView<'_>) {
        self.events
            .push((view.run.full_name().to_owned(), event));
        if event == RunEvent::Done {
            let diag = view.run.diagnostic();
            self.done.push(DoneRecord {
                full_name: view.run.full_name().to_owned(),
                kind: view.run.kind(),
                outcome: view.run.outcome(),
                what: diag.map(|d| d.what.clone()),
                why: diag.map(|d| d.why.clone()),
                wanted: diag.and_then(|d| d.wanted.clone()),
                found: diag.and_then(|d| d.found.clone()),
                stdout: view.run.stdout().to_bytes(),
                stderr: view.run.stderr().to_bytes(),
                elapsed_ms: view.run.elapsed().map(|e| e.as_millis()),
                stats: view.stats.copied(),
                sums: view.sums.copied(),
            });
        }
    }
}

/// Raw write to a file descriptor, bypassing the test harness's output
/// capture so the bytes actually travel through the redirected fd.
pub fn raw_write(fd: i32, bytes: &[u8]) {
    unsafe { libc::write(fd, bytes.as_ptr().cast(), bytes.len()) };
}
