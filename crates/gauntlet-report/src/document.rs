//! Machine-readable report document.
//!
//! A `DocumentBuilder` listens to the event stream and reconstructs the
//! finished tree as serde records; `Done` events arrive children-first,
//! so a frame stack is enough to reattach them.

use serde::{Deserialize, Serialize};

use gauntlet_core::run::RunKind;
use gauntlet_core::{Outcome, Reporter, RunEvent, RunView, Stats};

use crate::ReportError;

/// Counter snapshot of one suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub pass: u32,
    pub skip: u32,
    pub fail: u32,
    pub excp: u32,
    pub exec: u32,
    pub total: u32,
}

impl From<&Stats> for StatsRecord {
    fn from(stats: &Stats) -> Self {
        StatsRecord {
            pass: stats.pass,
            skip: stats.skip,
            fail: stats.fail,
            excp: stats.excp,
            exec: stats.exec,
            total: stats.total,
        }
    }
}

/// One finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub name: String,
    pub full_name: String,
    pub kind: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wanted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sums: Option<StatsRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RunRecord>,
}

/// Whole-run report document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Schema version.
    pub version: String,
    pub verdict: String,
    pub stats: StatsRecord,
    pub root: RunRecord,
}

pub const DOCUMENT_VERSION: &str = "v1";

impl ReportDocument {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn record_of(view: RunView<'_>) -> RunRecord {
    let run = view.run;
    let diag = run.diagnostic();
    RunRecord {
        name: run.name().to_owned(),
        full_name: run.full_name().to_owned(),
        kind: run.kind().as_str().to_owned(),
        outcome: run.outcome().as_str().to_owned(),
        elapsed_us: run.elapsed().map(|e| e.as_micros()),
        what: diag.map(|d| d.what.clone()),
        why: diag.map(|d| d.why.clone()),
        origin: diag.and_then(|d| d.origin.as_ref()).map(|o| o.to_string()),
        wanted: diag.and_then(|d| d.wanted.clone()),
        found: diag.and_then(|d| d.found.clone()),
        stdout: non_empty_text(run.stdout().to_text()),
        stderr: non_empty_text(run.stderr().to_text()),
        stats: view.stats.map(StatsRecord::from),
        sums: view.sums.map(StatsRecord::from),
        children: Vec::new(),
    }
}

fn non_empty_text(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Collects the event stream into a [`ReportDocument`].
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    frames: Vec<Vec<RunRecord>>,
    root: Option<RunRecord>,
    verdict: Outcome,
    sums: Option<StatsRecord>,
}

impl DocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        DocumentBuilder::default()
    }

    fn attach(&mut self, record: RunRecord) {
        match self.frames.last_mut() {
            Some(frame) => frame.push(record),
            None => self.root = Some(record),
        }
    }

    /// Consume the builder once the run is over.
    pub fn finish(self) -> Result<ReportDocument, ReportError> {
        let root = self.root.ok_or(ReportError::Incomplete)?;
        let stats = self
            .sums
            .or(root.sums)
            .ok_or(ReportError::Incomplete)?;
        Ok(ReportDocument {
            version: DOCUMENT_VERSION.to_owned(),
            verdict: self.verdict.as_str().to_owned(),
            stats,
            root,
        })
    }
}

impl Reporter for DocumentBuilder {
    fn event(&mut self, event: RunEvent, view: RunView<'_>) {
        match (event, view.run.kind()) {
            (RunEvent::Init, RunKind::Suite) => self.frames.push(Vec::new()),
            (RunEvent::Done, RunKind::Test) => self.attach(record_of(view)),
            (RunEvent::Done, RunKind::Suite) => {
                let children = self.frames.pop().unwrap_or_default();
                let mut record = record_of(view);
                record.children = children;
                self.attach(record);
            }
            _ => {}
        }
    }

    fn foot(&mut self, root: RunView<'_>, verdict: Outcome) {
        self.verdict = verdict;
        self.sums = root.sums.map(StatsRecord::from);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_record_mirrors_counters() {
        let mut stats = Stats::new();
        stats.account(Outcome::Pass);
        stats.account(Outcome::Fail);
        let record = StatsRecord::from(&stats);
        assert_eq!(record.pass, 1);
        assert_eq!(record.fail, 1);
        assert_eq!(record.exec, 2);
        assert_eq!(record.total, 2);
    }

    #[test]
    fn document_round_trips_through_json() {
        let document = ReportDocument {
            version: DOCUMENT_VERSION.to_owned(),
            verdict: "fail".to_owned(),
            stats: StatsRecord {
                pass: 1,
                skip: 0,
                fail: 1,
                excp: 0,
                exec: 2,
                total: 2,
            },
            root: RunRecord {
                name: "root".to_owned(),
                full_name: "root".to_owned(),
                kind: "suite".to_owned(),
                outcome: "fail".to_owned(),
                elapsed_us: Some(1200),
                what: None,
                why: None,
                origin: None,
                wanted: None,
                found: None,
                stdout: None,
                stderr: None,
                stats: None,
                sums: None,
                children: vec![RunRecord {
                    name: "leaf".to_owned(),
                    full_name: "root::leaf".to_owned(),
                    kind: "test".to_owned(),
                    outcome: "fail".to_owned(),
                    elapsed_us: None,
                    what: Some("exec failed".to_owned()),
                    why: Some("boom".to_owned()),
                    origin: None,
                    wanted: None,
                    found: None,
                    stdout: Some("hello".to_owned()),
                    stderr: None,
                    stats: None,
                    sums: None,
                    children: Vec::new(),
                }],
            },
        };
        let json = document.to_json().unwrap();
        let back = ReportDocument::from_json(&json).unwrap();
        assert_eq!(back.verdict, "fail");
        assert_eq!(back.root.children.len(), 1);
        assert_eq!(back.root.children[0].why.as_deref(), Some("boom"));
    }

    #[test]
    fn empty_optionals_are_omitted_from_json() {
        let record = RunRecord {
            name: "t".to_owned(),
            full_name: "root::t".to_owned(),
            kind: "test".to_owned(),
            outcome: "pass".to_owned(),
            elapsed_us: None,
            what: None,
            why: None,
            origin: None,
            wanted: None,
            found: None,
            stdout: None,
            stderr: None,
            stats: None,
            sums: None,
            children: Vec::new(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("why"));
        assert!(!json.contains("children"));
        assert!(!json.contains("stdout"));
    }

    #[test]
    fn unfinished_builder_reports_incomplete() {
        let builder = DocumentBuilder::new();
        assert!(matches!(builder.finish(), Err(ReportError::Incomplete)));
    }
}
