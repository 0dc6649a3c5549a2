//! JSONL event log.
//!
//! One JSON object per line, one line per finished run; made for log
//! aggregation rather than human eyes.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use gauntlet_core::{Outcome, Reporter, RunEvent, RunView};

use crate::ReportError;

/// Canonical JSONL record.
///
/// Required fields: `timestamp_ms`, `event`, `kind`, `name`, `outcome`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Milliseconds since the Unix epoch at emission time.
    pub timestamp_ms: u128,
    /// Always "done" for per-run records, "foot" for the final one.
    pub event: String,
    /// "test" or "suite".
    pub kind: String,
    /// Dotted full name.
    pub name: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_us: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
}

/// Validate one JSONL line against the schema.
pub fn validate_line(line: &str) -> Result<EventRecord, ReportError> {
    Ok(serde_json::from_str(line)?)
}

/// Writes [`EventRecord`]s to any sink, one per `Done` event.
pub struct JsonlReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonlReporter<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        JsonlReporter { out }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, record: &EventRecord) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(self.out, "{line}");
        }
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

impl<W: Write> Reporter for JsonlReporter<W> {
    fn event(&mut self, event: RunEvent, view: RunView<'_>) {
        if event != RunEvent::Done {
            return;
        }
        let record = EventRecord {
            timestamp_ms: now_ms(),
            event: "done".to_owned(),
            kind: view.run.kind().as_str().to_owned(),
            name: view.run.full_name().to_owned(),
            outcome: view.run.outcome().as_str().to_owned(),
            elapsed_us: view.run.elapsed().map(|e| e.as_micros()),
            why: view.run.diagnostic().map(|d| d.why.clone()),
        };
        self.emit(&record);
    }

    fn foot(&mut self, root: RunView<'_>, verdict: Outcome) {
        let record = EventRecord {
            timestamp_ms: now_ms(),
            event: "foot".to_owned(),
            kind: root.run.kind().as_str().to_owned(),
            name: root.run.full_name().to_owned(),
            outcome: verdict.as_str().to_owned(),
            elapsed_us: root.run.elapsed().map(|e| e.as_micros()),
            why: None,
        };
        self.emit(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_per_line() {
        let record = EventRecord {
            timestamp_ms: 1_700_000_000_000,
            event: "done".to_owned(),
            kind: "test".to_owned(),
            name: "root::leaf".to_owned(),
            outcome: "fail".to_owned(),
            elapsed_us: Some(250),
            why: Some("boom".to_owned()),
        };
        let line = serde_json::to_string(&record).unwrap();
        assert!(!line.contains('\n'));
        let back = validate_line(&line).unwrap();
        assert_eq!(back.name, "root::leaf");
        assert_eq!(back.why.as_deref(), Some("boom"));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        assert!(validate_line(r#"{"event":"done","kind":"test"}"#).is_err());
        assert!(validate_line("not json at all").is_err());
    }
}
