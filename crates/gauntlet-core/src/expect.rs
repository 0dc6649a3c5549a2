//! FIFO mock-expectation queue.
//!
//! Tests schedule expectations against named functions; the mocked
//! functions consume them in scheduling order. Any expectation still
//! queued when the owning run finalizes is itself a failure.

use std::collections::VecDeque;
use std::fmt;

use thiserror::Error;

use crate::assess::{self, Comparator, Expected, Value};

/// Source position an expectation (or an abort) was raised from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub file: String,
    pub line: u32,
}

impl SourceInfo {
    /// Capture the caller's position; meant to be used from
    /// `#[track_caller]` entry points.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        SourceInfo {
            file: loc.file().to_owned(),
            line: loc.line(),
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// What a scheduled expectation requires from the mocked call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectKind {
    /// The function must simply be called.
    Call,
    /// A named parameter of the call must satisfy the comparison.
    Parm {
        parm: String,
        comparator: Comparator,
        expected: Expected,
    },
    /// The mocked function must return this scheduled value.
    Retval { value: Value },
}

impl ExpectKind {
    const fn label(&self) -> &'static str {
        match self {
            ExpectKind::Call => "call",
            ExpectKind::Parm { .. } => "parameter",
            ExpectKind::Retval { .. } => "return value",
        }
    }
}

/// One scheduled expectation.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    /// Target function name.
    pub func: String,
    pub kind: ExpectKind,
    /// Where the expectation was scheduled from.
    pub origin: SourceInfo,
}

/// Why a mock check could not be satisfied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpectError {
    #[error("empty mock expectation queue while checking '{func}'")]
    Empty { func: String },
    #[error("mock expectation function mismatch: scheduled '{scheduled}' at {origin}, checked '{checked}'")]
    FuncMismatch {
        scheduled: String,
        checked: String,
        origin: SourceInfo,
    },
    #[error("mock expectation kind mismatch for '{func}': scheduled {scheduled} at {origin}, checked {checked}")]
    KindMismatch {
        func: String,
        scheduled: &'static str,
        checked: &'static str,
        origin: SourceInfo,
    },
    #[error("mock expectation parameter mismatch for '{func}': scheduled '{scheduled}' at {origin}, checked '{checked}'")]
    ParmMismatch {
        func: String,
        scheduled: String,
        checked: String,
        origin: SourceInfo,
    },
    #[error("mock expectation value mismatch for '{func}.{parm}'")]
    ValueMismatch {
        func: String,
        parm: String,
        wanted: String,
        found: String,
        origin: SourceInfo,
    },
    #[error("mock expectation comparison broken for '{func}': {source}")]
    Broken {
        func: String,
        origin: SourceInfo,
        source: assess::CompareError,
    },
    #[error("extra mock expectation left")]
    Leftover {
        func: String,
        origin: SourceInfo,
        count: usize,
    },
}

impl ExpectError {
    /// Scheduling position of the expectation involved, when one was.
    #[must_use]
    pub fn origin(&self) -> Option<&SourceInfo> {
        match self {
            ExpectError::Empty { .. } => None,
            ExpectError::FuncMismatch { origin, .. }
            | ExpectError::KindMismatch { origin, .. }
            | ExpectError::ParmMismatch { origin, .. }
            | ExpectError::ValueMismatch { origin, .. }
            | ExpectError::Broken { origin, .. }
            | ExpectError::Leftover { origin, .. } => Some(origin),
        }
    }
}

/// Ordered queue of scheduled expectations for the current run.
#[derive(Debug, Default)]
pub struct ExpectQueue {
    queue: VecDeque<Expectation>,
    released: bool,
}

impl ExpectQueue {
    #[must_use]
    pub const fn new() -> Self {
        ExpectQueue {
            queue: VecDeque::new(),
            released: false,
        }
    }

    /// Append to the FIFO tail.
    pub fn schedule(&mut self, expectation: Expectation) {
        self.released = false;
        self.queue.push_back(expectation);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop everything; used when a new run starts.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.released = false;
    }

    /// Consume the head for a call-only expectation.
    pub fn check_call(&mut self, func: &str) -> Result<(), ExpectError> {
        let head = self.pop(func)?;
        match head.kind {
            ExpectKind::Call => Ok(()),
            other => Err(ExpectError::KindMismatch {
                func: head.func,
                scheduled: other.label(),
                checked: "call",
                origin: head.origin,
            }),
        }
    }

    /// Consume the head for a parameter expectation and evaluate it
    /// against the observed value.
    pub fn check_parm(
        &mut self,
        func: &str,
        parm: &str,
        observed: &Value,
    ) -> Result<(), ExpectError> {
        let head = self.pop(func)?;
        let scheduled_label = head.kind.label();
        let ExpectKind::Parm {
            parm: scheduled_parm,
            comparator,
            expected,
        } = head.kind
        else {
            return Err(ExpectError::KindMismatch {
                func: head.func,
                scheduled: scheduled_label,
                checked: "parameter",
                origin: head.origin,
            });
        };
        if scheduled_parm != parm {
            return Err(ExpectError::ParmMismatch {
                func: head.func,
                scheduled: scheduled_parm,
                checked: parm.to_owned(),
                origin: head.origin,
            });
        }
        let ok = assess::compare(observed, comparator, &expected).map_err(|source| {
            ExpectError::Broken {
                func: head.func.clone(),
                origin: head.origin.clone(),
                source,
            }
        })?;
        if ok {
            Ok(())
        } else {
            let (wanted, found) = assess::describe_mismatch(
                &format!("{func}.{parm}"),
                comparator,
                &expected.to_string(),
                observed,
                &expected,
            );
            Err(ExpectError::ValueMismatch {
                func: head.func,
                parm: scheduled_parm,
                wanted,
                found,
                origin: head.origin,
            })
        }
    }

    /// Consume the head for a scheduled return value.
    pub fn fetch_retval(&mut self, func: &str) -> Result<Value, ExpectError> {
        let head = self.pop(func)?;
        match head.kind {
            ExpectKind::Retval { value } => Ok(value),
            other => Err(ExpectError::KindMismatch {
                func: head.func,
                scheduled: other.label(),
                checked: "return value",
                origin: head.origin,
            }),
        }
    }

    /// Drain the queue at run finalization.
    ///
    /// With `verify` set, a non-empty queue reports the first leftover
    /// expectation; a second release on the same run is a no-op.
    pub fn release(&mut self, verify: bool) -> Option<ExpectError> {
        if self.released {
            return None;
        }
        self.released = true;
        let count = self.queue.len();
        let first = self.queue.pop_front();
        self.queue.clear();
        match first {
            Some(head) if verify => Some(ExpectError::Leftover {
                func: head.func,
                origin: head.origin,
                count,
            }),
            _ => None,
        }
    }

    fn pop(&mut self, func: &str) -> Result<Expectation, ExpectError> {
        let head = self.queue.pop_front().ok_or_else(|| ExpectError::Empty {
            func: func.to_owned(),
        })?;
        if head.func != func {
            return Err(ExpectError::FuncMismatch {
                scheduled: head.func,
                checked: func.to_owned(),
                origin: head.origin,
            });
        }
        Ok(head)
    }
}
