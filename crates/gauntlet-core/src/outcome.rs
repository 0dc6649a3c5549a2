//! Final classification of a run.

use std::fmt;

/// Resolution of a run once it has been driven to completion.
///
/// `Unknown` is the transient value carried while the run executes; it is
/// never observable once the run reaches the `Done` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// Not yet resolved.
    #[default]
    Unknown,
    /// Every executed phase completed without an issue.
    Pass,
    /// Explicitly skipped, or (for a suite) every executed child skipped.
    Skip,
    /// Explicit failure, check or expectation mismatch, or timer expiry.
    Fail,
    /// A process-fatal signal was caught while the run executed.
    Excp,
    /// Excluded by the name filter; never entered `Setup`.
    Off,
}

impl Outcome {
    /// True once the run has settled on a final classification.
    #[must_use]
    pub const fn is_final(self) -> bool {
        !matches!(self, Outcome::Unknown)
    }

    /// Success for the purpose of the process exit status.
    ///
    /// Only failures and crashes make the overall run unsuccessful; a
    /// fully skipped or fully filtered tree still exits cleanly.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Outcome::Pass | Outcome::Skip | Outcome::Off)
    }

    /// Stable lowercase label used by renderers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Outcome::Unknown => "unknown",
            Outcome::Pass => "pass",
            Outcome::Skip => "skip",
            Outcome::Fail => "fail",
            Outcome::Excp => "excp",
            Outcome::Off => "off",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_classification() {
        assert!(Outcome::Pass.is_success());
        assert!(Outcome::Skip.is_success());
        assert!(Outcome::Off.is_success());
        assert!(!Outcome::Fail.is_success());
        assert!(!Outcome::Excp.is_success());
        assert!(!Outcome::Unknown.is_success());
    }

    #[test]
    fn unknown_is_transient() {
        assert!(!Outcome::Unknown.is_final());
        assert!(Outcome::Off.is_final());
    }
}
