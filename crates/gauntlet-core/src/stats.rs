//! Suite statistics counters.

use crate::outcome::Outcome;

/// Outcome counters for one suite.
///
/// `exec` counts children that actually ran (pass + skip + fail + excp);
/// `total` additionally counts children left `Off` by the name filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub pass: u32,
    pub skip: u32,
    pub fail: u32,
    pub excp: u32,
    pub exec: u32,
    pub total: u32,
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Stats {
            pass: 0,
            skip: 0,
            fail: 0,
            excp: 0,
            exec: 0,
            total: 0,
        }
    }

    /// Account one finalized child.
    ///
    /// Exactly one of the outcome counters is incremented, plus `exec`
    /// and `total`, except `Off` children which count toward `total`
    /// only.
    pub fn account(&mut self, outcome: Outcome) {
        debug_assert!(outcome.is_final());
        match outcome {
            Outcome::Pass => self.pass += 1,
            Outcome::Skip => self.skip += 1,
            Outcome::Fail => self.fail += 1,
            Outcome::Excp => self.excp += 1,
            Outcome::Off => {
                self.total += 1;
                return;
            }
            Outcome::Unknown => return,
        }
        self.exec += 1;
        self.total += 1;
    }

    /// Fold another counter set into this one (cumulative roll-up).
    pub fn merge(&mut self, other: &Stats) {
        self.pass += other.pass;
        self.skip += other.skip;
        self.fail += other.fail;
        self.excp += other.excp;
        self.exec += other.exec;
        self.total += other.total;
    }

    /// Counter identity that must hold for every finished suite.
    #[must_use]
    pub const fn balanced(&self) -> bool {
        self.pass + self.skip + self.fail + self.excp == self.exec && self.exec <= self.total
    }
}
