//! The generic in-test check.

use gauntlet_core::assess;
use gauntlet_core::expect::SourceInfo;
use gauntlet_core::run::Diagnostic;
use gauntlet_core::{Comparator, Expected, Outcome, Value};

use crate::contain;

/// Evaluate one check and abort the current phase when it does not
/// hold.
///
/// `check_expr` and `expect_expr` are the source-level expressions as
/// written at the call site; they reappear verbatim in the "wanted"
/// half of the diagnostic. A comparison that cannot be evaluated at all
/// (kind or shape mismatch) is a failure too, not a pass.
#[track_caller]
pub fn check(
    check_expr: &str,
    observed: Value,
    comparator: Comparator,
    expect_expr: &str,
    expected: Expected,
) {
    let origin = SourceInfo::caller();
    match assess::compare(&observed, comparator, &expected) {
        Ok(true) => {}
        Ok(false) => {
            let (wanted, found) =
                assess::describe_mismatch(check_expr, comparator, expect_expr, &observed, &expected);
            contain::abort(
                Outcome::Fail,
                Diagnostic::new("", format!("check '{check_expr}' failed"))
                    .at(origin)
                    .with_check(wanted, found),
            );
        }
        Err(err) => contain::abort(
            Outcome::Fail,
            Diagnostic::new("", format!("check '{check_expr}' broken: {err}")).at(origin),
        ),
    }
}
