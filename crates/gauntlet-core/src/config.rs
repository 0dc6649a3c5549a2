//! Engine-facing configuration.

use crate::filter::NameFilter;

/// The two knobs that change core behavior.
///
/// Report-format selection and the rest of the process surface are the
/// facade crate's concern and never reach the engine.
#[derive(Debug, Default)]
pub struct Config {
    /// Optional run selection by full name.
    pub filter: Option<NameFilter>,
    /// Disable fault/timeout containment entirely so an external
    /// debugger can catch the crash at its origin.
    pub debug: bool,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Config::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
