//! Process-start suite registry.
//!
//! Suites are plain values built with constructors; the registry is the
//! lookup table a test binary fills in `main` before handing control to
//! the runtime.

use gauntlet_core::SuiteCase;

/// Ordered collection of registered top-level suites.
#[derive(Debug, Default)]
pub struct Registry {
    suites: Vec<SuiteCase>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register one top-level suite, keeping registration order.
    pub fn register(&mut self, suite: SuiteCase) -> &mut Self {
        self.suites.push(suite);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&SuiteCase> {
        self.suites.iter().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SuiteCase> {
        self.suites.iter()
    }

    /// Compose every registered suite under one synthetic root.
    #[must_use]
    pub fn into_root(self, name: impl Into<String>) -> SuiteCase {
        let mut root = SuiteCase::new(name);
        for suite in self.suites {
            root = root.suite(suite);
        }
        root
    }
}
