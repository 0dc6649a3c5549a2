//! Immutable test and suite descriptors.
//!
//! Descriptor trees are composed with ordinary constructors and builder
//! methods; the engine instantiates one [`crate::run::Run`] per
//! descriptor and never mutates the descriptors themselves.

use std::time::Duration;

/// A test body, fixture, or teardown function.
pub type TestFn = fn();

/// Timeout applied when every ancestor up to the root says inherit.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Setup or teardown slot of a descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub enum Fixture {
    /// Use the nearest ancestor's explicit fixture, if any.
    #[default]
    Inherit,
    /// No fixture, even if an ancestor has one.
    None,
    Explicit(TestFn),
}

/// Timeout slot of a descriptor.
#[derive(Debug, Clone, Copy, Default)]
pub enum TimeoutSpec {
    /// Use the nearest ancestor's timeout ([`DEFAULT_TIMEOUT`] at the root).
    #[default]
    Inherit,
    /// Never arm the timer for this subtree.
    None,
    Explicit(Duration),
}

/// Descriptor of a single executable test.
#[derive(Debug, Clone)]
pub struct TestCase {
    name: String,
    body: TestFn,
    setup: Fixture,
    teardown: Fixture,
    timeout: TimeoutSpec,
}

impl TestCase {
    /// A test inheriting fixtures and timeout from its suite.
    #[must_use]
    pub fn new(name: impl Into<String>, body: TestFn) -> Self {
        TestCase {
            name: name.into(),
            body,
            setup: Fixture::Inherit,
            teardown: Fixture::Inherit,
            timeout: TimeoutSpec::Inherit,
        }
    }

    #[must_use]
    pub fn with_setup(mut self, setup: TestFn) -> Self {
        self.setup = Fixture::Explicit(setup);
        self
    }

    #[must_use]
    pub fn with_teardown(mut self, teardown: TestFn) -> Self {
        self.teardown = Fixture::Explicit(teardown);
        self
    }

    /// Drop any inherited fixtures.
    #[must_use]
    pub fn bare(mut self) -> Self {
        self.setup = Fixture::None;
        self.teardown = Fixture::None;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = TimeoutSpec::Explicit(timeout);
        self
    }

    #[must_use]
    pub fn no_timeout(mut self) -> Self {
        self.timeout = TimeoutSpec::None;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn body(&self) -> TestFn {
        self.body
    }

    #[must_use]
    pub fn setup(&self) -> Fixture {
        self.setup
    }

    #[must_use]
    pub fn teardown(&self) -> Fixture {
        self.teardown
    }

    #[must_use]
    pub fn timeout(&self) -> TimeoutSpec {
        self.timeout
    }
}

/// Descriptor of a suite: an ordered list of child descriptors plus the
/// fixture/timeout slots its children may inherit.
#[derive(Debug, Clone, Default)]
pub struct SuiteCase {
    name: String,
    setup: Fixture,
    teardown: Fixture,
    timeout: TimeoutSpec,
    children: Vec<Base>,
}

impl SuiteCase {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        SuiteCase {
            name: name.into(),
            setup: Fixture::Inherit,
            teardown: Fixture::Inherit,
            timeout: TimeoutSpec::Inherit,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_setup(mut self, setup: TestFn) -> Self {
        self.setup = Fixture::Explicit(setup);
        self
    }

    #[must_use]
    pub fn with_teardown(mut self, teardown: TestFn) -> Self {
        self.teardown = Fixture::Explicit(teardown);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = TimeoutSpec::Explicit(timeout);
        self
    }

    #[must_use]
    pub fn no_timeout(mut self) -> Self {
        self.timeout = TimeoutSpec::None;
        self
    }

    /// Append a test child, preserving declaration order.
    #[must_use]
    pub fn test(mut self, test: TestCase) -> Self {
        self.children.push(Base::Test(test));
        self
    }

    /// Append a nested suite child.
    #[must_use]
    pub fn suite(mut self, suite: SuiteCase) -> Self {
        self.children.push(Base::Suite(suite));
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn setup(&self) -> Fixture {
        self.setup
    }

    #[must_use]
    pub fn teardown(&self) -> Fixture {
        self.teardown
    }

    #[must_use]
    pub fn timeout(&self) -> TimeoutSpec {
        self.timeout
    }

    #[must_use]
    pub fn children(&self) -> &[Base] {
        &self.children
    }
}

/// Either kind of descriptor node.
#[derive(Debug, Clone)]
pub enum Base {
    Test(TestCase),
    Suite(SuiteCase),
}

impl Base {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Base::Test(t) => t.name(),
            Base::Suite(s) => s.name(),
        }
    }
}
