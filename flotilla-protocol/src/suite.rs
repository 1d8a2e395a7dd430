//! Test suite descriptions and the phase lifecycle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Immutable description of one test: a registered test type plus its
/// property bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Identifier of this test within its suite.
    pub id: String,
    /// Name of the registered test type to instantiate.
    pub test_type: String,
    /// Flat name-to-literal property bag, bound at container construction.
    pub properties: BTreeMap<String, String>,
}

impl TestCase {
    /// Create a test case with an empty property bag.
    pub fn new(id: &str, test_type: &str) -> Self {
        Self {
            id: id.to_string(),
            test_type: test_type.to_string(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a property (builder style).
    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_string(), value.to_string());
        self
    }
}

/// A full run's worth of tests, handed to every agent before any phase
/// executes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    /// Human-readable suite name.
    pub name: String,
    /// The tests of this suite, in declaration order.
    pub test_cases: Vec<TestCase>,
    /// Intended RUN-phase duration in seconds (0 = until stopped).
    pub duration_secs: u64,
    /// Abort the whole suite on the first failing test.
    pub fail_fast: bool,
}

impl TestSuite {
    /// Create an empty suite that runs until stopped.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            test_cases: Vec::new(),
            duration_secs: 0,
            fail_fast: false,
        }
    }

    /// Add a test case (builder style).
    pub fn with_test_case(mut self, test_case: TestCase) -> Self {
        self.test_cases.push(test_case);
        self
    }

    /// Number of tests in the suite.
    pub fn len(&self) -> usize {
        self.test_cases.len()
    }

    /// Whether the suite holds no tests.
    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }
}

/// Lifecycle phases of one test, in execution order.
///
/// Local phases run independently on every worker; global phases run
/// once, on the worker elected to represent the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TestPhase {
    /// Construct domain state, capture the test context.
    Setup,
    /// Per-worker warmup.
    LocalWarmup,
    /// Suite-wide warmup.
    GlobalWarmup,
    /// The load-generating phase.
    Run,
    /// Per-worker result verification.
    LocalVerify,
    /// Suite-wide result verification.
    GlobalVerify,
    /// Per-worker cleanup.
    LocalTeardown,
    /// Suite-wide cleanup.
    GlobalTeardown,
}

impl TestPhase {
    /// All phases in execution order.
    pub const ALL: [TestPhase; 8] = [
        TestPhase::Setup,
        TestPhase::LocalWarmup,
        TestPhase::GlobalWarmup,
        TestPhase::Run,
        TestPhase::LocalVerify,
        TestPhase::GlobalVerify,
        TestPhase::LocalTeardown,
        TestPhase::GlobalTeardown,
    ];

    /// Human-readable phase description.
    pub fn description(&self) -> &'static str {
        match self {
            TestPhase::Setup => "setup",
            TestPhase::LocalWarmup => "local warmup",
            TestPhase::GlobalWarmup => "global warmup",
            TestPhase::Run => "run",
            TestPhase::LocalVerify => "local verify",
            TestPhase::GlobalVerify => "global verify",
            TestPhase::LocalTeardown => "local teardown",
            TestPhase::GlobalTeardown => "global teardown",
        }
    }
}

impl fmt::Display for TestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
