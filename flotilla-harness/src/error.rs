//! Error types for the test harness.

use crate::strategy::RunKind;
use thiserror::Error;

/// A structural problem with a test definition.
///
/// These are all construction-time errors: once a
/// [`TestContainer`](crate::TestContainer) exists, its definition is known
/// to be well formed.
#[derive(Debug, Error)]
pub enum IllegalTest {
    /// The requested test type is not registered in the catalog.
    #[error("unknown test type: {name}")]
    UnknownTestType {
        /// Type name that was requested.
        name: String,
    },

    /// The test declares no run strategy at all.
    #[error("test {test_id} declares no run strategy (expected run, run_with_worker or time_step)")]
    MissingRunStrategy {
        /// Identifier of the offending test.
        test_id: String,
    },

    /// The test declares more than one kind of run strategy.
    #[error("test {test_id} declares more than one run strategy: {kinds:?}")]
    AmbiguousRunStrategy {
        /// Identifier of the offending test.
        test_id: String,
        /// Every strategy kind the test declared.
        kinds: Vec<RunKind>,
    },

    /// The test declares the same kind of run strategy twice.
    #[error("test {test_id} declares {kind} more than once")]
    DuplicateRunStrategy {
        /// Identifier of the offending test.
        test_id: String,
        /// The strategy kind that was declared twice.
        kind: RunKind,
    },

    /// A property value could not be applied to the test instance.
    #[error("invalid value for property {name}: {reason}")]
    InvalidProperty {
        /// Name of the property.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Properties were supplied that no part of the test consumed.
    #[error("unused properties: {}", .names.join(", "))]
    UnusedProperties {
        /// Names of the properties nothing consumed.
        names: Vec<String>,
    },
}

/// An error raised while executing test code.
#[derive(Debug, Error)]
pub enum TestError {
    /// Test code panicked. The panic was caught at the phase boundary.
    #[error("test fault: {0}")]
    Fault(String),

    /// Test code reported a failure through its own return value.
    #[error("test failed: {0}")]
    Failed(String),

    /// Any other error surfaced by test code.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TestError {
    /// Error used when the shared test instance lock was poisoned by an
    /// earlier fault.
    pub(crate) fn poisoned_lock() -> Self {
        TestError::Fault("test instance lock poisoned by an earlier fault".to_string())
    }
}
