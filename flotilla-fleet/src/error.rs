//! Error types for fleet control.

use flotilla_protocol::{Address, Outcome, ProtocolError, WorkerKind};
use thiserror::Error;

use crate::config::ConfigError;
use crate::connector::ConnectorError;

/// Result alias for fleet operations.
pub type Result<T> = std::result::Result<T, FleetError>;

/// Errors surfaced by the fleet client.
#[derive(Debug, Error)]
pub enum FleetError {
    /// A fleet component answered an operation with a non-success outcome.
    #[error("could not execute {operation} on {source} ({outcome})")]
    OperationFailed {
        /// Name of the operation that failed.
        operation: String,
        /// Address of the component that reported the failure.
        /// Declared as `r#source` so thiserror does not treat it as the
        /// `Error::source()` cause; the field name is still `source`.
        r#source: Address,
        /// The outcome it reported.
        outcome: Outcome,
    },

    /// An agent rejected a worker creation batch.
    #[error("could not create {count} {kind} worker(s) on {agent} ({outcome})")]
    WorkerCreationFailed {
        /// Number of workers in the rejected batch.
        count: usize,
        /// Kind of the workers in the batch.
        kind: WorkerKind,
        /// The agent that rejected them.
        agent: Address,
        /// The outcome it reported.
        outcome: Outcome,
    },

    /// An agent did not confirm a worker creation batch in time.
    #[error("worker creation on {agent} timed out after {timeout_secs}s")]
    WorkerCreationTimedOut {
        /// The agent that went silent.
        agent: Address,
        /// How long the coordinator waited.
        timeout_secs: u64,
    },

    /// An operation needed a worker but none are registered.
    #[error("no workers registered")]
    NoWorkers,

    /// The addressed test is not registered.
    #[error("test {test_id} is not registered")]
    TestNotRegistered {
        /// The identifier that was looked up.
        test_id: String,
    },

    /// A background task panicked instead of returning.
    #[error("task panicked: {task}")]
    TaskPanicked {
        /// Which task went down.
        task: String,
    },

    /// Delivery-level failure from the connector.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Wire format failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
