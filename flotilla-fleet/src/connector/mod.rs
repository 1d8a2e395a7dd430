//! Connector abstraction for reaching the fleet.
//!
//! The coordinator never talks to an individual socket; it submits an
//! operation to an [`Address`] and gets back one [`Response`] aggregating
//! the outcome of every component the address expanded to.
//!
//! # Design
//!
//! The connector trait is async and fire-and-collect:
//! - a concrete address reaches exactly one component
//! - a wildcard address fans out to every matching component
//! - the returned response carries one entry per reached component
//!
//! # Example
//!
//! ```ignore
//! let connector = MockConnector::new();
//! let response = connector.send(ALL_AGENTS, Operation::Ping).await?;
//! assert!(response.first_failure().is_none());
//! ```

mod mock;

pub use mock::MockConnector;

use async_trait::async_trait;
use thiserror::Error;

use flotilla_protocol::{Address, Operation, Response};

/// Connector errors.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// The send was cut short by coordinator shutdown.
    #[error("send interrupted")]
    Interrupted,

    /// Not connected to the fleet.
    #[error("not connected")]
    NotConnected,

    /// The destination did not answer in time.
    #[error("send timed out")]
    Timeout,
}

/// Connector for dispatching operations across the fleet.
///
/// Implementations resolve the destination to every matching component,
/// deliver the operation and collect one outcome per reached component.
/// Delivery failures are connector errors; a component that received the
/// operation but could not execute it reports that through its entry in
/// the response instead.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Sends `operation` to every component matching `destination`.
    async fn send(
        &self,
        destination: Address,
        operation: Operation,
    ) -> Result<Response, ConnectorError>;
}
