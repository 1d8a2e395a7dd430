//! Error types for the flotilla protocol.

use thiserror::Error;

use crate::Address;

/// Errors that can occur while handling protocol values.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Encode(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Decode(#[source] rmp_serde::decode::Error),

    /// Address navigation below the deepest level
    #[error("address {address} has no child level")]
    NoChildLevel {
        /// The address that was asked for a child.
        address: Address,
    },
}
