//! End-to-end scenarios.
//!
//! - `fleet` - coordinator-driven runs over the mock connector
//! - `lifecycle` - wire-delivered test operations on the worker stand-in

pub mod fleet;
pub mod lifecycle;
