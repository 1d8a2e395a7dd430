//! # flotilla-protocol
//!
//! Wire format types for the flotilla fleet protocol.
//!
//! This crate provides the foundational types shared by the coordinator and
//! worker sides of a flotilla run:
//! - [`Address`] - hierarchical fleet addressing with wildcard destinations
//! - [`Operation`] - fleet commands (CreateWorkers, Ping, StartTestPhase, etc.)
//! - [`Response`] / [`Outcome`] - aggregated per-responder results
//! - [`TestSuite`], [`TestCase`], [`TestPhase`] - test run descriptions
//! - [`ProtocolError`] - error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod operation;
mod response;
mod suite;
mod worker;

pub use address::{Address, AddressLevel, ALL_AGENTS, ALL_WORKERS};
pub use error::ProtocolError;
pub use operation::{
    CreateTest, CreateWorkers, InitTestSuite, Log, LogLevel, Operation, StartTestPhase,
};
pub use response::{Outcome, Response};
pub use suite::{TestCase, TestPhase, TestSuite};
pub use worker::{WorkerKind, WorkerSettings};
