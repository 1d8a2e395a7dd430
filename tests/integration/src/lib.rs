//! # integration-tests
//!
//! End-to-end tests for flotilla: a coordinator drives a worker fleet over
//! the mock connector while an in-process worker stand-in executes the
//! recorded test traffic.
//!
//! The scenarios cover:
//! - Full run lifecycles (workers up, suite in, phases through, workers down)
//! - Multiple tests multiplexed over one fleet
//! - Execution errors travelling back with their category intact

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fixtures;
pub mod worker_sim;

pub mod scenarios;
