//! Coordinator-side fleet control for flotilla.
//!
//! This crate runs the command side of a distributed load-test fleet. The
//! coordinator owns a [`FleetClient`], which launches workers across
//! agents, fans test operations out over wildcard addresses, keeps worker
//! liveness fresh with a background ping loop and takes the fleet down
//! again in a safe order.
//!
//! # Design principles
//!
//! - All transport goes through the [`connector::Connector`] trait, so the
//!   whole crate is testable against [`connector::MockConnector`]
//! - The [`Registry`] records what is actually running, updated as agents
//!   confirm, never ahead of them
//! - Every validated response funnels through [`validate_response`], so a
//!   refusing component is always reported with its exact address
//!
//! # Example
//!
//! ```ignore
//! let client = FleetClient::new(connector, registry, &config);
//! client.create_workers(&layout, true).await?;
//! client.start_test_phase("map-load", TestPhase::Run).await?;
//! client.terminate_workers(true).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connector;

mod client;
mod config;
mod error;
mod layout;
mod ping;
mod registry;

pub use client::{validate_response, FleetClient};
pub use config::{ConfigError, FleetConfig};
pub use error::{FleetError, Result};
pub use layout::{AgentLayout, FleetLayout};
pub use ping::PingHandle;
pub use registry::{AgentData, Registry, TestData, WorkerData};
