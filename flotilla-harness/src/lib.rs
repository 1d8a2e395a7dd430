//! Test lifecycle executor for flotilla.
//!
//! This crate implements the pure logic of running a load test through its
//! lifecycle phases: property binding, run strategy selection, and phase
//! dispatch. It has no I/O and no dependency on the fleet transport, so
//! everything here is unit-testable in-process.
//!
//! # Design principles
//!
//! - No I/O: tests execute against in-memory state and a [`TestContext`]
//! - Exactly one run strategy per test, selected at construction time
//! - Construction fails fast: a bad property or a missing strategy is
//!   reported before any phase runs
//! - A panic inside test code is contained and reported as a fault, never
//!   propagated to the caller
//!
//! # Lifecycle
//!
//! A [`TestContainer`] is built from a [`TestCase`](flotilla_protocol::TestCase)
//! and a [`LoadTest`] implementation. The coordinator then drives it through
//! the phases of [`TestPhase`](flotilla_protocol::TestPhase) by calling
//! [`TestContainer::invoke`]. The `Run` phase executes the test's
//! [`RunStrategy`] until the context is stopped.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod catalog;
mod container;
mod context;
mod error;
mod plan;
mod properties;
mod strategy;

pub use catalog::TestCatalog;
pub use container::TestContainer;
pub use context::TestContext;
pub use error::{IllegalTest, TestError};
pub use plan::{
    LoadTest, LoadWorker, PhaseFn, RunFn, Scope, SetupContextFn, TestPlan, TimeStepFn,
    WorkerFactoryFn,
};
pub use properties::{parse_property, Configurable, PropertyBinding};
pub use strategy::{RunKind, RunStrategy};
