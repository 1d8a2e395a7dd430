//! In-process stand-in for a worker process.
//!
//! Fleet scenarios drive a [`FleetClient`](flotilla_fleet::FleetClient)
//! over the mock connector, which records traffic without executing it.
//! [`WorkerSim`] closes that gap: scenarios feed it the recorded wire
//! traffic and it reacts the way a worker would, instantiating a container
//! on `CreateTest` and dispatching phases on `StartTestPhase`.

use std::collections::BTreeMap;

use flotilla_harness::{IllegalTest, LoadTest, TestCatalog, TestContainer, TestContext, TestError};
use flotilla_protocol::{Address, Operation, TestCase, TestPhase};
use thiserror::Error;

/// Errors surfaced while a worker stand-in executes recorded traffic.
#[derive(Debug, Error)]
pub enum SimError {
    /// Container construction rejected the test definition.
    #[error(transparent)]
    Illegal(#[from] IllegalTest),

    /// A lifecycle phase failed or faulted.
    #[error("{phase} phase of {test_id} failed: {source}")]
    Phase {
        /// Identifier of the failing test.
        test_id: String,
        /// The phase that failed.
        phase: TestPhase,
        /// The underlying execution error.
        source: TestError,
    },

    /// An operation addressed a test index nothing created.
    #[error("no test created at index {test_index}")]
    UnknownTest {
        /// The addressed test index.
        test_index: u32,
    },
}

/// One simulated worker process: a catalog of registered test types plus
/// the containers created over the wire, keyed by test index.
///
/// The stand-in only reacts to test operations. Worker management, pings
/// and log lines are acknowledged and dropped, since there is no real
/// process behind it to manage.
#[derive(Debug, Default)]
pub struct WorkerSim {
    catalog: TestCatalog,
    containers: BTreeMap<u32, TestContainer>,
}

impl WorkerSim {
    /// Creates a stand-in with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a test type, the way a worker does at startup.
    pub fn register<T: LoadTest + Default>(&mut self, name: &str) -> &mut Self {
        self.catalog.register::<T>(name);
        self
    }

    /// Applies a batch of recorded traffic in order, stopping at the first
    /// error.
    pub fn replay(&mut self, traffic: &[(Address, Operation)]) -> Result<(), SimError> {
        for (destination, operation) in traffic {
            self.apply(*destination, operation)?;
        }
        Ok(())
    }

    /// Reacts to one recorded operation.
    pub fn apply(&mut self, destination: Address, operation: &Operation) -> Result<(), SimError> {
        match operation {
            Operation::CreateTest(create) => self.create(create.test_index, &create.test_case),
            Operation::StartTestPhase(start) => {
                self.run_phase(destination.test_index(), start.phase)
            }
            Operation::StopTest => self.stop_test(destination.test_index()),
            _ => Ok(()),
        }
    }

    /// Runs one lifecycle phase of the test at `test_index`.
    ///
    /// The run phase executes on the calling thread and returns when the
    /// test completes or its context is stopped.
    pub fn run_phase(&self, test_index: u32, phase: TestPhase) -> Result<(), SimError> {
        let container = self.lookup(test_index)?;
        container.invoke(phase).map_err(|source| SimError::Phase {
            test_id: container.test_case().id.clone(),
            phase,
            source,
        })
    }

    /// Asks the test at `test_index` to stop.
    pub fn stop_test(&self, test_index: u32) -> Result<(), SimError> {
        self.lookup(test_index)?.context().stop();
        Ok(())
    }

    /// The container created for `test_index`, if any.
    pub fn container(&self, test_index: u32) -> Option<&TestContainer> {
        self.containers.get(&test_index)
    }

    fn create(&mut self, test_index: u32, case: &TestCase) -> Result<(), SimError> {
        let ctx = TestContext::new(case.id.clone());
        let container = self.catalog.create(ctx, case.clone())?;
        self.containers.insert(test_index, container);
        Ok(())
    }

    fn lookup(&self, test_index: u32) -> Result<&TestContainer, SimError> {
        self.containers
            .get(&test_index)
            .ok_or(SimError::UnknownTest { test_index })
    }
}
