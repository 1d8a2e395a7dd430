//! Live inventory of fleet components.
//!
//! The registry is the coordinator's single source of truth for what is
//! actually running. Workers are recorded as their hosting agent confirms
//! them, so after a partial creation failure the registry still reflects
//! exactly the workers that exist.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use flotilla_protocol::{Address, TestCase, WorkerSettings};

/// An agent known to the coordinator.
#[derive(Debug, Clone)]
pub struct AgentData {
    /// The agent's fleet address.
    pub address: Address,
    /// Host the agent runs on.
    pub host: String,
}

/// A worker attributed to its hosting agent.
#[derive(Debug, Clone)]
pub struct WorkerData {
    /// The worker's fleet address.
    pub address: Address,
    /// The settings the worker was launched with.
    pub settings: WorkerSettings,
}

/// A test known to the coordinator.
#[derive(Debug, Clone)]
pub struct TestData {
    /// Fleet-wide test index, the test component of its address.
    pub test_index: u32,
    /// Wildcard address reaching this test on every hosting worker.
    pub address: Address,
    /// The definition the test was created from.
    pub test_case: TestCase,
}

/// Concurrent registry of agents, workers and tests.
///
/// Creation fan-out tasks insert workers concurrently, so all maps are
/// lock-free and additions never block reads.
#[derive(Debug, Default)]
pub struct Registry {
    agents: DashMap<Address, AgentData>,
    workers: DashMap<Address, WorkerData>,
    tests: DashMap<String, TestData>,
    next_agent_index: AtomicU32,
    next_test_index: AtomicU32,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent and assigns it the next free index.
    ///
    /// Index 0 is the wildcard, so assignment starts at 1.
    pub fn add_agent(&self, host: &str) -> AgentData {
        let index = self.next_agent_index.fetch_add(1, Ordering::Relaxed) + 1;
        let data = AgentData {
            address: Address::agent(index),
            host: host.to_string(),
        };
        self.agents.insert(data.address, data.clone());
        data
    }

    /// All agents, ordered by address.
    pub fn agents(&self) -> Vec<AgentData> {
        let mut agents: Vec<AgentData> =
            self.agents.iter().map(|entry| entry.value().clone()).collect();
        agents.sort_by_key(|agent| agent.address);
        agents
    }

    /// Records workers confirmed by the given agent.
    pub fn add_workers(&self, agent: Address, settings: &[WorkerSettings]) {
        for worker in settings {
            let address = Address::worker(agent.agent_index(), worker.worker_index);
            self.workers.insert(
                address,
                WorkerData {
                    address,
                    settings: worker.clone(),
                },
            );
        }
    }

    /// All workers, ordered by address.
    pub fn workers(&self) -> Vec<WorkerData> {
        let mut workers: Vec<WorkerData> =
            self.workers.iter().map(|entry| entry.value().clone()).collect();
        workers.sort_by_key(|worker| worker.address);
        workers
    }

    /// The lowest-addressed worker, used as the designated single target
    /// for global operations.
    pub fn first_worker(&self) -> Option<WorkerData> {
        self.workers
            .iter()
            .map(|entry| entry.value().clone())
            .min_by_key(|worker| worker.address)
    }

    /// Registers a test and assigns it the next free fleet-wide index.
    pub fn add_test(&self, test_case: &TestCase) -> TestData {
        let index = self.next_test_index.fetch_add(1, Ordering::Relaxed) + 1;
        let data = TestData {
            test_index: index,
            address: Address::test(0, 0, index),
            test_case: test_case.clone(),
        };
        self.tests.insert(test_case.id.clone(), data.clone());
        data
    }

    /// Looks a test up by its identifier.
    pub fn test(&self, test_id: &str) -> Option<TestData> {
        self.tests.get(test_id).map(|entry| entry.value().clone())
    }

    /// Number of registered agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Number of registered workers.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}
