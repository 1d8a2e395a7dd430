//! Desired worker placement across agents.

use flotilla_protocol::{Address, WorkerKind, WorkerSettings};

/// The workers one agent should host.
#[derive(Debug, Clone)]
pub struct AgentLayout {
    /// Address of the hosting agent.
    pub agent: Address,
    /// Settings for every worker to launch there.
    pub workers: Vec<WorkerSettings>,
}

impl AgentLayout {
    /// Creates an empty layout for one agent.
    pub fn new(agent: Address) -> Self {
        AgentLayout {
            agent,
            workers: Vec::new(),
        }
    }

    /// Adds one worker to this agent.
    pub fn with_worker(mut self, settings: WorkerSettings) -> Self {
        self.workers.push(settings);
        self
    }

    /// The subset of this agent's workers of the given kind.
    pub fn workers_of_kind(&self, kind: WorkerKind) -> Vec<WorkerSettings> {
        self.workers
            .iter()
            .filter(|worker| worker.kind == kind)
            .cloned()
            .collect()
    }
}

/// The full worker placement for a run.
#[derive(Debug, Clone, Default)]
pub struct FleetLayout {
    /// Per-agent placements.
    pub agents: Vec<AgentLayout>,
}

impl FleetLayout {
    /// Creates an empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one agent's placement.
    pub fn with_agent(mut self, agent: AgentLayout) -> Self {
        self.agents.push(agent);
        self
    }

    /// Total number of workers across all agents.
    pub fn worker_count(&self) -> usize {
        self.agents.iter().map(|agent| agent.workers.len()).sum()
    }
}
