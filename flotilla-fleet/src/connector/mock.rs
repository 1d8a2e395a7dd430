//! Mock connector for testing.
//!
//! Expands wildcard addresses over a registered fleet, records every sent
//! operation and lets tests script outcomes and delivery failures.

use super::{Connector, ConnectorError};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use flotilla_protocol::{Address, AddressLevel, Operation, Outcome, Response};

/// Mock connector for testing.
///
/// Register the fleet shape up front with [`MockConnector::register_agent`]
/// and [`MockConnector::register_worker`]; every send then answers with one
/// entry per matching component. Outcomes default to success and can be
/// overridden per responder with [`MockConnector::outcome_for`].
#[derive(Debug, Default)]
pub struct MockConnector {
    inner: Arc<Mutex<MockConnectorInner>>,
}

#[derive(Debug, Default)]
struct MockConnectorInner {
    agents: Vec<Address>,
    workers: Vec<Address>,
    sent: Vec<(Address, Operation)>,
    fail_next_send: VecDeque<ConnectorError>,
    outcomes: BTreeMap<Address, Outcome>,
}

impl MockConnector {
    /// Create a new mock connector with an empty fleet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent that will answer matching sends.
    pub fn register_agent(&self, address: Address) {
        let mut inner = self.inner.lock().unwrap();
        inner.agents.push(address);
    }

    /// Register a worker that will answer matching sends.
    pub fn register_worker(&self, address: Address) {
        let mut inner = self.inner.lock().unwrap();
        inner.workers.push(address);
    }

    /// Script the outcome the given responder reports from now on.
    pub fn outcome_for(&self, responder: Address, outcome: Outcome) {
        let mut inner = self.inner.lock().unwrap();
        inner.outcomes.insert(responder, outcome);
    }

    /// Cause one upcoming send to fail with the given error.
    ///
    /// Queued failures are consumed in order, one per send.
    pub fn fail_next_send(&self, error: ConnectorError) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_send.push_back(error);
    }

    /// Every (destination, operation) pair sent so far.
    pub fn sent(&self) -> Vec<(Address, Operation)> {
        let inner = self.inner.lock().unwrap();
        inner.sent.clone()
    }

    /// The destinations sent to so far, in order.
    pub fn sent_destinations(&self) -> Vec<Address> {
        let inner = self.inner.lock().unwrap();
        inner.sent.iter().map(|(destination, _)| *destination).collect()
    }

    /// Number of sends so far.
    pub fn sent_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.sent.len()
    }

    /// Forget all recorded sends, keeping the fleet and scripts.
    pub fn clear_sent(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.sent.clear();
    }
}

impl Clone for MockConnector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn send(
        &self,
        destination: Address,
        operation: Operation,
    ) -> Result<Response, ConnectorError> {
        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if let Some(error) = inner.fail_next_send.pop_front() {
            return Err(error);
        }

        inner.sent.push((destination, operation));

        let mut response = Response::new();
        for responder in recipients(&inner, destination) {
            let outcome = inner
                .outcomes
                .get(&responder)
                .copied()
                .unwrap_or(Outcome::Success);
            response.add(responder, outcome);
        }
        Ok(response)
    }
}

/// Expands a destination to the concrete responders it reaches.
fn recipients(inner: &MockConnectorInner, destination: Address) -> Vec<Address> {
    match destination.level() {
        AddressLevel::Coordinator => vec![destination],
        AddressLevel::Agent => inner
            .agents
            .iter()
            .copied()
            .filter(|agent| component_matches(destination.agent_index(), agent.agent_index()))
            .collect(),
        AddressLevel::Worker => inner
            .workers
            .iter()
            .copied()
            .filter(|worker| worker_matches(destination, *worker))
            .collect(),
        AddressLevel::Test => inner
            .workers
            .iter()
            .filter(|worker| worker_matches(destination, **worker))
            .filter_map(|worker| worker.child(destination.test_index()).ok())
            .collect(),
    }
}

fn worker_matches(pattern: Address, worker: Address) -> bool {
    component_matches(pattern.agent_index(), worker.agent_index())
        && component_matches(pattern.worker_index(), worker.worker_index())
}

fn component_matches(pattern: u32, actual: u32) -> bool {
    pattern == 0 || pattern == actual
}
