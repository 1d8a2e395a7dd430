//! Aggregated command results.
//!
//! One submitted operation may fan out to many concrete recipients; the
//! connector collects every answer into a single [`Response`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::Address;

/// Outcome code reported by a single responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The operation executed successfully.
    Success,
    /// The addressed agent is unknown to the responder.
    AgentNotFound,
    /// The addressed worker is unknown to the responder.
    WorkerNotFound,
    /// The addressed test is unknown to the responder.
    TestNotFound,
    /// The operation ran and failed.
    ExecutionFailed,
    /// The operation was cut short by responder shutdown.
    Interrupted,
}

impl Outcome {
    /// Whether this outcome reports success.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Success => "Success",
            Outcome::AgentNotFound => "AgentNotFound",
            Outcome::WorkerNotFound => "WorkerNotFound",
            Outcome::TestNotFound => "TestNotFound",
            Outcome::ExecutionFailed => "ExecutionFailed",
            Outcome::Interrupted => "Interrupted",
        };
        f.write_str(name)
    }
}

/// Aggregated answers to one submitted operation.
///
/// Contains exactly one entry per concrete recipient that answered.
/// Responders are always concrete addresses; wildcard destinations are
/// expanded by the connector before any answer comes back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    entries: BTreeMap<Address, Outcome>,
}

impl Response {
    /// Create an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// A response reporting success from every given responder.
    pub fn success_from(sources: impl IntoIterator<Item = Address>) -> Self {
        let mut response = Self::new();
        for source in sources {
            response.add(source, Outcome::Success);
        }
        response
    }

    /// Record the outcome reported by one responder.
    pub fn add(&mut self, source: Address, outcome: Outcome) {
        self.entries.insert(source, outcome);
    }

    /// Iterate over (responder, outcome) pairs in address order.
    pub fn entries(&self) -> impl Iterator<Item = (&Address, &Outcome)> {
        self.entries.iter()
    }

    /// Number of responders recorded.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no responder is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The lowest-addressed non-success entry, if any.
    pub fn first_failure(&self) -> Option<(Address, Outcome)> {
        self.entries
            .iter()
            .find(|(_, outcome)| !outcome.is_success())
            .map(|(address, outcome)| (*address, *outcome))
    }
}
