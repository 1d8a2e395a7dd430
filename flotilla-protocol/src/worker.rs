//! Worker launch descriptions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The role a worker process plays in the target cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerKind {
    /// A full cluster member.
    Member,
    /// A client connecting to members.
    Client,
}

impl WorkerKind {
    /// Whether this kind is a full cluster member.
    pub fn is_member(&self) -> bool {
        matches!(self, WorkerKind::Member)
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerKind::Member => "member",
            WorkerKind::Client => "client",
        };
        f.write_str(name)
    }
}

/// Launch settings for one worker process on one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    /// Index of this worker on its agent (1-based; 0 is the wildcard).
    pub worker_index: u32,
    /// The role this worker plays.
    pub kind: WorkerKind,
    /// Launch parameters the agent applies when spawning the process.
    pub params: BTreeMap<String, String>,
}

impl WorkerSettings {
    /// Create settings with an empty parameter map.
    pub fn new(worker_index: u32, kind: WorkerKind) -> Self {
        Self {
            worker_index,
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Add a launch parameter (builder style).
    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }
}
