//! Hierarchical fleet addressing.
//!
//! Every component of a running fleet sits at one of four levels:
//! coordinator, agent, worker, test. An [`Address`] names one component,
//! or a whole subtree when an index is the wildcard `0`. The two useful
//! wildcard destinations have named constants, [`ALL_AGENTS`] and
//! [`ALL_WORKERS`]; they are valid only as destinations, never as a
//! responder's identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProtocolError;

/// The hierarchy level an address points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AddressLevel {
    /// The single coordinating process.
    Coordinator,
    /// An agent managing workers on one host.
    Agent,
    /// A worker process hosting test containers.
    Worker,
    /// A test instance inside a worker.
    Test,
}

/// Immutable identifier of one fleet component or subtree.
///
/// Index components are 1-based; index `0` at the addressed level (or any
/// level above it) means "all". Equality and ordering are structural:
/// level first, then agent, worker and test indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    level: AddressLevel,
    agent: u32,
    worker: u32,
    test: u32,
}

/// Destination matching every agent in the fleet.
pub const ALL_AGENTS: Address = Address::agent(0);

/// Destination matching every worker on every agent.
pub const ALL_WORKERS: Address = Address::worker(0, 0);

impl Address {
    /// The coordinator's own address.
    pub const fn coordinator() -> Self {
        Self {
            level: AddressLevel::Coordinator,
            agent: 0,
            worker: 0,
            test: 0,
        }
    }

    /// Address of one agent (or all agents when `agent` is 0).
    pub const fn agent(agent: u32) -> Self {
        Self {
            level: AddressLevel::Agent,
            agent,
            worker: 0,
            test: 0,
        }
    }

    /// Address of one worker on one agent. A 0 component widens that
    /// position to "all".
    pub const fn worker(agent: u32, worker: u32) -> Self {
        Self {
            level: AddressLevel::Worker,
            agent,
            worker,
            test: 0,
        }
    }

    /// Address of one test instance inside a worker. A 0 component widens
    /// that position to "all"; `Address::test(0, 0, 3)` is test 3 on every
    /// worker in the fleet.
    pub const fn test(agent: u32, worker: u32, test: u32) -> Self {
        Self {
            level: AddressLevel::Test,
            agent,
            worker,
            test,
        }
    }

    /// The level this address points at.
    pub fn level(&self) -> AddressLevel {
        self.level
    }

    /// The agent component (0 = all agents).
    pub fn agent_index(&self) -> u32 {
        self.agent
    }

    /// The worker component (0 = all workers).
    pub fn worker_index(&self) -> u32 {
        self.worker
    }

    /// The test component (0 = all tests).
    pub fn test_index(&self) -> u32 {
        self.test
    }

    /// Whether this address names more than one concrete component.
    pub fn is_wildcard(&self) -> bool {
        match self.level {
            AddressLevel::Coordinator => false,
            AddressLevel::Agent => self.agent == 0,
            AddressLevel::Worker => self.agent == 0 || self.worker == 0,
            AddressLevel::Test => self.agent == 0 || self.worker == 0 || self.test == 0,
        }
    }

    /// Derive the address one level down, with the given index at the new
    /// level.
    ///
    /// # Errors
    ///
    /// Fails for test-level addresses, which have no child level.
    pub fn child(&self, index: u32) -> Result<Address, ProtocolError> {
        match self.level {
            AddressLevel::Coordinator => Ok(Address::agent(index)),
            AddressLevel::Agent => Ok(Address::worker(self.agent, index)),
            AddressLevel::Worker => Ok(Address::test(self.agent, self.worker, index)),
            AddressLevel::Test => Err(ProtocolError::NoChildLevel { address: *self }),
        }
    }

    /// The address one level up, or `None` for the coordinator.
    pub fn parent(&self) -> Option<Address> {
        match self.level {
            AddressLevel::Coordinator => None,
            AddressLevel::Agent => Some(Address::coordinator()),
            AddressLevel::Worker => Some(Address::agent(self.agent)),
            AddressLevel::Test => Some(Address::worker(self.agent, self.worker)),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C")?;
        if self.level >= AddressLevel::Agent {
            write_component(f, 'A', self.agent)?;
        }
        if self.level >= AddressLevel::Worker {
            write_component(f, 'W', self.worker)?;
        }
        if self.level >= AddressLevel::Test {
            write_component(f, 'T', self.test)?;
        }
        Ok(())
    }
}

fn write_component(f: &mut fmt::Formatter<'_>, tag: char, index: u32) -> fmt::Result {
    if index == 0 {
        write!(f, "_{tag}*")
    } else {
        write!(f, "_{tag}{index}")
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}
