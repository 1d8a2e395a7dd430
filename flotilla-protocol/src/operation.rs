//! Fleet commands.
//!
//! Operations are immutable value objects: each variant carries only the
//! data needed to execute it, never transport state. Wildcard fan-out and
//! response aggregation happen in the connector, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ProtocolError, TestCase, TestPhase, TestSuite, WorkerSettings};

/// All commands a coordinator can submit to the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    /// Write a line into the destination's log
    Log(Log),
    /// Liveness probe, answered by every addressed worker
    Ping,
    /// Launch a batch of workers on the addressed agent
    CreateWorkers(CreateWorkers),
    /// Shut down the addressed worker process
    TerminateWorker,
    /// Hand the full suite definition to the addressed agents
    InitTestSuite(InitTestSuite),
    /// Begin flagging workers that stop answering pings
    StartTimeoutDetection,
    /// Suspend worker-liveness timeout tracking
    StopTimeoutDetection,
    /// Instantiate a test on the addressed workers
    CreateTest(CreateTest),
    /// Run one lifecycle phase of the addressed test
    StartTestPhase(StartTestPhase),
    /// Signal the addressed test's run phase to wind down
    StopTest,
}

impl Operation {
    /// Stable name of this operation, used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Log(_) => "Log",
            Operation::Ping => "Ping",
            Operation::CreateWorkers(_) => "CreateWorkers",
            Operation::TerminateWorker => "TerminateWorker",
            Operation::InitTestSuite(_) => "InitTestSuite",
            Operation::StartTimeoutDetection => "StartTimeoutDetection",
            Operation::StopTimeoutDetection => "StopTimeoutDetection",
            Operation::CreateTest(_) => "CreateTest",
            Operation::StartTestPhase(_) => "StartTestPhase",
            Operation::StopTest => "StopTest",
        }
    }

    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        rmp_serde::to_vec(self).map_err(ProtocolError::Encode)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        rmp_serde::from_slice(bytes).map_err(ProtocolError::Decode)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Severity of a [`Log`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress reporting.
    Info,
    /// Something looks off but the run continues.
    Warn,
    /// A failure worth surfacing in every log.
    Error,
}

/// A log line for the destination's log output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// The line to log.
    pub message: String,
    /// Severity to log it at.
    pub level: LogLevel,
}

/// Launch settings for a batch of workers on one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWorkers {
    /// One entry per worker to launch.
    pub settings: Vec<WorkerSettings>,
}

/// The full suite definition, sent to agents before any phase runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitTestSuite {
    /// The suite to prepare for.
    pub suite: TestSuite,
}

/// Instantiate one test on the addressed workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTest {
    /// Fleet-wide index assigned to the test (becomes its address
    /// component).
    pub test_index: u32,
    /// The test's definition.
    pub test_case: TestCase,
}

/// Run one lifecycle phase of the addressed test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTestPhase {
    /// The phase to run.
    pub phase: TestPhase,
}
