//! Coordinator-side fleet client.
//!
//! [`FleetClient`] drives the whole lifecycle of a run: launching the
//! worker layout, fanning test operations out across the fleet and taking
//! everything down again in a safe order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use flotilla_protocol::{
    Address, CreateTest, CreateWorkers, InitTestSuite, Log, LogLevel, Operation, Response,
    StartTestPhase, TestCase, TestPhase, TestSuite, WorkerKind, WorkerSettings, ALL_AGENTS,
    ALL_WORKERS,
};
use tokio::task::JoinHandle;

use crate::config::FleetConfig;
use crate::connector::Connector;
use crate::error::{FleetError, Result};
use crate::layout::FleetLayout;
use crate::ping::{spawn_ping_loop, PingHandle};
use crate::registry::{Registry, TestData};

/// Checks every entry of a fleet response, failing on the first non-success.
///
/// Validation of fleet responses funnels through here so every failure is
/// reported the same way: the operation, the exact component that refused
/// and the outcome it reported.
pub fn validate_response(operation: &Operation, response: &Response) -> Result<()> {
    if let Some((source, outcome)) = response.first_failure() {
        return Err(FleetError::OperationFailed {
            operation: operation.name().to_string(),
            source,
            outcome,
        });
    }
    Ok(())
}

/// Coordinator-side handle to the whole fleet.
pub struct FleetClient<C: Connector> {
    connector: Arc<C>,
    registry: Arc<Registry>,
    ping_interval: Duration,
    worker_startup_timeout: Duration,
    ping: tokio::sync::Mutex<Option<PingHandle>>,
}

impl<C: Connector + 'static> FleetClient<C> {
    /// Creates a client over the given connector and registry.
    pub fn new(connector: Arc<C>, registry: Arc<Registry>, config: &FleetConfig) -> Self {
        FleetClient {
            connector,
            registry,
            ping_interval: config.ping_interval(),
            worker_startup_timeout: config.worker_startup_timeout(),
            ping: tokio::sync::Mutex::new(None),
        }
    }

    /// The registry this client records fleet state in.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Launches the whole worker layout across the fleet.
    ///
    /// Members are created before clients, so cluster seeds exist by the
    /// time the first client connects. Within one kind, creation fans out
    /// to all agents concurrently; each batch is recorded in the registry
    /// as its agent confirms it, so a partial failure leaves the registry
    /// reflecting exactly the workers that are running. Once every worker
    /// is up, agents are told to start timeout detection, and the liveness
    /// ping loop starts when `start_ping_loop` is set and none is running.
    pub async fn create_workers(&self, layout: &FleetLayout, start_ping_loop: bool) -> Result<()> {
        self.create_workers_of_kind(layout, WorkerKind::Member).await?;
        self.create_workers_of_kind(layout, WorkerKind::Client).await?;

        self.send_to_all_agents(Operation::StartTimeoutDetection).await?;

        if start_ping_loop {
            let mut ping = self.ping.lock().await;
            if ping.is_none() {
                *ping = Some(spawn_ping_loop(
                    Arc::clone(&self.connector),
                    self.ping_interval,
                ));
            }
        }
        Ok(())
    }

    async fn create_workers_of_kind(&self, layout: &FleetLayout, kind: WorkerKind) -> Result<()> {
        let mut tasks: Vec<(Address, JoinHandle<Result<()>>)> = Vec::new();

        for agent in &layout.agents {
            let settings = agent.workers_of_kind(kind);
            if settings.is_empty() {
                continue;
            }
            let connector = Arc::clone(&self.connector);
            let registry = Arc::clone(&self.registry);
            let agent_address = agent.agent;
            let timeout = self.worker_startup_timeout;
            let task = tokio::spawn(async move {
                create_workers_on_agent(connector, registry, agent_address, kind, settings, timeout)
                    .await
            });
            tasks.push((agent_address, task));
        }

        // Join every task before reporting, so one agent's failure never
        // leaves another agent's confirmation unrecorded.
        let mut first_error = None;
        for (agent_address, task) in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(_) => Err(FleetError::TaskPanicked {
                    task: format!("worker creation on {agent_address}"),
                }),
            };
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Terminates every registered worker, optionally stopping the ping
    /// loop first.
    ///
    /// Non-member workers go down first, so no client is left talking to a
    /// cluster that is already gone. Each worker is terminated with its own
    /// send, so a refusal is attributed to its exact address.
    pub async fn terminate_workers(&self, stop_ping_loop: bool) -> Result<()> {
        if stop_ping_loop {
            self.send_to_all_agents(Operation::StopTimeoutDetection).await?;
            let handle = self.ping.lock().await.take();
            if let Some(handle) = handle {
                handle.stop().await?;
            }
        }

        self.terminate_workers_of(|kind| !kind.is_member()).await?;
        self.terminate_workers_of(|kind| kind.is_member()).await?;
        Ok(())
    }

    async fn terminate_workers_of(&self, select: impl Fn(WorkerKind) -> bool) -> Result<()> {
        for worker in self.registry.workers() {
            if !select(worker.settings.kind) {
                continue;
            }
            let response = self
                .connector
                .send(worker.address, Operation::TerminateWorker)
                .await?;
            validate_response(&Operation::TerminateWorker, &response)?;
        }
        Ok(())
    }

    /// Hands the suite definition to every agent.
    pub async fn init_test_suite(&self, suite: &TestSuite) -> Result<()> {
        self.send_to_all_agents(Operation::InitTestSuite(InitTestSuite {
            suite: suite.clone(),
        }))
        .await
    }

    /// Registers a test and instantiates it on every worker.
    pub async fn create_test(&self, test_case: &TestCase) -> Result<TestData> {
        let data = self.registry.add_test(test_case);
        self.send_to_all_workers(Operation::CreateTest(CreateTest {
            test_index: data.test_index,
            test_case: test_case.clone(),
        }))
        .await?;
        Ok(data)
    }

    /// Runs one lifecycle phase of a test.
    ///
    /// Global phases go to the designated first worker only; every other
    /// phase fans out to all workers hosting the test.
    pub async fn start_test_phase(&self, test_id: &str, phase: TestPhase) -> Result<()> {
        let operation = Operation::StartTestPhase(StartTestPhase { phase });
        if is_global_phase(phase) {
            self.send_to_test_on_first_worker(test_id, operation).await
        } else {
            self.send_to_test_on_all_workers(test_id, operation).await
        }
    }

    /// Signals a test's run phase to wind down.
    pub async fn stop_test(&self, test_id: &str) -> Result<()> {
        self.send_to_test_on_all_workers(test_id, Operation::StopTest)
            .await
    }

    /// Writes an info line into every agent's log.
    ///
    /// Log delivery is advisory, so the response is not validated.
    pub async fn log_on_all_agents(&self, message: &str) -> Result<()> {
        self.connector.send(ALL_AGENTS, log_operation(message)).await?;
        Ok(())
    }

    /// Writes an info line into every worker's log. Not validated, like
    /// [`FleetClient::log_on_all_agents`].
    pub async fn log_on_all_workers(&self, message: &str) -> Result<()> {
        self.connector.send(ALL_WORKERS, log_operation(message)).await?;
        Ok(())
    }

    /// Sends an operation to every agent and validates every answer.
    pub async fn send_to_all_agents(&self, operation: Operation) -> Result<()> {
        let response = self.connector.send(ALL_AGENTS, operation.clone()).await?;
        validate_response(&operation, &response)
    }

    /// Sends an operation to every worker and validates every answer.
    pub async fn send_to_all_workers(&self, operation: Operation) -> Result<()> {
        let response = self.connector.send(ALL_WORKERS, operation.clone()).await?;
        validate_response(&operation, &response)
    }

    /// Sends an operation to the designated first worker only.
    pub async fn send_to_first_worker(&self, operation: Operation) -> Result<()> {
        let worker = self.registry.first_worker().ok_or(FleetError::NoWorkers)?;
        let response = self.connector.send(worker.address, operation.clone()).await?;
        validate_response(&operation, &response)
    }

    /// Sends an operation to one test on every worker hosting it.
    pub async fn send_to_test_on_all_workers(
        &self,
        test_id: &str,
        operation: Operation,
    ) -> Result<()> {
        let test = self.lookup_test(test_id)?;
        let response = self.connector.send(test.address, operation.clone()).await?;
        validate_response(&operation, &response)
    }

    /// Sends an operation to one test on the designated first worker only.
    pub async fn send_to_test_on_first_worker(
        &self,
        test_id: &str,
        operation: Operation,
    ) -> Result<()> {
        let test = self.lookup_test(test_id)?;
        let worker = self.registry.first_worker().ok_or(FleetError::NoWorkers)?;
        let destination = worker.address.child(test.test_index)?;
        let response = self.connector.send(destination, operation.clone()).await?;
        validate_response(&operation, &response)
    }

    /// Whether the background ping loop is currently active.
    pub async fn is_ping_loop_running(&self) -> bool {
        match self.ping.lock().await.as_ref() {
            Some(handle) => !handle.is_finished(),
            None => false,
        }
    }

    fn lookup_test(&self, test_id: &str) -> Result<TestData> {
        self.registry
            .test(test_id)
            .ok_or_else(|| FleetError::TestNotRegistered {
                test_id: test_id.to_string(),
            })
    }
}

impl<C: Connector> fmt::Debug for FleetClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FleetClient")
            .field("agents", &self.registry.agent_count())
            .field("workers", &self.registry.worker_count())
            .finish()
    }
}

async fn create_workers_on_agent<C: Connector>(
    connector: Arc<C>,
    registry: Arc<Registry>,
    agent: Address,
    kind: WorkerKind,
    settings: Vec<WorkerSettings>,
    timeout: Duration,
) -> Result<()> {
    let count = settings.len();
    let operation = Operation::CreateWorkers(CreateWorkers {
        settings: settings.clone(),
    });

    let response = match tokio::time::timeout(timeout, connector.send(agent, operation)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(FleetError::WorkerCreationTimedOut {
                agent,
                timeout_secs: timeout.as_secs(),
            })
        }
    };

    if let Some((_, outcome)) = response.first_failure() {
        return Err(FleetError::WorkerCreationFailed {
            count,
            kind,
            agent,
            outcome,
        });
    }

    registry.add_workers(agent, &settings);
    tracing::info!("Created {} {} worker(s) on {}", count, kind, agent);
    Ok(())
}

fn log_operation(message: &str) -> Operation {
    Operation::Log(Log {
        message: message.to_string(),
        level: LogLevel::Info,
    })
}

fn is_global_phase(phase: TestPhase) -> bool {
    matches!(
        phase,
        TestPhase::GlobalWarmup | TestPhase::GlobalVerify | TestPhase::GlobalTeardown
    )
}
