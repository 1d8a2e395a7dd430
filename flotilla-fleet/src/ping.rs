//! Background worker liveness pings.
//!
//! While a run is active the coordinator pings every worker on a fixed
//! interval. Agents use the traffic to flag workers that stopped
//! answering; the loop itself only cares that delivery still works.

use std::sync::Arc;
use std::time::Duration;

use flotilla_protocol::{Operation, ALL_WORKERS};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::validate_response;
use crate::connector::Connector;
use crate::error::{FleetError, Result};

/// Handle to the running ping loop.
///
/// Call [`PingHandle::stop`] to shut the loop down and collect its result.
/// Dropping the handle instead stops the loop without collecting anything.
#[derive(Debug)]
pub struct PingHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Result<()>>,
}

impl PingHandle {
    /// Signals the loop to stop and waits for it to finish.
    ///
    /// Returns `Ok` after a clean shutdown, or the error that made the loop
    /// give up earlier.
    pub async fn stop(self) -> Result<()> {
        // The loop may already be gone; a dead receiver is fine.
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(result) => result,
            Err(_) => Err(FleetError::TaskPanicked {
                task: "worker ping loop".to_string(),
            }),
        }
    }

    /// Whether the loop has already exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns the ping loop on the current runtime.
pub(crate) fn spawn_ping_loop<C: Connector + 'static>(
    connector: Arc<C>,
    interval: Duration,
) -> PingHandle {
    let (shutdown, mut signal) = watch::channel(false);

    let task = tokio::spawn(async move {
        tracing::info!("Worker ping loop started (interval: {}ms)", interval.as_millis());

        loop {
            let outcome = tokio::select! {
                result = connector.send(ALL_WORKERS, Operation::Ping) => {
                    result
                        .map_err(FleetError::from)
                        .and_then(|response| validate_response(&Operation::Ping, &response))
                }
                _ = signal.changed() => break,
            };

            if let Err(err) = outcome {
                // A send cut short by our own shutdown is a clean exit.
                if *signal.borrow() {
                    break;
                }
                tracing::error!("Worker ping failed: {}", err);
                return Err(err);
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = signal.changed() => break,
            }
        }

        tracing::info!("Worker ping loop stopped");
        Ok(())
    });

    PingHandle { shutdown, task }
}
