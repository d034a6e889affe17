//! Status Reconciliation Loop.
//!
//! Re-queries the gateway every interval and writes the result into the
//! store unconditionally. A failed query writes a disconnected record:
//! when connectivity cannot be confirmed the dashboard shows disconnected
//! rather than a stale "connected".

use std::sync::Arc;
use std::time::Duration;

use super::client::GatewayStatusClient;
use super::scheduler::PeriodicTask;
use super::store::StatusStore;
use super::transport::GatewayApi;

/// Running reconciliation loop. Stop it with [`ReconciliationLoop::stop`];
/// dropping it also aborts the timer.
pub struct ReconciliationLoop {
    task: PeriodicTask,
}

impl ReconciliationLoop {
    /// Start polling. The first query happens one `interval` from now.
    pub fn start<A: GatewayApi>(
        client: Arc<GatewayStatusClient<A>>,
        store: Arc<StatusStore>,
        interval: Duration,
    ) -> Self {
        let task = PeriodicTask::spawn("gateway-reconcile", interval, move || {
            let client = client.clone();
            let store = store.clone();
            async move {
                reconcile_once(&client, &store).await;
            }
        });
        tracing::info!(interval_ms = interval.as_millis() as u64, "Gateway reconciliation started");
        Self { task }
    }

    pub fn ticks(&self) -> u64 {
        self.task.ticks()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_active()
    }

    /// Cancel the timer and wait for any in-flight tick to be torn down.
    pub async fn stop(self) {
        self.task.shutdown().await;
        tracing::info!("Gateway reconciliation stopped");
    }
}

/// One reconciliation step: query, then write whatever came back.
///
/// Returns `true` if the store accepted the write.
pub async fn reconcile_once<A: GatewayApi>(
    client: &GatewayStatusClient<A>,
    store: &StatusStore,
) -> bool {
    let was_connected = store.get_status().connected();
    let query = client.query_status().await;
    let now_connected = query.status.connected();

    if let Some(failure) = &query.failure {
        if was_connected {
            tracing::warn!(error = %failure, "Gateway status query failed, marking disconnected");
        } else {
            tracing::debug!(error = %failure, "Gateway status query failed");
        }
    } else if was_connected != now_connected {
        tracing::info!(
            connected = now_connected,
            endpoint = query.status.endpoint_address().unwrap_or("-"),
            "Gateway connectivity changed"
        );
    }

    store.set_status(query.status)
}
