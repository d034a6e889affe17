//! Gateway session: owns the store, client, coordinator and loop for one
//! application session.
//!
//! Created at login/startup, activated to begin polling, torn down at
//! logout/exit. Teardown stops the timer and resets the store so nothing
//! from this session leaks into the next.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::client::GatewayStatusClient;
use super::coordinator::ConnectionCoordinator;
use super::error::GatewayError;
use super::reconcile::ReconciliationLoop;
use super::store::{StatusStore, WritePolicy};
use super::transport::{GatewayApi, HttpGatewayApi};
use crate::config::GatewayConfig;

/// Session metadata for display and logs.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub started_at: String,
    pub poll_interval_ms: u64,
    pub polling: bool,
}

pub struct GatewaySession<A> {
    id: Uuid,
    started_at: DateTime<Utc>,
    poll_interval: Duration,
    store: Arc<StatusStore>,
    client: Arc<GatewayStatusClient<A>>,
    coordinator: Arc<ConnectionCoordinator<A>>,
    reconcile: Option<ReconciliationLoop>,
}

impl<A: GatewayApi> GatewaySession<A> {
    /// Wire up a session over `api`. Nothing is polled until [`activate`].
    ///
    /// [`activate`]: GatewaySession::activate
    pub fn new(api: A, poll_interval: Duration, policy: WritePolicy) -> Self {
        let store = Arc::new(StatusStore::with_policy(policy));
        let client = Arc::new(GatewayStatusClient::new(api));
        let coordinator = Arc::new(ConnectionCoordinator::new(client.clone(), store.clone()));

        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            poll_interval,
            store,
            client,
            coordinator,
            reconcile: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Read-only view of the session's status store.
    pub fn store(&self) -> Arc<StatusStore> {
        self.store.clone()
    }

    pub fn coordinator(&self) -> Arc<ConnectionCoordinator<A>> {
        self.coordinator.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.reconcile.as_ref().is_some_and(ReconciliationLoop::is_running)
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.id.to_string(),
            started_at: self.started_at.to_rfc3339(),
            poll_interval_ms: self.poll_interval.as_millis() as u64,
            polling: self.is_polling(),
        }
    }

    /// Start the reconciliation loop. No-op if already polling.
    ///
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self) {
        if self.reconcile.is_some() {
            return;
        }
        self.reconcile = Some(ReconciliationLoop::start(
            self.client.clone(),
            self.store.clone(),
            self.poll_interval,
        ));
        tracing::info!(session_id = %self.id, "Gateway session activated");
    }

    /// Stop polling. The store keeps its last record.
    pub async fn deactivate(&mut self) {
        if let Some(reconcile) = self.reconcile.take() {
            reconcile.stop().await;
            tracing::info!(session_id = %self.id, "Gateway session deactivated");
        }
    }

    /// End the session: stop polling and reset the store to its initial
    /// record.
    pub async fn teardown(mut self) {
        self.deactivate().await;
        self.store.reset();
        tracing::info!(session_id = %self.id, "Gateway session ended");
    }
}

impl GatewaySession<HttpGatewayApi> {
    /// Session over the real backend described by `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let api = HttpGatewayApi::new(config)?;
        Ok(Self::new(api, config.poll_interval, WritePolicy::default()))
    }
}
