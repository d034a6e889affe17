//! Application state shared by the host and the dashboard bridge.
//!
//! `CoreState` owns the configuration and the active gateway session.
//! Wrapped in `Arc` at startup so the bridge router and the host loop
//! share one instance. The session sits behind a tokio `Mutex` because
//! ending it awaits the reconciliation loop's shutdown.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::GatewayConfig;
use crate::gateway::{
    ConnectionCoordinator, GatewayApi, GatewayError, GatewaySession, HttpGatewayApi,
    SessionInfo, StatusStore, WritePolicy,
};

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Application state: configuration plus at most one active session.
pub struct CoreState<A: GatewayApi = HttpGatewayApi> {
    config: GatewayConfig,
    session: Mutex<Option<GatewaySession<A>>>,
}

/// Cheap handles into the active session.
///
/// Commands clone these out of the lock so a slow connect call never
/// blocks status reads.
pub struct GatewayHandle<A> {
    pub store: Arc<StatusStore>,
    pub coordinator: Arc<ConnectionCoordinator<A>>,
}

impl<A> Clone for GatewayHandle<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<A: GatewayApi> CoreState<A> {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            session: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Start and activate a session over `api`.
    ///
    /// Fails if a session is already active; end it first.
    pub async fn start_session_with(&self, api: A) -> Result<SessionInfo, CoreError> {
        let mut guard = self.session.lock().await;
        if guard.is_some() {
            return Err(CoreError::SessionAlreadyActive);
        }

        let mut session = GatewaySession::new(api, self.config.poll_interval, WritePolicy::default());
        session.activate();
        let info = session.info();
        *guard = Some(session);

        tracing::info!(session_id = %info.session_id, "Session started");
        Ok(info)
    }

    /// End the active session (logout / exit). No-op when none is active.
    pub async fn end_session(&self) {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            session.teardown().await;
        }
    }

    pub async fn has_session(&self) -> bool {
        self.session.lock().await.is_some()
    }

    pub async fn session_info(&self) -> Option<SessionInfo> {
        self.session.lock().await.as_ref().map(GatewaySession::info)
    }

    /// Handles into the active session.
    pub async fn gateway(&self) -> Result<GatewayHandle<A>, CoreError> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(CoreError::NoActiveSession)?;
        Ok(GatewayHandle {
            store: session.store(),
            coordinator: session.coordinator(),
        })
    }
}

impl CoreState<HttpGatewayApi> {
    /// Start a session against the configured backend.
    pub async fn start_session(&self) -> Result<SessionInfo, CoreError> {
        let api = HttpGatewayApi::new(&self.config)?;
        self.start_session_with(api).await
    }
}

/// Errors from core state operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("No active gateway session")]
    NoActiveSession,
    #[error("A gateway session is already active")]
    SessionAlreadyActive,
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
