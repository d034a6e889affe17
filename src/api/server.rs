//! Bridge server lifecycle: starts/stops the axum HTTP server that serves
//! the dashboard bridge API.
//!
//! bind → spawn background task → return handle with shutdown channel.
//! The bridge only ever binds loopback addresses; the dashboard runs on the
//! same machine.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::router::bridge_router;
use crate::core_state::CoreState;
use crate::gateway::GatewayApi;

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

/// Session metadata for a running bridge server.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running bridge server.
pub struct BridgeServer {
    pub session: BridgeSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl BridgeServer {
    /// Signal graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Bridge server shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for in-flight requests to drain.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Start the bridge server on `127.0.0.1:port`. Port `0` picks an
/// ephemeral port.
pub async fn start_bridge_server<A: GatewayApi>(
    core: Arc<CoreState<A>>,
    port: u16,
) -> Result<BridgeServer, String> {
    start_bridge_server_on(core, IpAddr::V4(Ipv4Addr::LOCALHOST), port).await
}

/// Start the bridge server on a specific loopback address.
pub async fn start_bridge_server_on<A: GatewayApi>(
    core: Arc<CoreState<A>>,
    ip: IpAddr,
    port: u16,
) -> Result<BridgeServer, String> {
    if !ip.is_loopback() {
        return Err(format!("Bridge must bind a loopback address, got {ip}"));
    }

    // 1. Bind
    let listener = tokio::net::TcpListener::bind(SocketAddr::new(ip, port))
        .await
        .map_err(|e| format!("Failed to bind bridge server: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    // 2. Build the router
    let app = bridge_router(core);

    // 3. Session metadata
    let session = BridgeSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    // 4. Shutdown signal
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    // 5. Serve in background
    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Bridge server received shutdown signal");
        };

        tracing::info!(%addr, "Bridge server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Bridge server error: {e}");
        }

        tracing::info!("Bridge server stopped");
    });

    Ok(BridgeServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
