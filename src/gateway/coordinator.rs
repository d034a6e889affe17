//! Connection Intent Coordinator.
//!
//! The only way the rest of the application changes gateway connectivity.
//! Successful commands are written to the store immediately; failures
//! leave the store alone and come back as [`CommandOutcome`] data.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::client::GatewayStatusClient;
use super::store::StatusStore;
use super::transport::GatewayApi;
use super::types::{CommandOutcome, GatewayStatus};

/// What kind of intent is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Connect,
    Disconnect,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Disconnect => write!(f, "disconnect"),
        }
    }
}

pub struct ConnectionCoordinator<A> {
    client: Arc<GatewayStatusClient<A>>,
    store: Arc<StatusStore>,
    in_flight: AtomicUsize,
}

impl<A: GatewayApi> ConnectionCoordinator<A> {
    pub fn new(client: Arc<GatewayStatusClient<A>>, store: Arc<StatusStore>) -> Self {
        Self {
            client,
            store,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// True while any connect/disconnect call is in flight.
    ///
    /// Independent of reconciliation activity.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Current status snapshot.
    pub fn status(&self) -> GatewayStatus {
        self.store.get_status()
    }

    /// Open the gateway session.
    ///
    /// On success the normalized post-connect status is written without
    /// waiting for the next reconciliation tick. On failure the previous
    /// observation stays in place.
    pub async fn connect(&self) -> CommandOutcome {
        let _busy = BusyGuard::enter(&self.in_flight, Intent::Connect);

        match self.client.request_connect().await {
            Ok(status) => {
                tracing::info!(
                    connected = status.connected(),
                    endpoint = status.endpoint_address().unwrap_or("-"),
                    "Gateway connect succeeded"
                );
                self.store.set_status(status);
                CommandOutcome::ok()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gateway connect failed");
                CommandOutcome::failed(e.user_message())
            }
        }
    }

    /// Close the gateway session.
    ///
    /// On success the store is set fully disconnected. Disconnecting while
    /// already disconnected is not an error.
    pub async fn disconnect(&self) -> CommandOutcome {
        let _busy = BusyGuard::enter(&self.in_flight, Intent::Disconnect);

        match self.client.request_disconnect().await {
            Ok(()) => {
                tracing::info!("Gateway disconnect succeeded");
                self.store.set_status(GatewayStatus::disconnected_at(Utc::now()));
                CommandOutcome::ok()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gateway disconnect failed");
                CommandOutcome::failed(e.user_message())
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// BusyGuard — RAII in-flight marker
// ═══════════════════════════════════════════════════════════

/// Counts one in-flight intent; released on drop, including when the
/// calling future is cancelled.
struct BusyGuard<'a> {
    counter: &'a AtomicUsize,
    intent: Intent,
}

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize, intent: Intent) -> Self {
        let previous = counter.fetch_add(1, Ordering::SeqCst);
        if previous > 0 {
            tracing::debug!(%intent, in_flight = previous + 1, "Gateway intent overlaps another");
        }
        Self { counter, intent }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(intent = %self.intent, "Gateway intent finished");
    }
}
