//! Shared Status Store: the single current [`GatewayStatus`] for a session.
//!
//! Backed by a `tokio::sync::watch` channel. Every write replaces the whole
//! record inside the channel's lock, so readers and subscribers only ever
//! see complete records. Watchers are notified of the latest value; bursts
//! of writes may coalesce into one notification.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::types::GatewayStatus;

/// How the store resolves a write carrying an older observation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Every write lands; an older `last_observed_at` is raised to the
    /// stored one so the timestamp never goes backwards.
    #[default]
    LastWriteWins,
    /// Writes observed strictly before the stored record are dropped.
    NewestObservation,
}

pub struct StatusStore {
    tx: watch::Sender<GatewayStatus>,
    policy: WritePolicy,
    writes: AtomicU64,
}

impl StatusStore {
    /// Store holding the initial disconnected record.
    pub fn new() -> Self {
        Self::with_policy(WritePolicy::default())
    }

    pub fn with_policy(policy: WritePolicy) -> Self {
        let (tx, _rx) = watch::channel(GatewayStatus::initial());
        Self {
            tx,
            policy,
            writes: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Snapshot of the current record.
    pub fn get_status(&self) -> GatewayStatus {
        self.tx.borrow().clone()
    }

    /// Watch channel receiver; `changed()` resolves after each write.
    pub fn subscribe(&self) -> watch::Receiver<GatewayStatus> {
        self.tx.subscribe()
    }

    /// Run `callback` with the latest record after every change.
    ///
    /// The callback runs on a spawned tokio task until the returned
    /// [`Subscription`] is dropped or unsubscribed. Must be called from
    /// within a tokio runtime.
    pub fn on_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&GatewayStatus) + Send + 'static,
    {
        let mut rx = self.tx.subscribe();
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let status = rx.borrow_and_update().clone();
                callback(&status);
            }
        });
        Subscription {
            handle: Some(handle),
        }
    }

    /// Number of writes that landed since the store was created.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Replace the record. Returns `false` if the write policy dropped it.
    pub(crate) fn set_status(&self, mut status: GatewayStatus) -> bool {
        let policy = self.policy;
        let applied = self.tx.send_if_modified(|current| {
            let floor = current.last_observed_at();
            if policy == WritePolicy::NewestObservation {
                if let (Some(stored), Some(incoming)) = (floor, status.last_observed_at()) {
                    if incoming < stored {
                        return false;
                    }
                }
            }
            status.clamp_observed_at(floor);
            status.inherit_last_success(current.last_success_at());
            *current = status;
            true
        });

        if applied {
            self.writes.fetch_add(1, Ordering::SeqCst);
        } else {
            tracing::debug!("Dropped out-of-order gateway status write");
        }
        applied
    }

    /// Back to the initial record (session teardown).
    pub(crate) fn reset(&self) {
        self.tx.send_replace(GatewayStatus::initial());
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Subscription — RAII callback registration
// ═══════════════════════════════════════════════════════════

/// Handle for an `on_change` callback. Dropping it unsubscribes.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.stop();
    }
}
