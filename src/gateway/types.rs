//! Canonical gateway status record and command outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// GatewayStatus — the canonical record
// ═══════════════════════════════════════════════════════════

/// Normalized view of the OPC UA gateway's connectivity.
///
/// Every raw backend response is translated into this shape before it
/// reaches the store. Fields are private so a disconnected record can never
/// carry an endpoint address; build records with [`GatewayStatus::observed`],
/// [`GatewayStatus::disconnected_at`] or [`GatewayStatus::initial`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    connected: bool,
    endpoint_address: Option<String>,
    last_observed_at: Option<DateTime<Utc>>,
    last_success_at: Option<DateTime<Utc>>,
    raw_state: Option<String>,
    cached_payload: Option<serde_json::Value>,
}

impl GatewayStatus {
    /// Session-start record: disconnected, nothing observed yet.
    pub fn initial() -> Self {
        Self {
            connected: false,
            endpoint_address: None,
            last_observed_at: None,
            last_success_at: None,
            raw_state: None,
            cached_payload: None,
        }
    }

    /// A record built from a successful gateway response.
    ///
    /// `endpoint_address` is dropped when `connected` is false.
    pub fn observed(
        connected: bool,
        endpoint_address: Option<String>,
        raw_state: Option<String>,
        cached_payload: Option<serde_json::Value>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            connected,
            endpoint_address: if connected { endpoint_address } else { None },
            last_observed_at: Some(observed_at),
            last_success_at: Some(observed_at),
            raw_state,
            cached_payload,
        }
    }

    /// A fully disconnected record observed at `observed_at`.
    ///
    /// Used both for failed status queries and for confirmed disconnects.
    pub fn disconnected_at(observed_at: DateTime<Utc>) -> Self {
        Self {
            last_observed_at: Some(observed_at),
            ..Self::initial()
        }
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn endpoint_address(&self) -> Option<&str> {
        self.endpoint_address.as_deref()
    }

    pub fn last_observed_at(&self) -> Option<DateTime<Utc>> {
        self.last_observed_at
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    pub fn raw_state(&self) -> Option<&str> {
        self.raw_state.as_deref()
    }

    pub fn cached_payload(&self) -> Option<&serde_json::Value> {
        self.cached_payload.as_ref()
    }

    /// Conceptual connection state derived from `connected`.
    pub fn state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// One-line description for the connectivity indicator.
    ///
    /// Never reports an error state: anything that is not a confirmed
    /// connection reads as disconnected.
    pub fn summary(&self) -> String {
        match (self.connected, self.endpoint_address.as_deref()) {
            (true, Some(endpoint)) => format!("Connected to {endpoint}"),
            (true, None) => "Connected".to_string(),
            (false, _) => "Disconnected".to_string(),
        }
    }

    // ── Store-side adjustments ──────────────────────────────

    /// Raise `last_observed_at` to at least `floor`.
    pub(crate) fn clamp_observed_at(&mut self, floor: Option<DateTime<Utc>>) {
        if let (Some(floor), Some(current)) = (floor, self.last_observed_at) {
            if current < floor {
                self.last_observed_at = Some(floor);
            }
        }
        if self.last_observed_at.is_none() {
            self.last_observed_at = floor;
        }
    }

    /// Keep the most recent success time when this record has none.
    pub(crate) fn inherit_last_success(&mut self, previous: Option<DateTime<Utc>>) {
        if self.last_success_at.is_none() {
            self.last_success_at = previous;
        }
    }
}

impl Default for GatewayStatus {
    fn default() -> Self {
        Self::initial()
    }
}

/// Connectivity state machine over `GatewayStatus::connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// CommandOutcome — result of a connect/disconnect intent
// ═══════════════════════════════════════════════════════════

/// Result shape returned to the dashboard for connect/disconnect.
///
/// Failures are data, not errors: callers render `error` as a one-line
/// notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}
