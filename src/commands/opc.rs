//! OPC gateway commands for the dashboard.
//!
//! Thin wrappers over the active session. Nothing here returns an error:
//! a missing session reads as disconnected and intents report failure as
//! data, so callers render feedback without error handling at each site.

use serde::Serialize;

use crate::core_state::{CoreError, CoreState};
use crate::gateway::{CommandOutcome, ConnectionState, GatewayApi, GatewayStatus};

/// Gateway status as shown by the connectivity indicator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpcStatusView {
    #[serde(flatten)]
    pub status: GatewayStatus,
    pub state: ConnectionState,
    /// Human-readable indicator text.
    pub summary: String,
    /// A connect/disconnect is in flight; the UI disables its buttons.
    pub busy: bool,
    pub session_active: bool,
}

impl OpcStatusView {
    fn from_status(status: GatewayStatus, busy: bool, session_active: bool) -> Self {
        Self {
            state: status.state(),
            summary: status.summary(),
            status,
            busy,
            session_active,
        }
    }
}

/// Current gateway status. Without a session this is the initial
/// disconnected record.
pub async fn get_opc_status<A: GatewayApi>(core: &CoreState<A>) -> OpcStatusView {
    match core.gateway().await {
        Ok(gateway) => OpcStatusView::from_status(
            gateway.store.get_status(),
            gateway.coordinator.is_busy(),
            true,
        ),
        Err(_) => OpcStatusView::from_status(GatewayStatus::initial(), false, false),
    }
}

/// Ask the gateway to connect.
pub async fn connect_opc<A: GatewayApi>(core: &CoreState<A>) -> CommandOutcome {
    match core.gateway().await {
        Ok(gateway) => gateway.coordinator.connect().await,
        Err(e) => no_session(e),
    }
}

/// Ask the gateway to disconnect.
pub async fn disconnect_opc<A: GatewayApi>(core: &CoreState<A>) -> CommandOutcome {
    match core.gateway().await {
        Ok(gateway) => gateway.coordinator.disconnect().await,
        Err(e) => no_session(e),
    }
}

fn no_session(e: CoreError) -> CommandOutcome {
    tracing::debug!(error = %e, "OPC command without session");
    CommandOutcome::failed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use crate::gateway::{GatewayError, MockGatewayApi};
    use serde_json::json;

    fn core() -> CoreState<MockGatewayApi> {
        CoreState::new(GatewayConfig::default())
    }

    #[tokio::test]
    async fn status_without_session_is_disconnected() {
        let view = get_opc_status(&core()).await;
        assert!(!view.session_active);
        assert_eq!(view.state, ConnectionState::Disconnected);
        assert_eq!(view.summary, "Disconnected");
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn intents_without_session_fail_as_data() {
        let core = core();
        let outcome = connect_opc(&core).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("No active gateway session"));
        assert!(!disconnect_opc(&core).await.success);
    }

    #[tokio::test]
    async fn connect_then_status_reflects_connection() {
        let core = core();
        let mock = MockGatewayApi::new();
        mock.push_connect(Ok(json!({
            "data": { "opcStatus": { "client": { "isConnected": true, "endpointUrl": "opc.tcp://gw1" } } }
        })));
        mock.push_disconnect(Ok(()));
        core.start_session_with(mock).await.unwrap();

        assert!(connect_opc(&core).await.success);
        let view = get_opc_status(&core).await;
        assert!(view.session_active);
        assert_eq!(view.state, ConnectionState::Connected);
        assert_eq!(view.summary, "Connected to opc.tcp://gw1");

        assert!(disconnect_opc(&core).await.success);
        assert_eq!(get_opc_status(&core).await.state, ConnectionState::Disconnected);

        core.end_session().await;
    }

    #[tokio::test]
    async fn connect_failure_returns_backend_message() {
        let core = core();
        let mock = MockGatewayApi::new();
        mock.push_connect(Err(GatewayError::Application {
            status: 503,
            message: "OPC server unreachable".into(),
        }));
        core.start_session_with(mock).await.unwrap();

        let outcome = connect_opc(&core).await;
        assert_eq!(outcome, CommandOutcome::failed("OPC server unreachable"));
        core.end_session().await;
    }

    #[test]
    fn view_serializes_flat_camel_case() {
        let view = OpcStatusView::from_status(GatewayStatus::initial(), false, true);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["connected"], false);
        assert_eq!(json["endpointAddress"], serde_json::Value::Null);
        assert_eq!(json["state"], "disconnected");
        assert_eq!(json["sessionActive"], true);
        assert_eq!(json["summary"], "Disconnected");
    }
}
