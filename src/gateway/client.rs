//! Gateway Status Client: the three remote operations, normalized.
//!
//! Holds no state beyond the transport. Everything it returns is a
//! complete [`GatewayStatus`] built through [`wire::normalize_body`].

use chrono::Utc;

use super::error::GatewayError;
use super::transport::GatewayApi;
use super::types::GatewayStatus;
use super::wire;

/// Result of a status query.
///
/// `status` is always usable; `failure` carries the reason when the query
/// did not produce a readable response. A failed query is never an `Err`
/// so the reconciliation loop can write it like any other observation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusQuery {
    pub status: GatewayStatus,
    pub failure: Option<GatewayError>,
}

impl StatusQuery {
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Normalizing wrapper over a [`GatewayApi`].
pub struct GatewayStatusClient<A> {
    api: A,
}

impl<A: GatewayApi> GatewayStatusClient<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Borrow the underlying transport.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Read-only status request.
    ///
    /// On any failure the returned status is disconnected with only
    /// `last_observed_at` set.
    pub async fn query_status(&self) -> StatusQuery {
        match self.api.fetch_status().await {
            Ok(body) => StatusQuery {
                status: wire::normalize_body(&body, false, Utc::now()),
                failure: None,
            },
            Err(e) => StatusQuery {
                status: GatewayStatus::disconnected_at(Utc::now()),
                failure: Some(e),
            },
        }
    }

    /// Ask the gateway to open its session.
    ///
    /// A successful call implies a connection, so a response without
    /// `isConnected` normalizes as connected.
    pub async fn request_connect(&self) -> Result<GatewayStatus, GatewayError> {
        let body = self.api.send_connect().await?;
        Ok(wire::normalize_body(&body, true, Utc::now()))
    }

    /// Ask the gateway to close its session.
    ///
    /// The response body is ignored; the caller records the disconnect.
    pub async fn request_disconnect(&self) -> Result<(), GatewayError> {
        self.api.send_disconnect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::transport::MockGatewayApi;
    use serde_json::json;

    fn client_with(mock: MockGatewayApi) -> GatewayStatusClient<MockGatewayApi> {
        GatewayStatusClient::new(mock)
    }

    #[tokio::test]
    async fn query_status_normalizes_nested_shape() {
        let mock = MockGatewayApi::new();
        mock.push_status(Ok(json!({
            "data": { "opcStatus": {
                "client": { "isConnected": true, "endpointUrl": "opc.tcp://gw1", "status": "Connected" }
            }}
        })));
        let client = client_with(mock);

        let query = client.query_status().await;
        assert!(!query.is_failure());
        assert!(query.status.connected());
        assert_eq!(query.status.endpoint_address(), Some("opc.tcp://gw1"));
        assert_eq!(query.status.raw_state(), Some("Connected"));
    }

    #[tokio::test]
    async fn query_status_failure_is_disconnected_with_reason() {
        let mock = MockGatewayApi::new();
        mock.push_status(Err(GatewayError::Timeout(30)));
        let client = client_with(mock);

        let before = Utc::now();
        let query = client.query_status().await;
        assert_eq!(query.failure, Some(GatewayError::Timeout(30)));
        assert!(!query.status.connected());
        assert!(query.status.endpoint_address().is_none());
        assert!(query.status.raw_state().is_none());
        assert!(query.status.cached_payload().is_none());
        assert!(query.status.last_success_at().is_none());
        assert!(query.status.last_observed_at().unwrap() >= before);
    }

    #[tokio::test]
    async fn query_status_missing_fields_default_false() {
        let mock = MockGatewayApi::new();
        mock.push_status(Ok(json!({ "data": {} })));
        let client = client_with(mock);

        let query = client.query_status().await;
        assert!(!query.is_failure());
        assert!(!query.status.connected());
    }

    #[tokio::test]
    async fn connect_defaults_to_connected_when_flag_omitted() {
        let mock = MockGatewayApi::new();
        mock.push_connect(Ok(json!({ "data": { "client": { "endpointUrl": "opc.tcp://gw1" } } })));
        let client = client_with(mock);

        let status = client.request_connect().await.unwrap();
        assert!(status.connected());
        assert_eq!(status.endpoint_address(), Some("opc.tcp://gw1"));
    }

    #[tokio::test]
    async fn connect_respects_explicit_false() {
        let mock = MockGatewayApi::new();
        mock.push_connect(Ok(json!({ "data": { "opcStatus": { "client": { "isConnected": false } } } })));
        let client = client_with(mock);

        let status = client.request_connect().await.unwrap();
        assert!(!status.connected());
    }

    #[tokio::test]
    async fn connect_error_propagates() {
        let mock = MockGatewayApi::new();
        mock.push_connect(Err(GatewayError::Application {
            status: 500,
            message: "gateway busy".into(),
        }));
        let client = client_with(mock);

        let err = client.request_connect().await.unwrap_err();
        assert_eq!(err.user_message(), "gateway busy");
    }

    #[tokio::test]
    async fn disconnect_passes_through() {
        let mock = MockGatewayApi::new();
        mock.push_disconnect(Ok(()));
        let client = client_with(mock);

        assert!(client.request_disconnect().await.is_ok());
        assert_eq!(client.api().disconnect_calls(), 1);
    }
}
