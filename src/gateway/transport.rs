//! Raw HTTP access to the gateway endpoints.
//!
//! `GatewayApi` is the seam between the synchronizer and the network:
//! `HttpGatewayApi` talks to the real backend over `reqwest`,
//! `MockGatewayApi` replays scripted responses for tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use super::error::{extract_error_message, GatewayError};
use crate::config::{self, GatewayConfig};

/// The three remote gateway operations, without interpretation.
///
/// Implementations return the parsed JSON body on 2xx and a
/// [`GatewayError`] otherwise. A timed-out call must surface as
/// [`GatewayError::Timeout`].
pub trait GatewayApi: Send + Sync + 'static {
    /// `GET` the status endpoint.
    fn fetch_status(&self) -> impl Future<Output = Result<Value, GatewayError>> + Send;

    /// `POST` the connect endpoint.
    fn send_connect(&self) -> impl Future<Output = Result<Value, GatewayError>> + Send;

    /// `POST` the disconnect endpoint. The body is not read.
    fn send_disconnect(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

// ═══════════════════════════════════════════════════════════
// HttpGatewayApi
// ═══════════════════════════════════════════════════════════

/// `reqwest`-backed gateway transport.
pub struct HttpGatewayApi {
    client: reqwest::Client,
    status_url: String,
    connect_url: String,
    disconnect_url: String,
    auth_token: Option<String>,
    timeout_secs: u64,
}

impl HttpGatewayApi {
    /// Build a transport for the configured backend.
    ///
    /// Every request is bounded by `config.request_timeout`.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            status_url: config.endpoint(config::STATUS_PATH),
            connect_url: config.endpoint(config::CONNECT_PATH),
            disconnect_url: config.endpoint(config::DISCONNECT_PATH),
            auth_token: config.auth_token.clone(),
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::Timeout(self.timeout_secs)
        } else {
            tracing::debug!(url, error = %e, "Gateway request failed before a response");
            GatewayError::Transport(url.to_string())
        }
    }

    /// Send a request, reject non-2xx, and hand back the response.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Application {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(response)
    }

    async fn read_json(&self, response: reqwest::Response, url: &str) -> Result<Value, GatewayError> {
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(self.timeout_secs)
            } else {
                GatewayError::ResponseParsing(format!("{url}: {e}"))
            }
        })?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| GatewayError::ResponseParsing(e.to_string()))
    }
}

impl GatewayApi for HttpGatewayApi {
    async fn fetch_status(&self) -> Result<Value, GatewayError> {
        let response = self
            .execute(self.client.get(&self.status_url), &self.status_url)
            .await?;
        self.read_json(response, &self.status_url).await
    }

    async fn send_connect(&self) -> Result<Value, GatewayError> {
        let response = self
            .execute(self.client.post(&self.connect_url), &self.connect_url)
            .await?;
        self.read_json(response, &self.connect_url).await
    }

    async fn send_disconnect(&self) -> Result<(), GatewayError> {
        self.execute(self.client.post(&self.disconnect_url), &self.disconnect_url)
            .await?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// MockGatewayApi — scripted transport for tests
// ═══════════════════════════════════════════════════════════

/// Replays scripted responses in order.
///
/// Each queue repeats its last entry once drained, so a single scripted
/// status keeps answering every tick. An empty queue answers with a
/// transport error.
pub struct MockGatewayApi {
    status: Mutex<VecDeque<Result<Value, GatewayError>>>,
    connect: Mutex<VecDeque<Result<Value, GatewayError>>>,
    disconnect: Mutex<VecDeque<Result<(), GatewayError>>>,
    latency: Option<Duration>,
    status_calls: AtomicUsize,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
}

impl MockGatewayApi {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(VecDeque::new()),
            connect: Mutex::new(VecDeque::new()),
            disconnect: Mutex::new(VecDeque::new()),
            latency: None,
            status_calls: AtomicUsize::new(0),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
        }
    }

    /// Delay every call by `latency` (uses the tokio clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn push_status(&self, response: Result<Value, GatewayError>) -> &Self {
        push(&self.status, response);
        self
    }

    pub fn push_connect(&self, response: Result<Value, GatewayError>) -> &Self {
        push(&self.connect, response);
        self
    }

    pub fn push_disconnect(&self, response: Result<(), GatewayError>) -> &Self {
        push(&self.disconnect, response);
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MockGatewayApi {
    fn default() -> Self {
        Self::new()
    }
}

fn push<T>(queue: &Mutex<VecDeque<T>>, item: T) {
    if let Ok(mut q) = queue.lock() {
        q.push_back(item);
    }
}

fn next<T: Clone>(queue: &Mutex<VecDeque<Result<T, GatewayError>>>) -> Result<T, GatewayError> {
    let mut q = queue
        .lock()
        .map_err(|_| GatewayError::Transport("mock lock poisoned".into()))?;
    match q.len() {
        0 => Err(GatewayError::Transport("mock: nothing scripted".into())),
        1 => q[0].clone(),
        _ => q
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Transport("mock: nothing scripted".into()))),
    }
}

impl GatewayApi for MockGatewayApi {
    async fn fetch_status(&self) -> Result<Value, GatewayError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        next(&self.status)
    }

    async fn send_connect(&self) -> Result<Value, GatewayError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        next(&self.connect)
    }

    async fn send_disconnect(&self) -> Result<(), GatewayError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        next(&self.disconnect)
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    /// Authorization headers seen by the fake gateway.
    type SeenAuth = Arc<Mutex<Vec<Option<String>>>>;

    fn record_auth(seen: &SeenAuth, headers: &HeaderMap) {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push(value);
    }

    /// Spawn a fake gateway backend on an ephemeral loopback port.
    async fn spawn_fake_gateway(connect_fails: bool) -> (SocketAddr, SeenAuth) {
        let seen: SeenAuth = Arc::new(Mutex::new(Vec::new()));

        let status_seen = seen.clone();
        let connect_seen = seen.clone();
        let app = Router::new()
            .route(
                "/api/opc/status",
                get(move |headers: HeaderMap| {
                    let seen = status_seen.clone();
                    async move {
                        record_auth(&seen, &headers);
                        Json(json!({
                            "success": true,
                            "data": { "opcStatus": {
                                "client": { "isConnected": true, "endpointUrl": "opc.tcp://gw1" }
                            }},
                            "timestamp": "2025-01-15T08:30:00Z"
                        }))
                    }
                }),
            )
            .route(
                "/api/opc/connect",
                post(move |headers: HeaderMap| {
                    let seen = connect_seen.clone();
                    async move {
                        record_auth(&seen, &headers);
                        if connect_fails {
                            (
                                StatusCode::INTERNAL_SERVER_ERROR,
                                Json(json!({ "success": false, "message": "gateway busy" })),
                            )
                        } else {
                            (
                                StatusCode::OK,
                                Json(json!({ "data": { "client": { "endpointUrl": "opc.tcp://gw1" } } })),
                            )
                        }
                    }
                }),
            )
            .route("/api/opc/disconnect", post(|| async { StatusCode::NO_CONTENT }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (addr, seen)
    }

    fn config_for(addr: SocketAddr, token: Option<&str>) -> GatewayConfig {
        GatewayConfig {
            api_url: format!("http://{addr}/api"),
            auth_token: token.map(str::to_string),
            request_timeout: Duration::from_secs(2),
            ..GatewayConfig::default()
        }
    }

    #[tokio::test]
    async fn fetch_status_returns_body_and_sends_bearer() {
        let (addr, seen) = spawn_fake_gateway(false).await;
        let api = HttpGatewayApi::new(&config_for(addr, Some("tok-123"))).unwrap();

        let body = api.fetch_status().await.unwrap();
        assert_eq!(body["data"]["opcStatus"]["client"]["isConnected"], true);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[Some("Bearer tok-123".to_string())]);
    }

    #[tokio::test]
    async fn no_token_sends_no_authorization() {
        let (addr, seen) = spawn_fake_gateway(false).await;
        let api = HttpGatewayApi::new(&config_for(addr, None)).unwrap();

        api.fetch_status().await.unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[None]);
    }

    #[tokio::test]
    async fn connect_error_extracts_message() {
        let (addr, _) = spawn_fake_gateway(true).await;
        let api = HttpGatewayApi::new(&config_for(addr, None)).unwrap();

        let err = api.send_connect().await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Application {
                status: 500,
                message: "gateway busy".into()
            }
        );
    }

    #[tokio::test]
    async fn disconnect_accepts_empty_2xx() {
        let (addr, _) = spawn_fake_gateway(false).await;
        let api = HttpGatewayApi::new(&config_for(addr, None)).unwrap();
        assert!(api.send_disconnect().await.is_ok());
    }

    #[tokio::test]
    async fn unknown_route_is_application_error() {
        let (addr, _) = spawn_fake_gateway(false).await;
        let mut config = config_for(addr, None);
        config.api_url = format!("http://{addr}/wrong");
        let api = HttpGatewayApi::new(&config).unwrap();

        let err = api.fetch_status().await.unwrap_err();
        assert!(matches!(err, GatewayError::Application { status: 404, .. }));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpGatewayApi::new(&config_for(addr, None)).unwrap();
        let err = api.fetch_status().await.unwrap_err();
        assert!(err.is_network(), "expected network error, got {err:?}");
    }

    #[tokio::test]
    async fn slow_gateway_times_out_as_network_error() {
        let app = Router::new().route(
            "/api/opc/status",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "data": {} }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let config = GatewayConfig {
            request_timeout: Duration::from_secs(1),
            ..config_for(addr, None)
        };
        let api = HttpGatewayApi::new(&config).unwrap();

        let err = api.fetch_status().await.unwrap_err();
        assert_eq!(err, GatewayError::Timeout(1));
        assert!(err.is_network());
        assert_eq!(err.user_message(), "network error");
    }

    #[test]
    fn urls_built_from_config() {
        let api = HttpGatewayApi::new(&GatewayConfig::default()).unwrap();
        assert_eq!(api.status_url, "http://localhost:5000/api/opc/status");
        assert_eq!(api.connect_url, "http://localhost:5000/api/opc/connect");
        assert_eq!(api.disconnect_url, "http://localhost:5000/api/opc/disconnect");
        assert_eq!(api.timeout_secs, 30);
    }

    #[tokio::test]
    async fn mock_repeats_last_entry() {
        let mock = MockGatewayApi::new();
        mock.push_status(Ok(json!(1))).push_status(Ok(json!(2)));

        assert_eq!(mock.fetch_status().await.unwrap(), json!(1));
        assert_eq!(mock.fetch_status().await.unwrap(), json!(2));
        assert_eq!(mock.fetch_status().await.unwrap(), json!(2));
        assert_eq!(mock.status_calls(), 3);
    }

    #[tokio::test]
    async fn mock_without_script_is_transport_error() {
        let mock = MockGatewayApi::new();
        assert!(mock.send_disconnect().await.unwrap_err().is_network());
        assert_eq!(mock.disconnect_calls(), 1);
    }
}
