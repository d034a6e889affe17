use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "MetalliSense";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default backend API base URL (the Node gateway bridge in local deployments).
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Reconciliation interval: every 3 seconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

/// Per-request timeout for gateway calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Port for the loopback dashboard bridge. `0` picks an ephemeral port.
pub const DEFAULT_BRIDGE_PORT: u16 = 7410;

/// Gateway endpoint paths, relative to the API base URL.
pub const STATUS_PATH: &str = "/opc/status";
pub const CONNECT_PATH: &str = "/opc/connect";
pub const DISCONNECT_PATH: &str = "/opc/disconnect";

/// Lower bound for the poll interval; anything tighter hammers the gateway.
const MIN_POLL_INTERVAL_MS: u64 = 250;

/// Whether this is a debug build.
pub fn is_dev() -> bool {
    cfg!(debug_assertions)
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if is_dev() {
        "metallisense=debug,metallisense_lib=debug,info"
    } else {
        "metallisense=info,metallisense_lib=info,warn"
    }
}

// ═══════════════════════════════════════════════════════════
// GatewayConfig
// ═══════════════════════════════════════════════════════════

/// Runtime configuration for one gateway session.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Backend base URL, without trailing slash.
    pub api_url: String,
    /// Bearer token attached to every gateway call, if set.
    pub auth_token: Option<String>,
    /// Reconciliation interval.
    pub poll_interval: Duration,
    /// Per-request timeout for gateway calls.
    pub request_timeout: Duration,
    /// Loopback port for the dashboard bridge.
    pub bridge_port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_token: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            bridge_port: DEFAULT_BRIDGE_PORT,
        }
    }
}

impl GatewayConfig {
    /// Build configuration from `METALLISENSE_*` environment variables.
    ///
    /// Unset variables use the defaults. Unparseable values are logged and
    /// ignored rather than aborting startup.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Factored out from `from_env` so tests don't mutate process env.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("METALLISENSE_API_URL").filter(|u| !u.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }

        config.auth_token = lookup("METALLISENSE_API_TOKEN").filter(|t| !t.trim().is_empty());

        if let Some(ms) = parse_var::<u64>(&lookup, "METALLISENSE_POLL_INTERVAL_MS") {
            if ms < MIN_POLL_INTERVAL_MS {
                tracing::warn!(
                    requested_ms = ms,
                    min_ms = MIN_POLL_INTERVAL_MS,
                    "Poll interval below minimum, clamping"
                );
            }
            config.poll_interval = Duration::from_millis(ms.max(MIN_POLL_INTERVAL_MS));
        }

        if let Some(timeout) = parse_var::<u64>(&lookup, "METALLISENSE_REQUEST_TIMEOUT_SECS")
            .and_then(request_timeout_from_secs)
        {
            config.request_timeout = timeout;
        }

        if let Some(port) = parse_var::<u16>(&lookup, "METALLISENSE_BRIDGE_PORT") {
            config.bridge_port = port;
        }

        config
    }

    /// Full URL for a gateway endpoint path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

/// A zero timeout would fail every call immediately; keep the default.
fn request_timeout_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        tracing::warn!(
            default_secs = DEFAULT_REQUEST_TIMEOUT_SECS,
            "Request timeout of 0s is invalid, using default"
        );
        return None;
    }
    Some(Duration::from_secs(secs))
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config value");
            None
        }
    }
}
