/// Message shown when the gateway could not be reached at all.
pub const NETWORK_ERROR_MESSAGE: &str = "network error";

/// Fallback when a failed response carries no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Gateway request failed";

/// Errors from gateway calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No response reached us (connection refused, DNS, reset).
    #[error("Cannot reach gateway at {0}")]
    Transport(String),
    #[error("Gateway request timed out after {0}s")]
    Timeout(u64),
    /// Non-2xx response. `message` is already extracted from the body.
    #[error("Gateway returned {status}: {message}")]
    Application { status: u16, message: String },
    #[error("Response parsing failed: {0}")]
    ResponseParsing(String),
    #[error("HTTP client initialisation failed: {0}")]
    ClientInit(String),
}

impl GatewayError {
    /// Transport-level failures, as opposed to a response we could read.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    /// One-line text for the dashboard notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Timeout(_) => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Application { message, .. } => message.clone(),
            Self::ResponseParsing(_) | Self::ClientInit(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Checks `message` first, then a string `error` field. Anything else
/// (empty body, HTML error page, non-string fields) yields the generic text.
pub fn extract_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .or_else(|| v.get("error").and_then(|e| e.as_str()))
        })
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}
