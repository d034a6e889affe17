//! Gateway response adapters.
//!
//! The backend returns the same logical status in more than one nesting:
//!
//! ```text
//! nested: { data: { opcStatus: { client: {..}, server: {..} } }, timestamp }
//! flat:   { data: { client: {..}, server: {..} }, timestamp }
//! bare:   { client: {..}, server: {..}, timestamp }
//! ```
//!
//! Each known shape has one adapter producing a [`StatusReport`]; only
//! [`normalize`] turns a report into a [`GatewayStatus`]. Supporting a new
//! shape means adding one adapter to [`ADAPTERS`].

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::GatewayStatus;

/// Canonical internal form of a gateway status response.
///
/// Every field is optional: the backend omits fields freely and wrongly
/// typed fields are treated as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    pub is_connected: Option<bool>,
    pub endpoint_url: Option<String>,
    pub server_endpoint: Option<String>,
    pub status: Option<String>,
    pub cached_data: Option<Value>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Which response nesting an adapter handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Nested,
    Flat,
    Bare,
}

type Adapter = fn(&Value) -> Option<StatusReport>;

/// Known shapes, most specific first.
const ADAPTERS: &[(ResponseShape, Adapter)] = &[
    (ResponseShape::Nested, adapt_nested),
    (ResponseShape::Flat, adapt_flat),
    (ResponseShape::Bare, adapt_bare),
];

// ═══════════════════════════════════════════════════════════
// Adapters
// ═══════════════════════════════════════════════════════════

/// `{ data: { opcStatus: { client, server } }, timestamp }`
pub fn adapt_nested(body: &Value) -> Option<StatusReport> {
    let sections = body
        .get("data")?
        .get("opcStatus")
        .filter(|v| v.is_object())?;
    Some(report_from_sections(sections, body))
}

/// `{ data: { client, server }, timestamp }`
pub fn adapt_flat(body: &Value) -> Option<StatusReport> {
    let sections = body.get("data")?;
    has_sections(sections).then(|| report_from_sections(sections, body))
}

/// `{ client, server, timestamp }`
pub fn adapt_bare(body: &Value) -> Option<StatusReport> {
    has_sections(body).then(|| report_from_sections(body, body))
}

/// Run the adapters in order and return the first match.
///
/// Returns `None` when the body matches no known shape.
pub fn adapt(body: &Value) -> Option<(ResponseShape, StatusReport)> {
    ADAPTERS
        .iter()
        .find_map(|(shape, adapter)| adapter(body).map(|report| (*shape, report)))
}

fn has_sections(value: &Value) -> bool {
    value.get("client").is_some_and(Value::is_object)
        || value.get("server").is_some_and(Value::is_object)
}

fn report_from_sections(sections: &Value, envelope: &Value) -> StatusReport {
    let client = sections.get("client");
    let server = sections.get("server");

    StatusReport {
        is_connected: client.and_then(|c| c.get("isConnected")).and_then(Value::as_bool),
        endpoint_url: string_field(client, "endpointUrl"),
        server_endpoint: string_field(server, "endpoint"),
        status: string_field(client, "status"),
        cached_data: client
            .and_then(|c| c.get("cachedData"))
            .filter(|v| !v.is_null())
            .cloned(),
        timestamp: envelope
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc)),
    }
}

fn string_field(section: Option<&Value>, key: &str) -> Option<String> {
    section
        .and_then(|s| s.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// ═══════════════════════════════════════════════════════════
// Normalization
// ═══════════════════════════════════════════════════════════

/// Turn a report into the canonical record.
///
/// `connected_default` applies when the gateway omits `isConnected`:
/// `false` for status queries, `true` after a successful connect command.
/// The client endpoint wins over the server endpoint. `now` is used when
/// the response carries no parseable timestamp.
pub fn normalize(report: StatusReport, connected_default: bool, now: DateTime<Utc>) -> GatewayStatus {
    let connected = report.is_connected.unwrap_or(connected_default);
    GatewayStatus::observed(
        connected,
        report.endpoint_url.or(report.server_endpoint),
        report.status,
        report.cached_data,
        report.timestamp.unwrap_or(now),
    )
}

/// Adapt and normalize a raw body in one step.
///
/// Unrecognised bodies normalize as an empty report.
pub fn normalize_body(body: &Value, connected_default: bool, now: DateTime<Utc>) -> GatewayStatus {
    let report = match adapt(body) {
        Some((shape, report)) => {
            tracing::trace!(?shape, "Adapted gateway response");
            report
        }
        None => {
            tracing::debug!("Gateway response matched no known shape");
            StatusReport::default()
        }
    };
    normalize(report, connected_default, now)
}
