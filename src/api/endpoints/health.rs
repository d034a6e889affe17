//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::BridgeContext;
use crate::gateway::{GatewayApi, SessionInfo};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub session_active: bool,
    /// Active gateway session, `null` before start or after logout.
    pub session: Option<SessionInfo>,
    pub version: &'static str,
}

/// `GET /api/health`: the bridge is serving, plus which gateway session
/// (if any) it fronts.
pub async fn check<A: GatewayApi>(State(ctx): State<BridgeContext<A>>) -> Json<HealthResponse> {
    let session = ctx.core.session_info().await;
    Json(HealthResponse {
        status: "ok",
        session_active: session.is_some(),
        session,
        version: crate::config::APP_VERSION,
    })
}
