//! OPC gateway endpoints.
//!
//! Intent failures are `200` with `{ success: false, error }`; only a
//! missing session is an HTTP error.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::BridgeContext;
use crate::commands::opc::{self, OpcStatusView};
use crate::gateway::{CommandOutcome, GatewayApi};

/// `GET /api/opc/status`
pub async fn status<A: GatewayApi>(
    State(ctx): State<BridgeContext<A>>,
) -> Result<Json<OpcStatusView>, ApiError> {
    let view = opc::get_opc_status(&ctx.core).await;
    if !view.session_active {
        return Err(ApiError::NoActiveSession);
    }
    Ok(Json(view))
}

/// `POST /api/opc/connect`
pub async fn connect<A: GatewayApi>(
    State(ctx): State<BridgeContext<A>>,
) -> Result<Json<CommandOutcome>, ApiError> {
    let gateway = ctx.core.gateway().await?;
    Ok(Json(gateway.coordinator.connect().await))
}

/// `POST /api/opc/disconnect`
pub async fn disconnect<A: GatewayApi>(
    State(ctx): State<BridgeContext<A>>,
) -> Result<Json<CommandOutcome>, ApiError> {
    let gateway = ctx.core.gateway().await?;
    Ok(Json(gateway.coordinator.disconnect().await))
}
