//! Dashboard bridge router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`. Every response carries
//! `Cache-Control: no-store`: status is live state and a browser-cached
//! copy would show a stale indicator.

use std::sync::Arc;

use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::BridgeContext;
use crate::core_state::CoreState;
use crate::gateway::GatewayApi;

/// Build the dashboard bridge router.
pub fn bridge_router<A: GatewayApi>(core: Arc<CoreState<A>>) -> Router {
    build_router(BridgeContext::new(core))
}

fn build_router<A: GatewayApi>(ctx: BridgeContext<A>) -> Router {
    let routes = Router::new()
        .route("/health", get(endpoints::health::check::<A>))
        .route("/opc/status", get(endpoints::opc::status::<A>))
        .route("/opc/connect", post(endpoints::opc::connect::<A>))
        .route("/opc/disconnect", post(endpoints::opc::disconnect::<A>))
        .with_state(ctx)
        // Innermost first: access log, then cache suppression
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new().nest("/api", routes)
}
