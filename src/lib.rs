pub mod api; // Dashboard bridge (loopback HTTP)
pub mod commands;
pub mod config;
pub mod core_state;
pub mod gateway; // Device connectivity state synchronizer

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::GatewayConfig;
use crate::core_state::CoreState;

pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(host(GatewayConfig::from_env())) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

/// Run one gateway session plus the bridge until Ctrl-C.
async fn host(config: GatewayConfig) -> Result<(), String> {
    tracing::info!(
        api_url = %config.api_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Gateway configuration loaded"
    );
    let core: Arc<CoreState> = Arc::new(CoreState::new(config));

    let info = core
        .start_session()
        .await
        .map_err(|e| format!("Failed to start gateway session: {e}"))?;
    tracing::info!(session_id = %info.session_id, "Gateway session ready");

    let server = match api::server::start_bridge_server(core.clone(), core.config().bridge_port).await {
        Ok(server) => server,
        Err(e) => {
            core.end_session().await;
            return Err(e);
        }
    };
    tracing::info!(addr = %server.session.server_addr, "Dashboard bridge listening");

    let watcher = match core.gateway().await {
        Ok(gateway) => Some(gateway.store.on_change(|status| {
            tracing::info!(
                connected = status.connected(),
                endpoint = status.endpoint_address().unwrap_or("-"),
                "{}",
                status.summary()
            );
        })),
        Err(e) => {
            tracing::warn!("Status watcher unavailable: {e}");
            None
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");

    drop(watcher);
    server.stop().await;
    core.end_session().await;
    Ok(())
}
