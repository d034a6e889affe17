//! Dashboard bridge API.
//!
//! Exposes the gateway session to the dashboard's browser pages as JSON
//! over loopback HTTP. Routes are nested under `/api/`.
//!
//! The router is composable: `bridge_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::bridge_router;
pub use server::{BridgeServer, BridgeSession};
pub use types::BridgeContext;
