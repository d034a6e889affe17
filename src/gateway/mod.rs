//! Device Connectivity State Synchronizer.
//!
//! Tracks whether the remote OPC UA gateway is connected and mediates
//! connect/disconnect intents against it. Leaves first:
//!
//! - `transport` / `wire` / `client`: remote calls normalized into one
//!   canonical [`GatewayStatus`]
//! - `store`: the session's single current record, broadcast to watchers
//! - `scheduler` / `reconcile`: periodic re-query into the store
//! - `coordinator`: optimistic connect/disconnect with `{success, error}`
//! - `session`: composition root with an explicit lifecycle

pub mod client;
pub mod coordinator;
pub mod error;
pub mod reconcile;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;
pub mod wire;

pub use client::{GatewayStatusClient, StatusQuery};
pub use coordinator::ConnectionCoordinator;
pub use error::GatewayError;
pub use reconcile::ReconciliationLoop;
pub use scheduler::PeriodicTask;
pub use session::{GatewaySession, SessionInfo};
pub use store::{StatusStore, Subscription, WritePolicy};
pub use transport::{GatewayApi, HttpGatewayApi, MockGatewayApi};
pub use types::{CommandOutcome, ConnectionState, GatewayStatus};
