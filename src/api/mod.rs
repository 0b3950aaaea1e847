//! HTTP surface for the lifecycle coordinator.
//!
//! Exposes the coordinator, billing cascade and read views as axum
//! endpoints nested under `/api/`. The router is composable —
//! `api_router()` returns a `Router` that can be mounted on any axum
//! server instance. Authentication and session issuance live outside
//! this service and in front of it.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::ApiServer;
pub use types::ApiContext;
