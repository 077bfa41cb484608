//! Budget automation server
//!
//! Wires the configured stores, providers and automation engine together and
//! exposes them over HTTP:
//!
//! - `GET /api/health`
//! - `POST /api/automation/run` with an optional `{owner_id, source}` body

pub mod api;
pub mod app;

pub use api::{create_router, start_server, AppState};
pub use app::{bootstrap, App};
