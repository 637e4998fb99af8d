//! HTTP surface for the LMS automation job runner
//!
//! One `POST /api/automation/run-<job>` route per registered suite, plus a
//! `GET /health` probe for the frontend. Overlapping runs get `409`; failed
//! and timed-out runs get `500` with the full [`automation_runner::JobResult`]
//! in the body.

pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::{router, serve, AppState, SharedState};
