//! Cropline HTTP boundary
//!
//! Serves encoded crop paths over axum. Everything past path and query
//! extraction is delegated to `cropline_services::Materializer`.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
