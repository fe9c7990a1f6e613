//! HTTP API server for external control (the dashboard shell)
//!
//! This module provides a REST API for driving the live session:
//! - POST /voice/session/start - Start a live session
//! - POST /voice/session/stop - Stop the active session
//! - GET /voice/session/status - Query session state and stats
//! - GET /voice/session/transcript - Get the accumulated transcript
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
