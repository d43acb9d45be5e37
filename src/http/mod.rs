//! HTTP API server for external control (browser dashboard)
//!
//! This module provides a REST API for driving dictation:
//! - POST /dictation/toggle - Flip between starting and stopping dictation
//! - GET /dictation/status - Query the controller state and transcript
//! - GET /dictation/transcript - Get the accumulated transcription
//! - GET /dictation/notifications - User-facing notifications as SSE
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
