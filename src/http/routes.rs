use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Dictation control
        .route("/dictation/toggle", post(handlers::toggle_dictation))
        // Dictation queries
        .route("/dictation/status", get(handlers::get_status))
        .route("/dictation/transcript", get(handlers::get_transcript))
        .route(
            "/dictation/notifications",
            get(handlers::notification_stream),
        )
        // Tracing middleware for request logging, CORS for the dashboard
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
