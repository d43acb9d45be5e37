use super::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json},
};
use futures::stream::Stream;
use serde::Serialize;
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    /// Final fragments accumulated so far, joined by spaces
    pub transcription: String,
    /// Pending interim result, if recognition is mid-phrase
    pub interim: Option<String>,
    /// Transcription with the pending interim appended, ready for display
    pub preview: String,
    /// Number of final fragments persisted
    pub fragment_count: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /dictation/toggle
/// Start dictation when idle, stop it when live
pub async fn toggle_dictation(State(state): State<AppState>) -> impl IntoResponse {
    let new_state = state.controller.toggle().await;
    info!("Toggle handled, controller now {}", new_state);

    let status = state.controller.status().await;
    (StatusCode::OK, Json(status))
}

/// GET /dictation/status
/// Snapshot of the controller state and transcript
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.controller.status().await;
    (StatusCode::OK, Json(status))
}

/// GET /dictation/transcript
/// The transcription accumulated so far
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    let preview = state.controller.live_preview();
    let status = state.controller.status().await;

    (
        StatusCode::OK,
        Json(TranscriptResponse {
            transcription: status.transcription,
            interim: status.interim,
            preview,
            fragment_count: status.fragment_count,
        }),
    )
}

/// GET /dictation/notifications
/// User-facing notifications as server-sent events
pub async fn notification_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.controller.subscribe();

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => {
                    let event = match Event::default().json_data(&notification) {
                        Ok(event) => event,
                        Err(e) => {
                            warn!("Failed to serialize notification: {}", e);
                            continue;
                        }
                    };
                    return Some((Ok(event), receiver));
                }
                // A lagged subscriber skips what it missed and catches up
                Err(RecvError::Lagged(missed)) => {
                    warn!("Notification subscriber lagged by {} events", missed);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
