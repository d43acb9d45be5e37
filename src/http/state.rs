use crate::session::RecordingController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one dictation controller behind every route
    pub controller: Arc<RecordingController>,
}

impl AppState {
    pub fn new(controller: Arc<RecordingController>) -> Self {
        Self { controller }
    }
}
