use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::RecordingState;

/// Snapshot of the dictation controller for status queries and the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictationStatus {
    /// Current lifecycle state
    pub state: RecordingState,
    /// True while a session is live, including the stop window before the
    /// engine acknowledges the end
    pub is_recording: bool,
    /// Whether the host supports speech recognition at all
    pub is_browser_supported: bool,
    /// Final fragments accumulated so far, joined by spaces
    pub transcription: String,
    /// Pending interim result, if recognition is mid-phrase
    pub interim: Option<String>,
    /// Identifier of the live session, if any
    pub session_id: Option<Uuid>,
    /// When the live session started, if any
    pub started_at: Option<DateTime<Utc>>,
    /// Number of final fragments persisted
    pub fragment_count: usize,
}
