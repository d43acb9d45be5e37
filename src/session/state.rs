use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Lifecycle state of the dictation controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    /// No session in progress. Ready to start.
    Idle,
    /// Waiting for the host to answer the microphone permission request
    RequestingPermission,
    /// A recognition session is live and consuming audio
    Recording,
    /// Stop requested; waiting for the engine to acknowledge the end
    Stopping,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "idle"),
            RecordingState::RequestingPermission => write!(f, "requesting_permission"),
            RecordingState::Recording => write!(f, "recording"),
            RecordingState::Stopping => write!(f, "stopping"),
        }
    }
}

impl RecordingState {
    /// True while a session handle is live: from the engine's start
    /// acknowledgment until its end event. A stop request alone does not
    /// clear this.
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording | RecordingState::Stopping)
    }

    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &RecordingState) -> bool {
        matches!(
            (self, target),
            (RecordingState::Idle, RecordingState::RequestingPermission)
                | (RecordingState::RequestingPermission, RecordingState::Recording)
                | (RecordingState::Recording, RecordingState::Stopping)
                | (RecordingState::Stopping, RecordingState::Idle)
                // Abort paths: denied permission, engine error, natural end
                | (RecordingState::RequestingPermission, RecordingState::Idle)
                | (RecordingState::Recording, RecordingState::Idle)
        )
    }
}

/// Shared, validated state cell for the controller lifecycle.
///
/// Clones share the same underlying state. Invalid transitions leave the
/// state untouched; rejection doubles as the idempotency guard for racing
/// toggles.
#[derive(Debug, Clone)]
pub struct StateCell {
    state: Arc<Mutex<RecordingState>>,
}

impl StateCell {
    /// Create a cell initialized to `Idle`
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RecordingState::Idle)),
        }
    }

    /// Returns the current state
    pub fn current(&self) -> RecordingState {
        *self.lock()
    }

    /// Attempt a validated transition. Returns false when the transition
    /// is not allowed from the current state.
    pub fn transition(&self, target: RecordingState) -> bool {
        let mut state = self.lock();
        if state.can_transition_to(&target) {
            debug!("Recording state: {} -> {}", *state, target);
            *state = target;
            true
        } else {
            debug!("Rejected state transition: {} -> {}", *state, target);
            false
        }
    }

    /// Force the cell back to `Idle` (teardown only)
    pub fn reset(&self) {
        let mut state = self.lock();
        if *state != RecordingState::Idle {
            warn!("Recording state reset to idle from {}", *state);
            *state = RecordingState::Idle;
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serialized_form() {
        assert_eq!(RecordingState::Idle.to_string(), "idle");
        assert_eq!(
            RecordingState::RequestingPermission.to_string(),
            "requesting_permission"
        );
        assert_eq!(RecordingState::Recording.to_string(), "recording");
        assert_eq!(RecordingState::Stopping.to_string(), "stopping");
    }

    #[test]
    fn test_valid_transitions() {
        use RecordingState::*;

        // Forward path
        assert!(Idle.can_transition_to(&RequestingPermission));
        assert!(RequestingPermission.can_transition_to(&Recording));
        assert!(Recording.can_transition_to(&Stopping));
        assert!(Stopping.can_transition_to(&Idle));

        // Abort paths
        assert!(RequestingPermission.can_transition_to(&Idle));
        assert!(Recording.can_transition_to(&Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        use RecordingState::*;

        // Cannot skip states
        assert!(!Idle.can_transition_to(&Recording));
        assert!(!Idle.can_transition_to(&Stopping));
        assert!(!RequestingPermission.can_transition_to(&Stopping));

        // Cannot go backwards
        assert!(!Recording.can_transition_to(&RequestingPermission));
        assert!(!Stopping.can_transition_to(&Recording));
        assert!(!Stopping.can_transition_to(&RequestingPermission));

        // Cannot transition to self
        assert!(!Idle.can_transition_to(&Idle));
        assert!(!RequestingPermission.can_transition_to(&RequestingPermission));
        assert!(!Recording.can_transition_to(&Recording));
        assert!(!Stopping.can_transition_to(&Stopping));
    }

    #[test]
    fn test_is_recording_covers_the_stop_window() {
        assert!(!RecordingState::Idle.is_recording());
        assert!(!RecordingState::RequestingPermission.is_recording());
        assert!(RecordingState::Recording.is_recording());
        assert!(RecordingState::Stopping.is_recording());
    }

    #[test]
    fn test_cell_rejects_invalid_transition() {
        let cell = StateCell::new();
        assert!(!cell.transition(RecordingState::Recording));
        assert_eq!(cell.current(), RecordingState::Idle);

        assert!(cell.transition(RecordingState::RequestingPermission));
        assert_eq!(cell.current(), RecordingState::RequestingPermission);
    }

    #[test]
    fn test_cell_full_lifecycle() {
        let cell = StateCell::new();
        assert!(cell.transition(RecordingState::RequestingPermission));
        assert!(cell.transition(RecordingState::Recording));
        assert!(cell.transition(RecordingState::Stopping));
        assert!(cell.transition(RecordingState::Idle));
        assert_eq!(cell.current(), RecordingState::Idle);
    }

    #[test]
    fn test_cell_reset() {
        let cell = StateCell::new();
        cell.transition(RecordingState::RequestingPermission);
        cell.transition(RecordingState::Recording);
        cell.reset();
        assert_eq!(cell.current(), RecordingState::Idle);
    }

    #[test]
    fn test_cell_clone_shares_state() {
        let cell = StateCell::new();
        let clone = cell.clone();
        cell.transition(RecordingState::RequestingPermission);
        assert_eq!(clone.current(), RecordingState::RequestingPermission);
    }
}
