//! Dictation session management
//!
//! This module provides the `RecordingController` abstraction that manages:
//! - The recording state machine (idle, permission, recording, stopping)
//! - Microphone permission requests
//! - Speech engine lifecycle and event consumption
//! - Transcript accumulation (final fragments plus one interim)
//! - Status snapshots for the HTTP API

mod controller;
mod state;
mod status;
mod transcript;

pub use controller::RecordingController;
pub use state::{RecordingState, StateCell};
pub use status::DictationStatus;
pub use transcript::TranscriptAccumulator;
