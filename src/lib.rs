pub mod capture;
pub mod config;
pub mod http;
pub mod mic;
pub mod notify;
pub mod session;
pub mod speech;

pub use capture::{CaptureConfig, CaptureMetadata, WavCapture};
pub use config::{CaptureSettings, Config, SpeechSettings};
pub use http::{create_router, AppState};
pub use mic::{AudioFrame, MicStream, MicrophoneGate, PermissionDecision, StaticGate};
pub use notify::{Notification, NotificationHub, NotificationKind};
pub use session::{DictationStatus, RecordingController, RecordingState, TranscriptAccumulator};
pub use speech::{
    EngineConfig, EngineError, EngineEvent, EngineFactory, ScriptStep, ScriptedEngine,
    ScriptedEngineFactory, SpeechEngine,
};
