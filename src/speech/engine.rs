use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Recognition engine configuration, applied per session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// BCP-47 language tag for recognition (e.g. "es-ES")
    pub language: String,
    /// Keep recognizing after each finalized fragment
    pub continuous: bool,
    /// Deliver revisable interim fragments between finals
    pub interim_results: bool,
    /// Maximum candidate transcriptions per result
    pub max_alternatives: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: "es-ES".to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 1,
        }
    }
}

/// Mid-session recognition failure reasons
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("network failure during recognition")]
    Network,
    #[error("no speech detected")]
    NoSpeech,
    #[error("audio capture failed")]
    AudioCapture,
    #[error("recognition not allowed by the host")]
    NotAllowed,
    #[error("recognition aborted")]
    Aborted,
    #[error("{0}")]
    Other(String),
}

/// Events a recognition engine delivers over its session channel.
///
/// Ordering contract: `Started` arrives first, then zero or more `Result`s
/// in recognition order, at most one terminal `Error`, and `Ended` exactly
/// once as the last event.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine is live and consuming audio
    Started,
    /// A recognized fragment; interim fragments may be revised, finals not
    Result { text: String, is_final: bool },
    /// Terminal mid-session failure (an `Ended` still follows)
    Error(EngineError),
    /// The session is over; no further events will arrive
    Ended,
}

/// Speech recognition engine handle
///
/// One engine instance serves one recognition session. Host integrations
/// wrap whatever recognizer the platform provides; `ScriptedEngine` plays
/// a fixed script for tests and the demo binary.
#[async_trait::async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Start recognizing
    ///
    /// Returns a channel receiver that will receive engine events
    async fn start(&mut self) -> Result<mpsc::Receiver<EngineEvent>>;

    /// Request termination; the session is over only when `Ended` arrives
    async fn stop(&mut self) -> Result<()>;

    /// Check if the engine is currently recognizing
    fn is_active(&self) -> bool;

    /// Get engine name for logging
    fn name(&self) -> &str;
}

/// Probe for host recognition support and construct per-session engines
pub trait EngineFactory: Send + Sync {
    /// Whether this host can provide a recognition engine at all
    fn is_supported(&self) -> bool;

    /// Construct an engine for a single session
    fn create(&self, config: EngineConfig) -> Result<Box<dyn SpeechEngine>>;
}
