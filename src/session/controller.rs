use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capture::{CaptureConfig, CaptureMetadata, WavCapture};
use crate::config::{CaptureSettings, SpeechSettings};
use crate::mic::{MicStream, MicrophoneGate, PermissionDecision};
use crate::notify::{Notification, NotificationHub, NotificationKind};
use crate::speech::{EngineEvent, EngineFactory, SpeechEngine};

use super::state::{RecordingState, StateCell};
use super::status::DictationStatus;
use super::transcript::TranscriptAccumulator;

/// Everything owned by one live dictation session
struct ActiveSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    engine: Box<dyn SpeechEngine>,
    mic: Option<Box<dyn MicStream>>,
    pump: Option<JoinHandle<()>>,
    capture: Option<JoinHandle<Result<Option<CaptureMetadata>>>>,
}

/// Drives the dictation lifecycle: permission, engine start, event
/// consumption and teardown. A single `toggle` entry point flips between
/// starting and stopping, mirroring a push-to-talk button.
pub struct RecordingController {
    speech: SpeechSettings,
    capture: Option<CaptureSettings>,
    factory: Arc<dyn EngineFactory>,
    gate: Arc<dyn MicrophoneGate>,
    supported: bool,
    state: StateCell,
    transcript: Arc<StdMutex<TranscriptAccumulator>>,
    session: Arc<Mutex<Option<ActiveSession>>>,
    notifications: NotificationHub,
}

fn lock_transcript(
    transcript: &StdMutex<TranscriptAccumulator>,
) -> MutexGuard<'_, TranscriptAccumulator> {
    transcript
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RecordingController {
    /// Create a controller. Host support is probed once up front.
    pub fn new(
        speech: SpeechSettings,
        capture: Option<CaptureSettings>,
        factory: Arc<dyn EngineFactory>,
        gate: Arc<dyn MicrophoneGate>,
    ) -> Self {
        let supported = factory.is_supported();
        if !supported {
            warn!("Speech recognition is not supported on this host");
        }

        Self {
            speech,
            capture,
            factory,
            gate,
            supported,
            state: StateCell::new(),
            transcript: Arc::new(StdMutex::new(TranscriptAccumulator::new())),
            session: Arc::new(Mutex::new(None)),
            notifications: NotificationHub::default(),
        }
    }

    /// Start dictation when idle, stop it when live. Returns the state
    /// reached by this call.
    pub async fn toggle(&self) -> RecordingState {
        match self.state.current() {
            RecordingState::Idle => self.start_session().await,
            RecordingState::Recording | RecordingState::Stopping => self.request_stop().await,
            RecordingState::RequestingPermission => {
                debug!("Toggle ignored: a start is already in flight");
                self.state.current()
            }
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state.current()
    }

    /// True until the engine acknowledges the end of the session; a stop
    /// request alone does not clear it
    pub fn is_recording(&self) -> bool {
        self.state.current().is_recording()
    }

    pub fn is_browser_supported(&self) -> bool {
        self.supported
    }

    /// Final fragments accumulated so far, joined by spaces
    pub fn transcription(&self) -> String {
        lock_transcript(&self.transcript).transcription()
    }

    /// Transcription with the pending interim appended, for live display
    pub fn live_preview(&self) -> String {
        lock_transcript(&self.transcript).live_preview()
    }

    /// Subscribe to user-facing notifications (unsupported host, denied
    /// permission, recognition errors)
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Snapshot the controller for status queries
    pub async fn status(&self) -> DictationStatus {
        let (session_id, started_at) = {
            let slot = self.session.lock().await;
            match slot.as_ref() {
                Some(session) => (Some(session.id), Some(session.started_at)),
                None => (None, None),
            }
        };

        let (transcription, interim, fragment_count) = {
            let transcript = lock_transcript(&self.transcript);
            (
                transcript.transcription(),
                transcript.interim().map(str::to_string),
                transcript.fragment_count(),
            )
        };

        let state = self.state.current();
        DictationStatus {
            state,
            is_recording: state.is_recording(),
            is_browser_supported: self.supported,
            transcription,
            interim,
            session_id,
            started_at,
            fragment_count,
        }
    }

    async fn start_session(&self) -> RecordingState {
        if !self.supported {
            info!("Dictation requested but speech recognition is unavailable");
            self.notifications.publish(
                NotificationKind::BrowserUnsupported,
                "Speech recognition is not supported in this browser",
            );
            return self.state.current();
        }

        // Claim the start; losing this race means another toggle is already mid-start.
        if !self.state.transition(RecordingState::RequestingPermission) {
            return self.state.current();
        }

        let mut mic = match self.gate.request().await {
            PermissionDecision::Granted(stream) => stream,
            PermissionDecision::Denied { reason } => {
                info!("Microphone permission denied: {}", reason);
                self.notifications.publish(
                    NotificationKind::PermissionDenied,
                    format!("Microphone access needed: {}", reason),
                );
                self.state.transition(RecordingState::Idle);
                return self.state.current();
            }
        };

        let mut engine = match self.factory.create(self.speech.engine_config()) {
            Ok(engine) => engine,
            Err(e) => {
                error!("Failed to create speech engine: {}", e);
                self.notifications.publish(
                    NotificationKind::RecognitionError,
                    format!("Could not start speech recognition: {}", e),
                );
                mic.stop();
                self.state.transition(RecordingState::Idle);
                return self.state.current();
            }
        };

        let mut events = match engine.start().await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to start speech engine: {}", e);
                self.notifications.publish(
                    NotificationKind::RecognitionError,
                    format!("Could not start speech recognition: {}", e),
                );
                mic.stop();
                self.state.transition(RecordingState::Idle);
                return self.state.current();
            }
        };

        let session_id = Uuid::new_v4();
        let capture = self.spawn_capture(&session_id, mic.as_mut());

        // The session must be in the slot before the pump runs, so that
        // teardown always finds what it has to release.
        {
            let mut slot = self.session.lock().await;
            *slot = Some(ActiveSession {
                id: session_id,
                started_at: Utc::now(),
                engine,
                mic: Some(mic),
                pump: None,
                capture,
            });
        }

        let state = self.state.clone();
        let transcript = Arc::clone(&self.transcript);
        let session_slot = Arc::clone(&self.session);
        let notifications = self.notifications.clone();
        let append_across_sessions = self.speech.append_across_sessions;

        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    EngineEvent::Started => {
                        if !append_across_sessions {
                            lock_transcript(&transcript).reset();
                        }
                        if state.transition(RecordingState::Recording) {
                            info!("Recognition started for session {}", session_id);
                        }
                    }
                    EngineEvent::Result { text, is_final } => {
                        let mut acc = lock_transcript(&transcript);
                        if is_final {
                            acc.append_final(&text);
                        } else {
                            acc.set_interim(&text);
                        }
                    }
                    EngineEvent::Error(error) => {
                        warn!("Speech recognition error: {}", error);
                        notifications.publish(
                            NotificationKind::RecognitionError,
                            format!("Speech recognition error: {}", error),
                        );
                    }
                    EngineEvent::Ended => break,
                }
            }

            // A closed channel without `Ended` tears down the same way.
            let finished = {
                let mut slot = session_slot.lock().await;
                if slot.as_ref().map(|s| s.id) == Some(session_id) {
                    slot.take()
                } else {
                    None
                }
            };

            // Only the pump that still owned the slot publishes Idle; a
            // session taken elsewhere is torn down by whoever took it.
            match finished {
                Some(mut session) => {
                    // Stopping the microphone closes the frame channel, which
                    // lets the capture task finish its file.
                    if let Some(mut mic) = session.mic.take() {
                        mic.stop();
                    }
                    if let Some(capture) = session.capture.take() {
                        match capture.await {
                            Ok(Ok(Some(metadata))) => {
                                info!(
                                    "Saved session audio to {} ({} ms)",
                                    metadata.file_path.display(),
                                    metadata.duration_ms
                                );
                            }
                            Ok(Ok(None)) => {}
                            Ok(Err(e)) => warn!("Audio capture failed: {}", e),
                            Err(e) => warn!("Audio capture task panicked: {}", e),
                        }
                    }

                    lock_transcript(&transcript).clear_interim();
                    if state.transition(RecordingState::Idle) {
                        info!("Dictation session {} ended", session_id);
                    } else {
                        debug!("Session {} ended while already idle", session_id);
                    }
                }
                None => debug!("Session {} was already released", session_id),
            }
        });

        {
            let mut slot = self.session.lock().await;
            if let Some(session) = slot.as_mut() {
                if session.id == session_id {
                    session.pump = Some(pump);
                }
            }
        }

        info!("Dictation session {} created", session_id);
        self.state.current()
    }

    fn spawn_capture(
        &self,
        session_id: &Uuid,
        mic: &mut dyn MicStream,
    ) -> Option<JoinHandle<Result<Option<CaptureMetadata>>>> {
        let settings = self.capture.as_ref()?;
        let frames = mic.take_frames()?;

        let config = CaptureConfig {
            output_dir: PathBuf::from(&settings.output_dir),
            session_id: session_id.to_string(),
        };

        Some(tokio::spawn(async move {
            let mut capture = WavCapture::new(config)?;
            capture.record(frames).await
        }))
    }

    async fn request_stop(&self) -> RecordingState {
        if !self.state.transition(RecordingState::Stopping) {
            debug!("No live recording to stop");
            return self.state.current();
        }

        // Read the resulting state while still holding the session slot, so
        // the pump cannot finish the teardown before this call reports.
        let mut slot = self.session.lock().await;
        match slot.as_mut() {
            Some(session) => {
                info!("Stop requested for session {}", session.id);
                if let Err(e) = session.engine.stop().await {
                    warn!("Failed to stop speech engine: {}", e);
                }
                self.state.current()
            }
            None => {
                // The pump already took the session out; it publishes Idle
                // once its teardown finishes.
                debug!("Stop raced with the session teardown");
                self.state.current()
            }
        }
    }

    /// Stop any live session and release its resources
    pub async fn shutdown(&self) {
        let session = {
            let mut slot = self.session.lock().await;
            slot.take()
        };

        if let Some(mut session) = session {
            info!("Shutting down live dictation session {}", session.id);
            if let Err(e) = session.engine.stop().await {
                warn!("Failed to stop speech engine: {}", e);
            }
            if let Some(mut mic) = session.mic.take() {
                mic.stop();
            }
            if let Some(capture) = session.capture.take() {
                match capture.await {
                    Ok(Ok(Some(metadata))) => {
                        info!("Saved session audio to {}", metadata.file_path.display());
                    }
                    Ok(Ok(None)) => {}
                    Ok(Err(e)) => warn!("Audio capture failed: {}", e),
                    Err(e) => warn!("Audio capture task panicked: {}", e),
                }
            }
            if let Some(pump) = session.pump.take() {
                pump.abort();
            }
        }

        lock_transcript(&self.transcript).clear_interim();
        self.state.reset();
    }
}
