// Microphone access and capture stream.
//
// Permission is a consumed capability: the host decides whether the
// microphone may be used, and a granted request hands back a live stream
// whose frames can be drained for raw capture. `StaticGate` and
// `SyntheticStream` stand in for a host microphone in tests and the demo
// binary.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Sample rate of the synthetic stream (mono)
const SYNTH_SAMPLE_RATE: u32 = 16000;
/// Frame cadence of the synthetic stream
const SYNTH_FRAME_MS: u64 = 100;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the stream opened
    pub timestamp_ms: u64,
}

/// Live microphone stream handed out by a granted permission request
pub trait MicStream: Send {
    /// Take the frame receiver. The first caller gets it; later calls
    /// return `None`.
    fn take_frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>>;

    /// Release the device. Idempotent; closes the frame channel.
    /// Implementations also release on drop.
    fn stop(&mut self);

    /// Whether the device is still held
    fn is_live(&self) -> bool;
}

/// Outcome of a microphone permission request
pub enum PermissionDecision {
    /// Access granted; the stream holds the device until stopped
    Granted(Box<dyn MicStream>),
    /// Access refused by the host or the user
    Denied { reason: String },
}

/// Host microphone permission prompt.
///
/// `request` suspends until the host resolves the prompt. Refusal is a
/// decision, not an error: implementations report it as `Denied`.
#[async_trait::async_trait]
pub trait MicrophoneGate: Send + Sync {
    async fn request(&self) -> PermissionDecision;
}

/// Fixed-outcome permission gate for tests and the demo binary
pub struct StaticGate {
    grant: bool,
    denial_reason: String,
    response_delay: Duration,
    requests: Arc<AtomicUsize>,
    open_streams: Arc<AtomicUsize>,
}

impl StaticGate {
    /// Gate that always grants access with a synthetic stream
    pub fn granted() -> Self {
        Self {
            grant: true,
            denial_reason: String::new(),
            response_delay: Duration::ZERO,
            requests: Arc::new(AtomicUsize::new(0)),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Gate that always refuses access with the given reason
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            grant: false,
            denial_reason: reason.into(),
            response_delay: Duration::ZERO,
            requests: Arc::new(AtomicUsize::new(0)),
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Delay before the gate answers, modeling the host prompt
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    /// Number of permission requests seen
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of granted streams not yet released
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MicrophoneGate for StaticGate {
    async fn request(&self) -> PermissionDecision {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if !self.response_delay.is_zero() {
            tokio::time::sleep(self.response_delay).await;
        }

        if self.grant {
            PermissionDecision::Granted(Box::new(SyntheticStream::open(Arc::clone(
                &self.open_streams,
            ))))
        } else {
            PermissionDecision::Denied {
                reason: self.denial_reason.clone(),
            }
        }
    }
}

/// Synthesized microphone stream: a quiet 440 Hz tone at 16 kHz mono,
/// produced in 100 ms frames until stopped.
pub struct SyntheticStream {
    frames: Option<mpsc::Receiver<AudioFrame>>,
    stop_tx: Option<watch::Sender<bool>>,
    live: Arc<AtomicBool>,
    open_streams: Arc<AtomicUsize>,
}

impl SyntheticStream {
    fn open(open_streams: Arc<AtomicUsize>) -> Self {
        let (tx, rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let live = Arc::new(AtomicBool::new(true));
        open_streams.fetch_add(1, Ordering::SeqCst);

        let live_flag = Arc::clone(&live);
        tokio::spawn(async move {
            let samples_per_frame = (SYNTH_SAMPLE_RATE as u64 * SYNTH_FRAME_MS / 1000) as usize;
            let mut sample_clock: u64 = 0;
            let mut timestamp_ms: u64 = 0;
            let mut ticker = tokio::time::interval(Duration::from_millis(SYNTH_FRAME_MS));

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    // Stop requested, or the stream handle was dropped
                    _ = stop_rx.changed() => break,
                }

                let frame = AudioFrame {
                    samples: Self::tone(samples_per_frame, sample_clock),
                    sample_rate: SYNTH_SAMPLE_RATE,
                    channels: 1,
                    timestamp_ms,
                };
                sample_clock += samples_per_frame as u64;
                timestamp_ms += SYNTH_FRAME_MS;

                // A live capture must never block on a slow reader; frames
                // are dropped when the channel is full.
                match tx.try_send(frame) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }

            live_flag.store(false, Ordering::SeqCst);
            debug!("Synthetic microphone stream closed");
        });

        Self {
            frames: Some(rx),
            stop_tx: Some(stop_tx),
            live,
            open_streams,
        }
    }

    fn tone(len: usize, sample_clock: u64) -> Vec<i16> {
        (0..len)
            .map(|i| {
                let t = (sample_clock + i as u64) as f32 / SYNTH_SAMPLE_RATE as f32;
                let v = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
                (v * 3000.0) as i16
            })
            .collect()
    }
}

impl MicStream for SyntheticStream {
    fn take_frames(&mut self) -> Option<mpsc::Receiver<AudioFrame>> {
        self.frames.take()
    }

    fn stop(&mut self) {
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(true);
            self.live.store(false, Ordering::SeqCst);
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop();
    }
}
