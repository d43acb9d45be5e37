// Raw audio capture to disk.
//
// When enabled, the controller tees the granted microphone stream into a
// single WAV file per session, alongside recognition rather than instead
// of it.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::mic::AudioFrame;

/// Capture configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Output directory for capture files
    pub output_dir: PathBuf,
    /// Session ID (used for the capture filename)
    pub session_id: String,
}

/// Metadata for a finished capture
#[derive(Debug, Clone)]
pub struct CaptureMetadata {
    /// File path to the capture
    pub file_path: PathBuf,
    /// Sample rate
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Number of samples written
    pub sample_count: usize,
    /// Capture duration derived from the sample count
    pub duration_ms: u64,
}

/// Writes one session's microphone frames to a single WAV file.
///
/// The writer is created lazily from the first frame's format, so a
/// session that produced no audio leaves no file behind.
pub struct WavCapture {
    config: CaptureConfig,
    writer: Option<CaptureWriter>,
}

impl WavCapture {
    pub fn new(config: CaptureConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir)
            .context("Failed to create capture output directory")?;

        Ok(Self {
            config,
            writer: None,
        })
    }

    /// Drain microphone frames until the stream closes, then finalize
    pub async fn record(
        &mut self,
        mut frames: mpsc::Receiver<AudioFrame>,
    ) -> Result<Option<CaptureMetadata>> {
        while let Some(frame) = frames.recv().await {
            if self.writer.is_none() {
                self.writer = Some(self.open_writer(&frame)?);
            }

            if let Some(writer) = &mut self.writer {
                writer.write_frame(&frame)?;
            }
        }

        match self.writer.take() {
            Some(writer) => {
                let metadata = writer.finish()?;
                info!(
                    "Capture complete: {:?} ({} samples, {:.1}s)",
                    metadata.file_path,
                    metadata.sample_count,
                    metadata.duration_ms as f64 / 1000.0
                );
                Ok(Some(metadata))
            }
            None => {
                info!("Capture ended with no audio; no file written");
                Ok(None)
            }
        }
    }

    fn open_writer(&self, frame: &AudioFrame) -> Result<CaptureWriter> {
        let file_path = self
            .config
            .output_dir
            .join(format!("{}.wav", self.config.session_id));

        info!("Capturing raw audio to {:?}", file_path);

        CaptureWriter::new(file_path, frame.sample_rate, frame.channels)
    }
}

/// Writes WAV samples and finalizes the header exactly once
struct CaptureWriter {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    metadata: CaptureMetadata,
}

impl CaptureWriter {
    fn new(file_path: PathBuf, sample_rate: u32, channels: u16) -> Result<Self> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&file_path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", file_path))?;

        Ok(Self {
            writer: Some(writer),
            metadata: CaptureMetadata {
                file_path,
                sample_rate,
                channels,
                sample_count: 0,
                duration_ms: 0,
            },
        })
    }

    fn write_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        if let Some(writer) = &mut self.writer {
            for &sample in &frame.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }

            self.metadata.sample_count += frame.samples.len();
        }

        Ok(())
    }

    fn finish(mut self) -> Result<CaptureMetadata> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
        }

        let frames_per_channel =
            self.metadata.sample_count as u64 / self.metadata.channels.max(1) as u64;
        self.metadata.duration_ms =
            frames_per_channel * 1000 / self.metadata.sample_rate.max(1) as u64;

        Ok(self.metadata.clone())
    }
}

impl Drop for CaptureWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV writer on drop: {}", e);
            }
        }
    }
}
