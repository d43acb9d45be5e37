use anyhow::Result;
use serde::Deserialize;

use crate::speech::EngineConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub speech: SpeechSettings,
    #[serde(default)]
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Recognition settings handed to the speech engine, plus controller
/// behavior that falls out of them
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// BCP 47 language tag for recognition
    pub language: String,
    /// Keep recognizing through pauses instead of ending after one phrase
    pub continuous: bool,
    /// Emit interim results while a phrase is still being refined
    pub interim_results: bool,
    /// Alternatives requested per result
    pub max_alternatives: u32,
    /// Keep the transcript across sessions instead of resetting per start
    pub append_across_sessions: bool,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: "es-ES".to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 1,
            append_across_sessions: false,
        }
    }
}

impl SpeechSettings {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            language: self.language.clone(),
            continuous: self.continuous,
            interim_results: self.interim_results,
            max_alternatives: self.max_alternatives,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Write each session's raw audio to a WAV file
    pub enabled: bool,
    /// Directory capture files land in
    pub output_dir: String,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: "recordings".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
