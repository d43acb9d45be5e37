use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::engine::{EngineConfig, EngineError, EngineEvent, EngineFactory, SpeechEngine};

/// One step of a scripted recognition run
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Revisable fragment, delivered with `is_final = false`
    Interim(String),
    /// Finalized fragment, delivered with `is_final = true`
    Final(String),
    /// Mid-session failure; delivered as `Error`, then the run ends
    Fail(EngineError),
}

/// Recognition engine that plays a fixed script of events.
///
/// Stands in for a host recognizer in tests and the demo binary: `start`
/// emits `Started`, then one event per script step with a configurable
/// delay between steps, then `Ended`. `stop` cuts the script short: a
/// final fragment already mid-recognition is still delivered, an interim
/// or failure step is abandoned, and `Ended` closes the run.
pub struct ScriptedEngine {
    config: EngineConfig,
    script: Vec<ScriptStep>,
    step_delay: Duration,
    active: Arc<AtomicBool>,
    stop_tx: Option<watch::Sender<bool>>,
    stops_requested: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new(config: EngineConfig, script: Vec<ScriptStep>, step_delay: Duration) -> Self {
        Self {
            config,
            script,
            step_delay,
            active: Arc::new(AtomicBool::new(false)),
            stop_tx: None,
            stops_requested: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_stop_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.stops_requested = counter;
        self
    }

    /// Script after applying the engine config: interim steps are dropped
    /// when interim results are off, and a non-continuous run is cut after
    /// its first final fragment.
    fn playback_steps(&self) -> Vec<ScriptStep> {
        let mut steps: Vec<ScriptStep> = self
            .script
            .iter()
            .filter(|step| self.config.interim_results || !matches!(step, ScriptStep::Interim(_)))
            .cloned()
            .collect();

        if !self.config.continuous {
            if let Some(pos) = steps.iter().position(|s| matches!(s, ScriptStep::Final(_))) {
                steps.truncate(pos + 1);
            }
        }

        steps
    }
}

#[async_trait::async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn start(&mut self) -> Result<mpsc::Receiver<EngineEvent>> {
        if self.active.load(Ordering::SeqCst) {
            anyhow::bail!("Scripted engine already started");
        }
        self.active.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        self.stop_tx = Some(stop_tx);

        let steps = self.playback_steps();
        let step_delay = self.step_delay;
        let active = Arc::clone(&self.active);

        tokio::spawn(async move {
            let _ = tx.send(EngineEvent::Started).await;

            for step in steps {
                let stopped = tokio::select! {
                    _ = tokio::time::sleep(step_delay) => false,
                    // Stop requested, or the engine itself was dropped
                    _ = stop_rx.changed() => true,
                };

                if stopped {
                    // The fragment held mid-recognition is finalized by the
                    // stop; an interim hypothesis or pending failure is not.
                    if let ScriptStep::Final(text) = step {
                        let _ = tx
                            .send(EngineEvent::Result {
                                text,
                                is_final: true,
                            })
                            .await;
                    }
                    break;
                }

                let terminal = matches!(step, ScriptStep::Fail(_));
                let event = match step {
                    ScriptStep::Interim(text) => EngineEvent::Result {
                        text,
                        is_final: false,
                    },
                    ScriptStep::Final(text) => EngineEvent::Result {
                        text,
                        is_final: true,
                    },
                    ScriptStep::Fail(error) => EngineEvent::Error(error),
                };

                if tx.send(event).await.is_err() {
                    break;
                }
                if terminal {
                    break;
                }
            }

            let _ = tx.send(EngineEvent::Ended).await;
            active.store(false, Ordering::SeqCst);
            debug!("Scripted recognition run finished");
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.stops_requested.fetch_add(1, Ordering::SeqCst);
        if let Some(stop) = self.stop_tx.take() {
            let _ = stop.send(true);
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Builds scripted engines and records lifecycle calls.
///
/// The session and stop counters let tests assert how many engines were
/// actually constructed and how many stop requests they received.
pub struct ScriptedEngineFactory {
    script: Vec<ScriptStep>,
    step_delay: Duration,
    supported: bool,
    sessions_created: Arc<AtomicUsize>,
    stops_requested: Arc<AtomicUsize>,
}

impl ScriptedEngineFactory {
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            step_delay: Duration::from_millis(10),
            supported: true,
            sessions_created: Arc::new(AtomicUsize::new(0)),
            stops_requested: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Factory whose capability probe reports no recognition support
    pub fn unsupported() -> Self {
        let mut factory = Self::new(Vec::new());
        factory.supported = false;
        factory
    }

    /// Delay between scripted events
    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    /// Number of engines handed out so far
    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }

    /// Number of stop requests across all engines from this factory
    pub fn stops_requested(&self) -> usize {
        self.stops_requested.load(Ordering::SeqCst)
    }
}

impl EngineFactory for ScriptedEngineFactory {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(&self, config: EngineConfig) -> Result<Box<dyn SpeechEngine>> {
        if !self.supported {
            anyhow::bail!("Speech recognition is not supported on this host");
        }

        self.sessions_created.fetch_add(1, Ordering::SeqCst);
        let engine = ScriptedEngine::new(config, self.script.clone(), self.step_delay)
            .with_stop_counter(Arc::clone(&self.stops_requested));
        Ok(Box::new(engine))
    }
}
