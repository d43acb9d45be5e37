use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use voiceboard::{
    create_router, AppState, Config, RecordingController, ScriptStep, ScriptedEngineFactory,
    StaticGate,
};

#[derive(Debug, Parser)]
#[command(name = "voiceboard", about = "Voice dictation service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/voiceboard")]
    config: String,

    /// Pretend the host has no speech recognition support
    #[arg(long)]
    unsupported: bool,

    /// Pretend the user denied microphone access
    #[arg(long)]
    deny_microphone: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Voiceboard v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!("Recognition language: {}", cfg.speech.language);

    let factory: Arc<ScriptedEngineFactory> = if args.unsupported {
        Arc::new(ScriptedEngineFactory::unsupported())
    } else {
        Arc::new(
            ScriptedEngineFactory::new(demo_script()).with_step_delay(Duration::from_millis(800)),
        )
    };

    let gate: Arc<StaticGate> = if args.deny_microphone {
        Arc::new(StaticGate::denied("denied by --deny-microphone"))
    } else {
        Arc::new(StaticGate::granted())
    };

    let capture = cfg.capture.enabled.then(|| cfg.capture.clone());
    if let Some(capture) = &capture {
        info!("Session audio capture enabled: {}", capture.output_dir);
    }

    let controller = Arc::new(RecordingController::new(
        cfg.speech.clone(),
        capture,
        factory,
        gate,
    ));

    let state = AppState::new(Arc::clone(&controller));
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.shutdown().await;
    info!("Voiceboard stopped");

    Ok(())
}

/// The script the demo engine plays back for every session
fn demo_script() -> Vec<ScriptStep> {
    vec![
        ScriptStep::Interim("hola".to_string()),
        ScriptStep::Final("hola equipo".to_string()),
        ScriptStep::Interim("esto".to_string()),
        ScriptStep::Final("esto es una prueba de dictado".to_string()),
        ScriptStep::Final("gracias".to_string()),
    ]
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Received Ctrl+C, shutting down");
}
