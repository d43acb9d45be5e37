// Integration tests for the scripted recognition engine
//
// These tests verify the engine event contract: Started arrives first,
// script events follow in order, and Ended arrives exactly once as the
// last event, stop or no stop.

use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use voiceboard::{
    EngineConfig, EngineError, EngineEvent, EngineFactory, ScriptStep, ScriptedEngine,
    ScriptedEngineFactory, SpeechEngine,
};

async fn drain(mut rx: mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_plays_script_in_order() -> Result<()> {
    let script = vec![
        ScriptStep::Interim("ho".to_string()),
        ScriptStep::Final("hola".to_string()),
        ScriptStep::Final("equipo".to_string()),
    ];
    let mut engine =
        ScriptedEngine::new(EngineConfig::default(), script, Duration::from_millis(1));

    let rx = engine.start().await?;
    let events = drain(rx).await;

    assert_eq!(
        events,
        vec![
            EngineEvent::Started,
            EngineEvent::Result {
                text: "ho".to_string(),
                is_final: false,
            },
            EngineEvent::Result {
                text: "hola".to_string(),
                is_final: true,
            },
            EngineEvent::Result {
                text: "equipo".to_string(),
                is_final: true,
            },
            EngineEvent::Ended,
        ]
    );
    assert!(!engine.is_active(), "Engine should be inactive after the run");

    Ok(())
}

#[tokio::test]
async fn test_fail_step_emits_error_then_ends() -> Result<()> {
    let script = vec![
        ScriptStep::Final("hola".to_string()),
        ScriptStep::Fail(EngineError::Network),
        ScriptStep::Final("never delivered".to_string()),
    ];
    let mut engine =
        ScriptedEngine::new(EngineConfig::default(), script, Duration::from_millis(1));

    let events = drain(engine.start().await?).await;

    assert_eq!(
        events,
        vec![
            EngineEvent::Started,
            EngineEvent::Result {
                text: "hola".to_string(),
                is_final: true,
            },
            EngineEvent::Error(EngineError::Network),
            EngineEvent::Ended,
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_stop_truncates_but_still_ends() -> Result<()> {
    let script: Vec<ScriptStep> = (0..100)
        .map(|i| ScriptStep::Final(format!("fragment {}", i)))
        .collect();
    let mut engine =
        ScriptedEngine::new(EngineConfig::default(), script, Duration::from_millis(20));

    let mut rx = engine.start().await?;

    // Let the run get going before stopping it
    assert_eq!(rx.recv().await, Some(EngineEvent::Started));
    let first = rx.recv().await;
    assert!(matches!(first, Some(EngineEvent::Result { .. })));

    engine.stop().await?;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.last(), Some(&EngineEvent::Ended));
    assert!(
        events.len() < 100,
        "Stop should truncate the remaining script"
    );

    Ok(())
}

#[tokio::test]
async fn test_stop_finalizes_the_fragment_in_flight() -> Result<()> {
    let script = vec![
        ScriptStep::Final("hola".to_string()),
        ScriptStep::Final("equipo".to_string()),
        ScriptStep::Final("adios".to_string()),
    ];
    let mut engine =
        ScriptedEngine::new(EngineConfig::default(), script, Duration::from_millis(100));

    let mut rx = engine.start().await?;
    assert_eq!(rx.recv().await, Some(EngineEvent::Started));
    assert_eq!(
        rx.recv().await,
        Some(EngineEvent::Result {
            text: "hola".to_string(),
            is_final: true,
        })
    );

    // "equipo" is mid-recognition; the stop finalizes it, "adios" is cut
    engine.stop().await?;
    let events = drain(rx).await;

    assert_eq!(
        events,
        vec![
            EngineEvent::Result {
                text: "equipo".to_string(),
                is_final: true,
            },
            EngineEvent::Ended,
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_stop_abandons_an_interim_in_flight() -> Result<()> {
    let script = vec![
        ScriptStep::Final("hola".to_string()),
        ScriptStep::Interim("equ".to_string()),
    ];
    let mut engine =
        ScriptedEngine::new(EngineConfig::default(), script, Duration::from_millis(100));

    let mut rx = engine.start().await?;
    assert_eq!(rx.recv().await, Some(EngineEvent::Started));
    assert!(matches!(rx.recv().await, Some(EngineEvent::Result { .. })));

    engine.stop().await?;
    let events = drain(rx).await;

    assert_eq!(events, vec![EngineEvent::Ended]);

    Ok(())
}

#[tokio::test]
async fn test_interim_steps_dropped_when_disabled() -> Result<()> {
    let config = EngineConfig {
        interim_results: false,
        ..EngineConfig::default()
    };
    let script = vec![
        ScriptStep::Interim("ho".to_string()),
        ScriptStep::Final("hola".to_string()),
        ScriptStep::Interim("equ".to_string()),
        ScriptStep::Final("equipo".to_string()),
    ];
    let mut engine = ScriptedEngine::new(config, script, Duration::from_millis(1));

    let events = drain(engine.start().await?).await;

    // Started, two finals, Ended
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| !matches!(
        e,
        EngineEvent::Result { is_final: false, .. }
    )));

    Ok(())
}

#[tokio::test]
async fn test_non_continuous_ends_after_first_final() -> Result<()> {
    let config = EngineConfig {
        continuous: false,
        ..EngineConfig::default()
    };
    let script = vec![
        ScriptStep::Interim("ho".to_string()),
        ScriptStep::Final("hola".to_string()),
        ScriptStep::Final("equipo".to_string()),
    ];
    let mut engine = ScriptedEngine::new(config, script, Duration::from_millis(1));

    let events = drain(engine.start().await?).await;

    assert_eq!(
        events,
        vec![
            EngineEvent::Started,
            EngineEvent::Result {
                text: "ho".to_string(),
                is_final: false,
            },
            EngineEvent::Result {
                text: "hola".to_string(),
                is_final: true,
            },
            EngineEvent::Ended,
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_double_start_is_an_error() -> Result<()> {
    let script = vec![ScriptStep::Final("hola".to_string())];
    let mut engine =
        ScriptedEngine::new(EngineConfig::default(), script, Duration::from_millis(50));

    let _rx = engine.start().await?;
    assert!(engine.is_active());
    assert!(
        engine.start().await.is_err(),
        "Second start must fail while the run is live"
    );

    Ok(())
}

#[test]
fn test_unsupported_factory_probe() {
    let factory = ScriptedEngineFactory::unsupported();

    assert!(!factory.is_supported());
    assert!(factory.create(EngineConfig::default()).is_err());
}

#[tokio::test]
async fn test_factory_counts_sessions_and_stops() -> Result<()> {
    let factory = ScriptedEngineFactory::new(vec![ScriptStep::Final("hola".to_string())])
        .with_step_delay(Duration::from_millis(1));

    assert!(factory.is_supported());
    assert_eq!(factory.sessions_created(), 0);

    let mut first = factory.create(EngineConfig::default())?;
    let mut second = factory.create(EngineConfig::default())?;
    assert_eq!(factory.sessions_created(), 2);

    // Stops are counted across all engines from the same factory
    let _rx = first.start().await?;
    first.stop().await?;
    second.stop().await?;
    assert_eq!(factory.stops_requested(), 2);

    Ok(())
}
