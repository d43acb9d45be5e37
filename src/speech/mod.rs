//! Speech recognition capability
//!
//! The recognition engine is a consumed abstraction: the host injects
//! whatever recognizer it has through `EngineFactory`, and the controller
//! drives it through the `SpeechEngine` event contract. `ScriptedEngine`
//! is the in-tree implementation used by tests and the demo binary.

pub mod engine;
pub mod scripted;

pub use engine::{EngineConfig, EngineError, EngineEvent, EngineFactory, SpeechEngine};
pub use scripted::{ScriptStep, ScriptedEngine, ScriptedEngineFactory};
