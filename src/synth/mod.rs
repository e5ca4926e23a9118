// Purpose: Algorithms, voice management, polyphony, control handoff
// This layer sits above the DSP primitives and turns notes into audio

pub mod algorithm;
pub mod config;
#[cfg(feature = "rtrb")]
pub mod controller;
pub mod engine;
pub mod message;
pub mod poly;
pub mod voice;

pub use config::{AlgorithmKind, EngineConfig, SynthParams};
#[cfg(feature = "rtrb")]
pub use controller::SynthController;
pub use engine::SynthEngine;
pub use voice::NoteKey;
