//! Errors surfaced to callers.
//!
//! Musical misuse (out-of-range parameters, duplicate notes, notes above
//! Nyquist) is never an error: setters clamp and the voice manager ignores or
//! logs. What remains is construction-time validation and queue backpressure.

/// Invalid [`EngineConfig`](crate::synth::config::EngineConfig).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("sample rate must be finite and positive, got {0}")]
    InvalidSampleRate(f32),

    #[error("polyphony must allow at least one voice")]
    NoVoices,

    #[error("command queue capacity must be at least 1")]
    EmptyQueue,

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidDuration { name: &'static str, value: f32 },
}

/// A control command could not be handed to the audio thread.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ControlError {
    /// The audio thread has not drained the queue; the command was dropped.
    #[error("command queue is full ({capacity} pending commands)")]
    QueueFull { capacity: usize },
}
