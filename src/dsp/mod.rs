//! Low-level DSP primitives used by the synthesis algorithms.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs. They stay focused on the
//! signal-processing math; voice lifecycle and routing live in `synth`.

/// Scheduled parameter changes (sets, ramps, target approaches).
pub mod automation;
/// Attack/decay/sustain/release envelope generator.
pub mod envelope;
/// Low frequency oscillator and its modulation route.
pub mod lfo;
/// Oscillator waveforms and phase accumulators.
pub mod oscillator;

pub use envelope::EnvelopeState;
