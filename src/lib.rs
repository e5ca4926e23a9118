pub mod dsp;
pub mod error; // Construction and control-queue errors
pub mod synth; // Algorithms, voice management and the engine

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
