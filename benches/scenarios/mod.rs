//! Real-world scenario benchmarks.
//!
//! Single voices of every algorithm, and the full engine with a chord held.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
