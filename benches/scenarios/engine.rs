//! Benchmarks for full engine blocks: voice mixing, master gain and LFO.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::{
    dsp::lfo::ModTarget,
    synth::{AlgorithmKind, EngineConfig, SynthEngine},
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// C major across two octaves.
const CHORD: [f32; 8] = [
    261.63, 329.63, 392.00, 523.25, 659.26, 783.99, 987.77, 440.00,
];

fn engine_with_chord(kind: AlgorithmKind) -> SynthEngine {
    let mut engine = match SynthEngine::new(EngineConfig::with_sample_rate(SAMPLE_RATE)) {
        Ok(engine) => engine,
        Err(err) => panic!("default config rejected: {err}"),
    };
    engine.set_algorithm(kind);
    engine.lfo_connect(ModTarget::MasterGain, 0.2);
    for (key, &hz) in CHORD.iter().enumerate() {
        engine.note_on(key as u32, hz);
    }
    engine
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for kind in AlgorithmKind::ALL {
            let mut engine = engine_with_chord(kind);
            let id = format!("chord8_{}", kind.name());
            group.bench_with_input(BenchmarkId::new(id, size), &size, |b, _| {
                b.iter(|| {
                    engine.render_block(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}
