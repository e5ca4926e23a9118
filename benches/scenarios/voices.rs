//! Benchmarks for one sounding voice per algorithm.
//!
//! Additive with all 8 partials is the heaviest path: 8 oscillators per
//! sample against 1 for Simple and 2 for FM/AM.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::synth::{
    algorithm::{RenderCtx, SynthVoice},
    config::{AlgorithmKind, SynthParams, MAX_PARTIALS},
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let ctx = RenderCtx::new(SAMPLE_RATE, 0.05); // Inside the attack of a note started at 0

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for kind in AlgorithmKind::ALL {
            let params = SynthParams {
                algorithm: kind,
                ..SynthParams::default()
            };
            let mut voice = SynthVoice::play_note(110.0, &params, 0.0);
            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, _| {
                b.iter(|| {
                    voice.render(black_box(&mut buffer), black_box(&ctx));
                })
            });
        }

        // === FULL ADDITIVE ===
        let mut params = SynthParams {
            algorithm: AlgorithmKind::Additive,
            ..SynthParams::default()
        };
        params.additive.set_partial_count(MAX_PARTIALS);
        let mut voice = SynthVoice::play_note(110.0, &params, 0.0);
        group.bench_with_input(BenchmarkId::new("additive_8", size), &size, |b, _| {
            b.iter(|| {
                voice.render(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
