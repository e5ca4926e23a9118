//! Benchmarks for LFO rendering.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::dsp::lfo::{Lfo, ModTarget};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lfo");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        let mut offsets = vec![0.0f32; size];

        // Render plus the per-sample tap used for voice targets
        let mut lfo = Lfo::new();
        lfo.connect(ModTarget::Pitch, 20.0);
        group.bench_with_input(BenchmarkId::new("render_and_tap", size), &size, |b, _| {
            b.iter(|| {
                lfo.render(black_box(&mut buffer), SAMPLE_RATE);
                for (offset, &s) in offsets.iter_mut().zip(&buffer) {
                    *offset = lfo.tap(s, ModTarget::Pitch);
                }
                black_box(&offsets);
            })
        });
    }

    group.finish();
}
