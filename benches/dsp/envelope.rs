//! Benchmarks for ADSR envelope generator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::dsp::envelope::{Adsr, Envelope, EnvelopeShape};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

const SHAPE: EnvelopeShape = EnvelopeShape::new(0.01, 0.4);

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let adsr = Adsr::new(0.5, 0.5, 0.7, 0.3);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (ramping up); the block start stays fixed so every
        // iteration measures the same segment
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &adsr);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(0.1), SAMPLE_RATE);
            })
        });

        // Sustain phase (holding steady)
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &adsr);
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(2.0), SAMPLE_RATE);
            })
        });

        // Release phase (ramping down)
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &adsr);
        env.note_off(1.0, adsr.release());
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(1.1), SAMPLE_RATE);
            })
        });
    }

    group.finish();
}
