//! Benchmarks for scheduled parameter evaluation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_synth::dsp::automation::{AutomationParam, MAX_EVENTS};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_automation(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/automation");
    let dt = 1.0 / SAMPLE_RATE as f64;

    for &size in BLOCK_SIZES {
        // A single pending target approach, like the master gain
        let mut gain = AutomationParam::new(0.5);
        gain.set_target_at(0.1, 0.0, 0.02);
        group.bench_with_input(BenchmarkId::new("target", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0;
                for i in 0..size {
                    sum += gain.value_at(black_box(i as f64 * dt));
                }
                sum
            })
        });

        // Worst case: a full event list, queried after its last event
        let mut busy = AutomationParam::new(0.0);
        for n in 0..MAX_EVENTS {
            busy.linear_ramp_to(n as f32, 1.0 + n as f64);
        }
        group.bench_with_input(BenchmarkId::new("full_list", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0;
                for i in 0..size {
                    sum += busy.value_at(black_box(20.0 + i as f64 * dt));
                }
                sum
            })
        });
    }

    group.finish();
}
