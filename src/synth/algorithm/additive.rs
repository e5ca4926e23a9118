use super::RenderCtx;
use crate::{
    dsp::{envelope::Envelope, oscillator::OscillatorBlock},
    synth::config::{AdditiveConfig, Partial, MAX_PARTIALS},
};

/*
Additive Synthesis
==================

Build a timbre by summing oscillators at multiples of the note frequency:

    out(t) = env(t) × Σ amplitude[i] × wave(2π × f × harmonic[i] × t)

With sine partials at harmonics 1..N and amplitudes 1/n this approaches a
sawtooth; odd harmonics only approach a square. The defaults (1.0, 0.5,
0.3, 0.2, 0.1) give a soft, organ-like tone.

The envelope is applied once to the sum, not per partial, so all partials
rise and fall together.

Partials whose frequency lands at or above Nyquist are skipped instead of
being allowed to fold back down as aliases.
*/

#[derive(Debug, Clone)]
pub struct AdditiveVoice {
    frequency: f32,
    partials: [Partial; MAX_PARTIALS],
    oscillators: [OscillatorBlock; MAX_PARTIALS],
    count: usize,
    pub(super) envelope: Envelope,
}

impl AdditiveVoice {
    pub fn new(frequency: f32, config: &AdditiveConfig, envelope: Envelope) -> Self {
        let active = config.partials();
        let mut partials = [Partial::harmonic_default(1); MAX_PARTIALS];
        partials[..active.len()].copy_from_slice(active);

        Self {
            frequency,
            partials,
            oscillators: [OscillatorBlock::new(config.waveform()); MAX_PARTIALS],
            count: active.len(),
            envelope,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn partial_count(&self) -> usize {
        self.count
    }

    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx<'_>) {
        let nyquist = ctx.nyquist();

        for (i, sample) in out.iter_mut().enumerate() {
            let base = ctx.pitched(self.frequency, i);
            let mut sum = 0.0;
            for k in 0..self.count {
                let freq = base * self.partials[k].harmonic;
                if freq >= nyquist {
                    continue;
                }
                sum += self.partials[k].amplitude
                    * self.oscillators[k].next_sample(freq, ctx.sample_rate);
            }
            *sample = sum * self.envelope.next_level(ctx.sample_time(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::{Adsr, EnvelopeShape};
    use std::f32::consts::TAU;

    fn sustained_envelope() -> Envelope {
        // Start and peak equal with full sustain: a flat 0.3 gain
        let mut env = Envelope::new(EnvelopeShape::new(0.3, 0.3));
        env.note_on(0.0, &Adsr::new(0.0, 0.0, 1.0, 0.2));
        env
    }

    #[test]
    fn default_partials_golden_output() {
        let mut voice = AdditiveVoice::new(100.0, &AdditiveConfig::default(), sustained_envelope());
        let ctx = RenderCtx::new(8_000.0, 0.0);
        let mut out = vec![0.0; 64];
        voice.render(&mut out, &ctx);

        const GOLDEN: [f32; 8] = [
            0.000000, 0.098035, 0.190622, 0.272840, 0.340748, 0.391737, 0.424718, 0.440145,
        ];
        for (i, (&s, &expected)) in out.iter().zip(&GOLDEN).enumerate() {
            assert!((s - expected).abs() < 2e-5, "sample {i}: {s} vs {expected}");
        }

        let amps = [1.0, 0.5, 0.3, 0.2, 0.1];
        for (i, &s) in out.iter().enumerate() {
            let t = i as f32 / 8_000.0;
            let expected: f32 = amps
                .iter()
                .enumerate()
                .map(|(k, a)| a * (TAU * 100.0 * (k + 1) as f32 * t).sin())
                .sum::<f32>()
                * 0.3;
            assert!((s - expected).abs() < 1e-4, "sample {i}: {s} vs {expected}");
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let render = || {
            let mut voice =
                AdditiveVoice::new(261.63, &AdditiveConfig::default(), sustained_envelope());
            let mut out = vec![0.0; 512];
            voice.render(&mut out, &RenderCtx::new(48_000.0, 0.0));
            out
        };
        assert_eq!(render(), render());
    }

    #[test]
    fn partials_above_nyquist_are_skipped() {
        let mut config = AdditiveConfig::default();
        config.set_partial_count(1);
        config.set_partial_harmonic(0, 4.0);

        // 4 × 150 Hz = 600 Hz, above the 500 Hz Nyquist of a 1 kHz stream
        let mut voice = AdditiveVoice::new(150.0, &config, sustained_envelope());
        let mut out = vec![1.0; 32];
        voice.render(&mut out, &RenderCtx::new(1_000.0, 0.0));
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn snapshot_ignores_later_config_edits() {
        let mut config = AdditiveConfig::default();
        let voice = AdditiveVoice::new(220.0, &config, sustained_envelope());
        config.set_partial_count(8);
        assert_eq!(voice.partial_count(), 5);
    }
}
