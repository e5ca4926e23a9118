use super::RenderCtx;
use crate::{
    dsp::{envelope::Envelope, lfo::{bipolar_to_unipolar, ModTarget}, oscillator::OscillatorBlock},
    synth::config::AmConfig,
};

/*
Amplitude Modulation
====================

A modulator at a fixed frequency (independent of the note) scales the
carrier's amplitude. Slow modulators (a few Hz) are heard as tremolo; above
~20 Hz they add sidebands at f ± mod_frequency and the timbre turns
bell-like or metallic.

The Gain Curve
--------------

    m(t)    = unipolar(wave_mod(phase_mod))      ∈ [0, 1]
    gain(t) = (1 - depth) + depth × m(t)         ∈ [1 - depth, 1]
    out(t)  = wave_car(phase_car) × gain(t) × env(t)

The constant (1 - depth) term keeps the carrier audible; only depth = 1
lets the modulator silence it completely. Mapping the modulator to unipolar
keeps the gain inside [1 - depth, 1] for every modulator waveform.

Phase Offset
------------

The modulator starts late by

    delay = (offset_degrees / 360) / mod_frequency   seconds

Until then it contributes nothing and the gain sits at 1 - depth.
*/

/// Gain applied to the carrier for a modulator output in `[-1, 1]`.
#[inline]
pub fn am_gain(depth: f32, modulator_sample: f32) -> f32 {
    (1.0 - depth) + depth * bipolar_to_unipolar(modulator_sample)
}

#[derive(Debug, Clone)]
pub struct AmVoice {
    frequency: f32,
    mod_frequency: f32,
    depth: f32,
    modulator_start: f64,
    carrier: OscillatorBlock,
    modulator: OscillatorBlock,
    pub(super) envelope: Envelope,
}

impl AmVoice {
    pub fn new(frequency: f32, config: &AmConfig, envelope: Envelope, time: f64) -> Self {
        Self {
            frequency,
            mod_frequency: config.mod_frequency(),
            depth: config.depth(),
            modulator_start: time + config.modulator_delay() as f64,
            carrier: OscillatorBlock::new(config.carrier_waveform()),
            modulator: OscillatorBlock::new(config.modulator_waveform()),
            envelope,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx<'_>) {
        for (i, sample) in out.iter_mut().enumerate() {
            let t = ctx.sample_time(i);
            let carrier_freq = ctx.pitched(self.frequency, i);
            let depth = (self.depth + ctx.offset(ModTarget::AmDepth, i)).clamp(0.0, 1.0);
            let gain = if t >= self.modulator_start {
                am_gain(depth, self.modulator.next_sample(self.mod_frequency, ctx.sample_rate))
            } else {
                1.0 - depth
            };
            let c = self.carrier.next_sample(carrier_freq, ctx.sample_rate);
            *sample = c * gain * self.envelope.next_level(t);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{
        envelope::{Adsr, EnvelopeShape},
        oscillator::Waveform,
    };

    fn flat_envelope() -> Envelope {
        let mut env = Envelope::new(EnvelopeShape::new(1.0, 1.0));
        env.note_on(0.0, &Adsr::new(0.0, 0.0, 1.0, 0.1));
        env
    }

    #[test]
    fn gain_bounds() {
        assert!((am_gain(0.8, -1.0) - 0.2).abs() < 1e-6);
        assert!((am_gain(0.8, 1.0) - 1.0).abs() < 1e-6);
        assert!((am_gain(0.0, -1.0) - 1.0).abs() < 1e-6);
        assert!(am_gain(1.0, -1.0).abs() < 1e-6);
    }

    #[test]
    fn modulator_waits_for_phase_offset() {
        let mut config = AmConfig::default();
        config.set_mod_frequency(10.0);
        config.set_depth(0.5);
        config.set_phase_offset(90.0); // 25 ms delay
        config.set_carrier_waveform(Waveform::Square);

        let mut voice = AmVoice::new(100.0, &config, flat_envelope(), 0.0);
        let ctx = RenderCtx::new(1_000.0, 0.0);
        let mut out = vec![0.0; 60];
        voice.render(&mut out, &ctx);

        // Before 25 ms: square carrier at constant gain 0.5
        assert!(out[..25].iter().all(|s| (s.abs() - 0.5).abs() < 1e-6));
        // Modulator starts at phase 0: sine 0 → unipolar 0.5 → gain 0.75
        assert!((out[25].abs() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn depth_offset_is_applied_per_sample() {
        let mut config = AmConfig::default();
        config.set_mod_frequency(AmConfig::MIN_MOD_FREQUENCY);
        config.set_depth(0.0);
        config.set_carrier_waveform(Waveform::Square);

        // A near-still sine modulator sits at 0, so the gain is 1 - depth / 2
        let offsets = [0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.5];
        let ctx = RenderCtx::new(1_000.0, 0.0).with_modulation(ModTarget::AmDepth, &offsets);
        let mut voice = AmVoice::new(100.0, &config, flat_envelope(), 0.0);
        let mut out = vec![0.0; offsets.len()];
        voice.render(&mut out, &ctx);

        for (i, (&s, &offset)) in out.iter().zip(&offsets).enumerate() {
            let expected = 1.0 - offset.min(1.0) / 2.0;
            assert!((s.abs() - expected).abs() < 1e-3, "sample {i}: {s} vs {expected}");
        }
    }

    #[test]
    fn square_modulator_switches_between_bounds() {
        let mut config = AmConfig::default();
        config.set_mod_frequency(10.0);
        config.set_depth(0.6);
        config.set_carrier_waveform(Waveform::Square);
        config.set_modulator_waveform(Waveform::Square);

        let mut voice = AmVoice::new(100.0, &config, flat_envelope(), 0.0);
        let mut out = vec![0.0; 200];
        voice.render(&mut out, &RenderCtx::new(1_000.0, 0.0));

        for &s in &out {
            let level = s.abs();
            assert!(
                (level - 1.0).abs() < 1e-6 || (level - 0.4).abs() < 1e-6,
                "unexpected level {level}"
            );
        }
    }
}
