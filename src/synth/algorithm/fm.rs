use super::RenderCtx;
use crate::{
    dsp::{envelope::Envelope, lfo::ModTarget, oscillator::OscillatorBlock},
    synth::config::FmConfig,
};

/*
Frequency Modulation
====================

Two oscillators: a modulator wobbles the carrier's frequency at an audio
rate, producing sidebands around the carrier instead of a vibrato.

Vocabulary
----------

  carrier       The oscillator we hear, centred on the note frequency f.

  modulator     Runs at f × ratio. Its output is never heard directly.

  ratio         Modulator frequency / carrier frequency (0.1 to 10).
                Integer ratios give harmonic spectra (bells at 3.5, brass
                near 1, hollow/clarinet at 2). Non-integers sound metallic.

  index         Peak deviation of the carrier, in Hz (0 to 1000). Larger
                index → more and louder sidebands → brighter sound.


The Math
--------

Per sample:

    m(t)          = wave_mod(phase_mod)
    f_inst(t)     = f + index × m(t)
    phase_carrier += 2π × f_inst(t) / sample_rate
    out(t)        = wave_car(phase_carrier) × env(t)

Because m(t) ∈ [-1, 1], the instantaneous carrier frequency always stays
inside [f - index, f + index]. With index > f the carrier briefly runs
backwards (negative frequency); the phase accumulator handles that by
wrapping.

The envelope shapes the carrier output only; the modulation depth stays
constant for the life of the note.
*/

/// Carrier frequency for a modulator output in `[-1, 1]`.
#[inline]
pub fn instantaneous_frequency(frequency: f32, index: f32, modulator_sample: f32) -> f32 {
    frequency + index * modulator_sample
}

#[derive(Debug, Clone)]
pub struct FmVoice {
    frequency: f32,
    ratio: f32,
    index: f32,
    carrier: OscillatorBlock,
    modulator: OscillatorBlock,
    pub(super) envelope: Envelope,
}

impl FmVoice {
    pub fn new(frequency: f32, config: &FmConfig, envelope: Envelope) -> Self {
        Self {
            frequency,
            ratio: config.ratio(),
            index: config.index(),
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
            let carrier_freq = ctx.pitched(self.frequency, i);
            let modulator_freq = carrier_freq * self.ratio;
            let index =
                (self.index + ctx.offset(ModTarget::FmIndex, i)).clamp(0.0, FmConfig::MAX_INDEX);

            let m = self.modulator.next_sample(modulator_freq, ctx.sample_rate);
            let inst = instantaneous_frequency(carrier_freq, index, m);
            let c = self.carrier.next_sample(inst, ctx.sample_rate);
            *sample = c * self.envelope.next_level(ctx.sample_time(i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{
        envelope::{Adsr, EnvelopeShape},
        oscillator::OscillatorBlock,
    };

    fn flat_envelope() -> Envelope {
        let mut env = Envelope::new(EnvelopeShape::new(1.0, 1.0));
        env.note_on(0.0, &Adsr::new(0.0, 0.0, 1.0, 0.1));
        env
    }

    #[test]
    fn zero_index_is_a_plain_carrier() {
        let mut config = FmConfig::default();
        config.set_index(0.0);
        let mut voice = FmVoice::new(440.0, &config, flat_envelope());
        let ctx = RenderCtx::new(48_000.0, 0.0);
        let mut out = vec![0.0; 256];
        voice.render(&mut out, &ctx);

        let mut reference = OscillatorBlock::new(config.carrier_waveform());
        for &s in &out {
            let expected = reference.next_sample(440.0, 48_000.0);
            assert!((s - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn modulation_changes_the_waveform() {
        let ctx = RenderCtx::new(48_000.0, 0.0);
        let mut plain_cfg = FmConfig::default();
        plain_cfg.set_index(0.0);

        let mut plain = FmVoice::new(220.0, &plain_cfg, flat_envelope());
        let mut modulated = FmVoice::new(220.0, &FmConfig::default(), flat_envelope());
        let mut a = vec![0.0; 512];
        let mut b = vec![0.0; 512];
        plain.render(&mut a, &ctx);
        modulated.render(&mut b, &ctx);

        let diff: f32 = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).sum();
        assert!(diff > 1.0);
    }

    #[test]
    fn instantaneous_frequency_spans_index() {
        assert_eq!(instantaneous_frequency(440.0, 100.0, 1.0), 540.0);
        assert_eq!(instantaneous_frequency(440.0, 100.0, -1.0), 340.0);
        assert_eq!(instantaneous_frequency(440.0, 100.0, 0.0), 440.0);
    }
}
