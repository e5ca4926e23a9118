//! Synthesis algorithms.
//!
//! Each algorithm turns a frequency plus a snapshot of its config into a
//! voice: a fixed arrangement of oscillators composed per sample, with the
//! shared ADSR envelope on the output. The arrangement never changes while a
//! voice sounds, so there is no node graph; `SynthVoice` is a closed enum and
//! dispatch happens once per block.

mod additive;
mod am;
mod fm;
mod simple;

pub use additive::AdditiveVoice;
pub use am::{am_gain, AmVoice};
pub use fm::{instantaneous_frequency, FmVoice};
pub use simple::SimpleVoice;

use crate::{
    dsp::{
        envelope::{Adsr, Envelope, EnvelopeShape},
        lfo::ModTarget,
    },
    synth::config::{AlgorithmKind, SynthParams},
};

impl AlgorithmKind {
    /// Start level and peak of this algorithm's amplitude envelope.
    pub fn envelope_shape(self) -> EnvelopeShape {
        match self {
            AlgorithmKind::Simple => EnvelopeShape::new(0.1, 0.5),
            AlgorithmKind::Additive => EnvelopeShape::new(0.01, 0.3),
            AlgorithmKind::Fm | AlgorithmKind::Am => EnvelopeShape::new(0.01, 0.4),
        }
    }
}

/// Per-block rendering context for voices.
///
/// Carries the block's start time and, when the LFO is routed to a voice
/// parameter, one offset per sample for that parameter.
#[derive(Debug, Clone, Copy)]
pub struct RenderCtx<'a> {
    pub sample_rate: f32,
    /// Time of the first sample in the block, in seconds.
    pub time: f64,
    modulation: Option<VoiceModulation<'a>>,
}

/// Per-sample offsets for one voice parameter.
#[derive(Debug, Clone, Copy)]
struct VoiceModulation<'a> {
    target: ModTarget,
    offsets: &'a [f32],
}

impl<'a> RenderCtx<'a> {
    pub fn new(sample_rate: f32, time: f64) -> Self {
        Self {
            sample_rate,
            time,
            modulation: None,
        }
    }

    /// Route `offsets` into `target`, sample for sample.
    ///
    /// Pitch and FmIndex offsets are in Hz, AmDepth offsets are added to the
    /// depth. Offsets for a `MasterGain` target are ignored by voices.
    pub fn with_modulation(self, target: ModTarget, offsets: &'a [f32]) -> Self {
        Self {
            modulation: Some(VoiceModulation { target, offsets }),
            ..self
        }
    }

    /// The part of this block starting `start` samples in, `len` samples long.
    pub fn sub_block(&self, start: usize, len: usize) -> Self {
        Self {
            time: self.sample_time(start),
            modulation: self.modulation.map(|m| VoiceModulation {
                offsets: m.offsets.get(start..start + len).unwrap_or(&[]),
                ..m
            }),
            ..*self
        }
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    /// Time of sample `index` within the block.
    #[inline]
    pub fn sample_time(&self, index: usize) -> f64 {
        self.time + index as f64 / self.sample_rate as f64
    }

    /// LFO offset for `target` at sample `index`, 0 when not routed there.
    #[inline]
    pub fn offset(&self, target: ModTarget, index: usize) -> f32 {
        match self.modulation {
            Some(m) if m.target == target => m.offsets.get(index).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// `frequency` with the pitch offset at sample `index`, never below 0 Hz.
    #[inline]
    pub fn pitched(&self, frequency: f32, index: usize) -> f32 {
        (frequency + self.offset(ModTarget::Pitch, index)).max(0.0)
    }
}

/// A sounding note built by one of the algorithms.
#[derive(Debug, Clone)]
pub enum SynthVoice {
    Simple(SimpleVoice),
    Additive(AdditiveVoice),
    Fm(FmVoice),
    Am(AmVoice),
}

impl SynthVoice {
    /// Build a voice for `frequency` with the selected algorithm and start its
    /// envelope at `time`.
    pub fn play_note(frequency: f32, params: &SynthParams, time: f64) -> Self {
        let mut envelope = Envelope::new(params.algorithm.envelope_shape());
        envelope.note_on(time, &params.adsr);

        match params.algorithm {
            AlgorithmKind::Simple => {
                SynthVoice::Simple(SimpleVoice::new(frequency, &params.simple, envelope))
            }
            AlgorithmKind::Additive => {
                SynthVoice::Additive(AdditiveVoice::new(frequency, &params.additive, envelope))
            }
            AlgorithmKind::Fm => SynthVoice::Fm(FmVoice::new(frequency, &params.fm, envelope)),
            AlgorithmKind::Am => {
                SynthVoice::Am(AmVoice::new(frequency, &params.am, envelope, time))
            }
        }
    }

    /// Begin the release stage at `time` using the current release time.
    pub fn release(&mut self, time: f64, adsr: &Adsr) {
        self.envelope_mut().note_off(time, adsr.release());
    }

    /// Overwrite `out` with the next block of this voice.
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx<'_>) {
        match self {
            SynthVoice::Simple(v) => v.render(out, ctx),
            SynthVoice::Additive(v) => v.render(out, ctx),
            SynthVoice::Fm(v) => v.render(out, ctx),
            SynthVoice::Am(v) => v.render(out, ctx),
        }
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            SynthVoice::Simple(_) => AlgorithmKind::Simple,
            SynthVoice::Additive(_) => AlgorithmKind::Additive,
            SynthVoice::Fm(_) => AlgorithmKind::Fm,
            SynthVoice::Am(_) => AlgorithmKind::Am,
        }
    }

    pub fn frequency(&self) -> f32 {
        match self {
            SynthVoice::Simple(v) => v.frequency(),
            SynthVoice::Additive(v) => v.frequency(),
            SynthVoice::Fm(v) => v.frequency(),
            SynthVoice::Am(v) => v.frequency(),
        }
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            SynthVoice::Simple(v) => &v.envelope,
            SynthVoice::Additive(v) => &v.envelope,
            SynthVoice::Fm(v) => &v.envelope,
            SynthVoice::Am(v) => &v.envelope,
        }
    }

    fn envelope_mut(&mut self) -> &mut Envelope {
        match self {
            SynthVoice::Simple(v) => &mut v.envelope,
            SynthVoice::Additive(v) => &mut v.envelope,
            SynthVoice::Fm(v) => &mut v.envelope,
            SynthVoice::Am(v) => &mut v.envelope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::EnvelopeState;

    #[test]
    fn every_kind_renders_bounded_audio() {
        let ctx = RenderCtx::new(48_000.0, 0.0);
        for kind in AlgorithmKind::ALL {
            let params = SynthParams {
                algorithm: kind,
                ..SynthParams::default()
            };
            let mut voice = SynthVoice::play_note(440.0, &params, 0.0);
            assert_eq!(voice.kind(), kind);

            let mut buffer = vec![0.0; 2_048];
            voice.render(&mut buffer, &ctx);
            assert!(buffer.iter().all(|s| s.is_finite() && s.abs() <= 1.0), "{kind:?}");
            assert!(buffer.iter().any(|s| s.abs() > 0.01), "{kind:?} is silent");
        }
    }

    #[test]
    fn release_uses_given_release_time() {
        let params = SynthParams::default();
        let mut voice = SynthVoice::play_note(220.0, &params, 0.0);
        voice.release(0.5, &Adsr::new(0.01, 0.1, 0.6, 0.4));

        let env = voice.envelope();
        assert_eq!(env.stage_at(0.6), EnvelopeState::Release);
        assert!((env.release_end().unwrap_or_default() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn render_ctx_sample_times() {
        let ctx = RenderCtx::new(1_000.0, 2.0);
        assert!((ctx.sample_time(10) - 2.01).abs() < 1e-9);
        assert_eq!(ctx.nyquist(), 500.0);
    }

    #[test]
    fn render_ctx_offsets_follow_sub_blocks() {
        let offsets = [0.0, 10.0, 20.0, 30.0, 40.0];
        let ctx = RenderCtx::new(1_000.0, 0.0).with_modulation(ModTarget::Pitch, &offsets);
        assert_eq!(ctx.pitched(100.0, 3), 130.0);
        assert_eq!(ctx.offset(ModTarget::AmDepth, 3), 0.0);

        let tail = ctx.sub_block(2, 3);
        assert!((tail.time - 0.002).abs() < 1e-12);
        assert_eq!(tail.offset(ModTarget::Pitch, 0), 20.0);
        assert_eq!(tail.offset(ModTarget::Pitch, 2), 40.0);
        assert_eq!(tail.offset(ModTarget::Pitch, 3), 0.0);
    }
}
