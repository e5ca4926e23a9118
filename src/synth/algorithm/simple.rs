use super::RenderCtx;
use crate::{
    dsp::{envelope::Envelope, oscillator::OscillatorBlock},
    synth::config::SimpleConfig,
};

/// One oscillator at the note frequency, envelope straight on its output.
#[derive(Debug, Clone)]
pub struct SimpleVoice {
    frequency: f32,
    osc: OscillatorBlock,
    pub(super) envelope: Envelope,
}

impl SimpleVoice {
    pub fn new(frequency: f32, config: &SimpleConfig, envelope: Envelope) -> Self {
        Self {
            frequency,
            osc: OscillatorBlock::new(config.waveform),
            envelope,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx<'_>) {
        for (i, sample) in out.iter_mut().enumerate() {
            let freq = ctx.pitched(self.frequency, i);
            let level = self.envelope.next_level(ctx.sample_time(i));
            *sample = self.osc.next_sample(freq, ctx.sample_rate) * level;
        }
    }
}
