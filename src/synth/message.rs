#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::{
    dsp::{envelope::Adsr, lfo::ModTarget, oscillator::Waveform},
    synth::{config::AlgorithmKind, voice::NoteKey},
};

/// Control command applied by the engine at the next block boundary.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SynthMessage {
    NoteOn { key: NoteKey, frequency: f32 },
    NoteOff { key: NoteKey },
    AllNotesOff,
    Silence,

    SetAlgorithm(AlgorithmKind),
    SetWaveform(Waveform),
    SetAdsr(Adsr),

    SetPartialCount(usize),
    SetPartialAmplitude { index: usize, amplitude: f32 },
    SetPartialHarmonic { index: usize, harmonic: f32 },
    SetAdditiveWaveform(Waveform),

    SetFmRatio(f32),
    SetFmIndex(f32),
    SetFmCarrierWaveform(Waveform),
    SetFmModulatorWaveform(Waveform),

    SetAmFrequency(f32),
    SetAmDepth(f32),
    SetAmPhaseOffset(f32),
    SetAmCarrierWaveform(Waveform),
    SetAmModulatorWaveform(Waveform),

    LfoStart,
    LfoStop,
    LfoSetFrequency(f32),
    LfoSetDepth(f32),
    LfoSetWaveform(Waveform),
    LfoConnect { target: ModTarget, range: f32 },
    LfoDisconnect,
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<SynthMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<SynthMessage> {
    fn pop(&mut self) -> Option<SynthMessage> {
        Consumer::pop(self).ok()
    }
}
