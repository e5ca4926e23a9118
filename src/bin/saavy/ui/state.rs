//! Shared state types for UI communication
//!
//! `StatusUpdate` crosses from the audio thread and is allocation-free;
//! `Controls` mirrors what the UI has sent to the engine.

use saavy_synth::{
    dsp::{envelope::EnvelopeState, lfo::ModTarget, oscillator::Waveform},
    synth::{AlgorithmKind, NoteKey, SynthEngine},
};

/// Voices reported per update; the rest are counted but not drawn.
pub const MAX_SHOWN_VOICES: usize = 32;

/// One sounding voice as the UI sees it.
#[derive(Clone, Copy, Debug)]
pub struct VoiceLight {
    pub key: NoteKey,
    pub stage: EnvelopeState,
    pub level: f32,
}

/// Engine state captured at the end of an audio callback (Copy, no allocations)
#[derive(Clone, Copy, Debug)]
pub struct StatusUpdate {
    pub time: f64,
    pub voice_count: usize,
    pub held_count: usize,
    pub master_gain: f32,
    pub voices: [Option<VoiceLight>; MAX_SHOWN_VOICES],
}

impl StatusUpdate {
    pub fn capture(engine: &SynthEngine) -> Self {
        let mut voices = [None; MAX_SHOWN_VOICES];
        for (slot, snap) in voices.iter_mut().zip(engine.voice_snapshots()) {
            *slot = Some(VoiceLight {
                key: snap.key,
                stage: snap.stage,
                level: snap.level,
            });
        }
        Self {
            time: engine.now(),
            voice_count: engine.voice_count(),
            held_count: engine.held_count(),
            master_gain: engine.master_gain(),
            voices,
        }
    }

    /// Loudest voice for `key`, if any is sounding.
    pub fn light(&self, key: NoteKey) -> Option<VoiceLight> {
        self.voices
            .iter()
            .flatten()
            .filter(|v| v.key == key)
            .copied()
            .max_by(|a, b| a.level.total_cmp(&b.level))
    }
}

impl Default for StatusUpdate {
    fn default() -> Self {
        Self {
            time: 0.0,
            voice_count: 0,
            held_count: 0,
            master_gain: 0.0,
            voices: [None; MAX_SHOWN_VOICES],
        }
    }
}

/// Settings the UI has asked the engine for.
#[derive(Clone, Copy, Debug)]
pub struct Controls {
    pub algorithm: AlgorithmKind,
    pub waveform: Waveform,
    pub lfo_active: bool,
    pub lfo_target: Option<ModTarget>,
    pub lfo_frequency: f32,
    pub lfo_depth: f32,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::Simple,
            waveform: Waveform::Sine,
            lfo_active: false,
            lfo_target: None,
            lfo_frequency: 5.0,
            lfo_depth: 0.3,
        }
    }
}
