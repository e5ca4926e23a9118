use crate::{
    dsp::envelope::{Adsr, EnvelopeState},
    synth::{
        algorithm::{RenderCtx, SynthVoice},
        config::AlgorithmKind,
    },
};

/// Identifies the physical key (or any caller-chosen id) that started a note.
pub type NoteKey = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,      // Available for allocation
    Active,    // Key held, envelope in attack/decay/sustain
    Releasing, // Key released, envelope in release phase
}

/// One slot of the voice table.
#[derive(Debug, Clone)]
pub struct Voice {
    key: NoteKey,
    state: VoiceState,
    started_at: f64,
    remove_at: f64,
    synth: Option<SynthVoice>,
}

/// Read-only view of a sounding voice, for visual feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSnapshot {
    pub key: NoteKey,
    pub kind: AlgorithmKind,
    pub frequency: f32,
    pub state: VoiceState,
    pub stage: EnvelopeState,
    pub level: f32,
}

impl Voice {
    pub fn new() -> Self {
        Self {
            key: 0,
            state: VoiceState::Free,
            started_at: 0.0,
            remove_at: f64::INFINITY,
            synth: None,
        }
    }

    pub fn start(&mut self, key: NoteKey, synth: SynthVoice, time: f64) {
        self.key = key;
        self.state = VoiceState::Active;
        self.started_at = time;
        self.remove_at = f64::INFINITY;
        self.synth = Some(synth);
    }

    /// Enter the release stage; the slot frees itself `settle` seconds after
    /// the release reaches the floor.
    pub fn release(&mut self, time: f64, adsr: &Adsr, settle: f32) {
        if self.state != VoiceState::Active {
            return;
        }
        if let Some(synth) = self.synth.as_mut() {
            synth.release(time, adsr);
            let release_end = synth
                .envelope()
                .release_end()
                .unwrap_or(time + adsr.release() as f64);
            self.remove_at = release_end + settle as f64;
        }
        self.state = VoiceState::Releasing;
    }

    /// Overwrite `out` with this voice's next block (silence when free).
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx<'_>) {
        match self.synth.as_mut() {
            Some(synth) => synth.render(out, ctx),
            None => out.fill(0.0),
        }
    }

    pub fn free(&mut self) {
        self.state = VoiceState::Free;
        self.key = 0;
        self.remove_at = f64::INFINITY;
        self.synth = None;
    }

    /// True once a released voice has finished ringing out.
    pub fn should_free(&self, time: f64) -> bool {
        self.state == VoiceState::Releasing && time >= self.remove_at
    }

    pub fn snapshot(&self, time: f64) -> Option<VoiceSnapshot> {
        let synth = self.synth.as_ref()?;
        let envelope = synth.envelope();
        Some(VoiceSnapshot {
            key: self.key,
            kind: synth.kind(),
            frequency: synth.frequency(),
            state: self.state,
            stage: envelope.stage_at(time),
            level: envelope.last_level(),
        })
    }

    pub fn is_free(&self) -> bool {
        self.state == VoiceState::Free
    }

    pub fn is_held(&self) -> bool {
        self.state == VoiceState::Active
    }

    pub fn key(&self) -> NoteKey {
        self.key
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    /// Removal deadline; infinite until released.
    pub fn remove_at(&self) -> f64 {
        self.remove_at
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }
}

impl Default for Voice {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::config::SynthParams;

    #[test]
    fn lifecycle() {
        let params = SynthParams::default();
        let mut voice = Voice::new();
        assert!(voice.is_free());

        voice.start(7, SynthVoice::play_note(440.0, &params, 0.0), 0.0);
        assert!(voice.is_held());
        assert_eq!(voice.key(), 7);
        assert!(!voice.should_free(100.0));

        voice.release(0.5, &Adsr::new(0.01, 0.1, 0.6, 0.2), 0.01);
        assert_eq!(voice.state(), VoiceState::Releasing);
        assert!((voice.remove_at() - 0.71).abs() < 1e-6);
        assert!(!voice.should_free(0.70));
        assert!(voice.should_free(0.711));

        voice.free();
        assert!(voice.is_free());
        assert!(voice.snapshot(1.0).is_none());
    }

    #[test]
    fn release_is_one_shot() {
        let params = SynthParams::default();
        let mut voice = Voice::new();
        voice.start(1, SynthVoice::play_note(220.0, &params, 0.0), 0.0);
        voice.release(0.5, &params.adsr, 0.01);
        let deadline = voice.remove_at();

        voice.release(0.9, &params.adsr, 0.01);
        assert_eq!(voice.remove_at(), deadline);
    }

    #[test]
    fn free_slot_renders_silence() {
        let mut voice = Voice::new();
        let mut out = vec![1.0; 16];
        voice.render(&mut out, &RenderCtx::new(48_000.0, 0.0));
        assert!(out.iter().all(|&s| s == 0.0));
    }
}
