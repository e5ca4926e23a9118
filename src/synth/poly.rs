use tracing::{debug, trace, warn};

use crate::{
    dsp::envelope::Adsr,
    synth::{
        algorithm::{RenderCtx, SynthVoice},
        config::SynthParams,
        voice::{NoteKey, Voice, VoiceSnapshot, VoiceState},
    },
    MAX_BLOCK_SIZE,
};

/// Master gain for `held` simultaneously held notes.
///
/// Keeps the summed output of several voices from clipping. Zero held notes
/// reads the same as one.
///
/// ```
/// use saavy_synth::synth::poly::gain_compensation;
/// assert_eq!(gain_compensation(4), 0.1);
/// ```
pub fn gain_compensation(held: usize) -> f32 {
    (0.4 / held.max(1) as f32).min(0.5)
}

/// What `note_on` did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOnOutcome {
    /// A free slot now plays the note.
    Started,
    /// The oldest releasing voice was cut to make room.
    Stolen,
    /// The key already has a held voice.
    Duplicate,
    /// Frequency not finite, not positive, or at/above Nyquist.
    Rejected,
    /// Every slot holds a key; the note was dropped.
    NoFreeVoice,
}

impl NoteOnOutcome {
    pub fn created_voice(self) -> bool {
        matches!(self, NoteOnOutcome::Started | NoteOnOutcome::Stolen)
    }
}

/// Fixed-size voice table.
///
/// Slots are allocated once; notes move in and out of them at block
/// boundaries. A key is "held" from note-on until note-off. After note-off
/// the voice keeps ringing in its slot but no longer owns the key, so the
/// same key can start a fresh voice while the old tail fades.
pub struct PolySynth {
    voices: Vec<Voice>,
    sample_rate: f32,
    settle_margin: f32,
    scratch: Vec<f32>,
}

impl PolySynth {
    pub fn new(sample_rate: f32, max_voices: usize, settle_margin: f32) -> Self {
        Self {
            voices: (0..max_voices).map(|_| Voice::new()).collect(),
            sample_rate,
            settle_margin,
            scratch: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn note_on(
        &mut self,
        key: NoteKey,
        frequency: f32,
        params: &SynthParams,
        time: f64,
    ) -> NoteOnOutcome {
        if self.is_held(key) {
            trace!(key, "note already held, ignoring");
            return NoteOnOutcome::Duplicate;
        }

        let nyquist = self.nyquist();
        if !frequency.is_finite() || frequency <= 0.0 || frequency >= nyquist {
            warn!(
                key,
                frequency,
                nyquist,
                "note frequency outside (0, nyquist), not playing"
            );
            return NoteOnOutcome::Rejected;
        }

        let (idx, outcome) = match self.allocate_slot() {
            Some(slot) => slot,
            None => {
                warn!(key, voices = self.voices.len(), "all voices held, dropping note");
                return NoteOnOutcome::NoFreeVoice;
            }
        };

        if outcome == NoteOnOutcome::Stolen {
            debug!(
                key,
                stolen = self.voices[idx].key(),
                "stealing oldest releasing voice"
            );
        }

        let synth = SynthVoice::play_note(frequency, params, time);
        debug!(key, frequency, algorithm = params.algorithm.name(), slot = idx, "voice started");
        self.voices[idx].start(key, synth, time);
        outcome
    }

    /// Release the held voice for `key`. Returns false when nothing is held.
    pub fn note_off(&mut self, key: NoteKey, adsr: &Adsr, time: f64) -> bool {
        let settle = self.settle_margin;
        match self.voices.iter_mut().find(|v| v.is_held() && v.key() == key) {
            Some(voice) => {
                voice.release(time, adsr, settle);
                debug!(key, remove_at = voice.remove_at(), "voice released");
                true
            }
            None => false,
        }
    }

    /// Release every held voice. Returns how many were released.
    pub fn all_notes_off(&mut self, adsr: &Adsr, time: f64) -> usize {
        let settle = self.settle_margin;
        let mut released = 0;
        for voice in self.voices.iter_mut().filter(|v| v.is_held()) {
            voice.release(time, adsr, settle);
            released += 1;
        }
        released
    }

    /// Drop every voice immediately, without a release tail.
    pub fn silence(&mut self) {
        for voice in &mut self.voices {
            voice.free();
        }
    }

    /// Free slots whose release tail has finished. Returns how many.
    pub fn collect_removals(&mut self, time: f64) -> usize {
        let mut removed = 0;
        for voice in self.voices.iter_mut().filter(|v| v.should_free(time)) {
            trace!(key = voice.key(), "voice removed");
            voice.free();
            removed += 1;
        }
        removed
    }

    /// Sum all sounding voices into `out` (overwritten).
    pub fn render(&mut self, out: &mut [f32], ctx: &RenderCtx<'_>) {
        out.fill(0.0);

        for (c, chunk) in out.chunks_mut(MAX_BLOCK_SIZE).enumerate() {
            let chunk_ctx = ctx.sub_block(c * MAX_BLOCK_SIZE, chunk.len());
            let scratch = &mut self.scratch[..chunk.len()];

            for voice in self.voices.iter_mut().filter(|v| !v.is_free()) {
                voice.render(scratch, &chunk_ctx);
                for (o, v) in chunk.iter_mut().zip(scratch.iter()) {
                    *o += v;
                }
            }
        }
    }

    pub fn voice_snapshots(&self, time: f64) -> impl Iterator<Item = VoiceSnapshot> + '_ {
        self.voices.iter().filter_map(move |v| v.snapshot(time))
    }

    /// Voices in the table, held or releasing.
    pub fn voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    pub fn held_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_held()).count()
    }

    pub fn is_held(&self, key: NoteKey) -> bool {
        self.voices.iter().any(|v| v.is_held() && v.key() == key)
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    fn allocate_slot(&self) -> Option<(usize, NoteOnOutcome)> {
        // First pass: find free voice index
        if let Some(idx) = self.voices.iter().position(|v| v.is_free()) {
            return Some((idx, NoteOnOutcome::Started));
        }

        // Second pass: steal oldest releasing voice
        self.voices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.state() == VoiceState::Releasing)
            .min_by(|(_, a), (_, b)| a.started_at().total_cmp(&b.started_at()))
            .map(|(idx, _)| (idx, NoteOnOutcome::Stolen))
    }
}
