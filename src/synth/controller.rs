use rtrb::Producer;

use crate::{
    dsp::{envelope::Adsr, lfo::ModTarget, oscillator::Waveform},
    error::ControlError,
    synth::{config::AlgorithmKind, message::SynthMessage, voice::NoteKey},
};

/// Control-thread handle to a [`SynthEngine`](crate::synth::engine::SynthEngine).
///
/// Every call enqueues one command; none block. When the audio thread falls
/// behind and the queue is full the command is dropped and
/// [`ControlError::QueueFull`] is returned.
pub struct SynthController {
    tx: Producer<SynthMessage>,
    capacity: usize,
}

impl SynthController {
    pub fn new(tx: Producer<SynthMessage>, capacity: usize) -> Self {
        Self { tx, capacity }
    }

    pub fn send(&mut self, msg: SynthMessage) -> Result<(), ControlError> {
        self.tx.push(msg).map_err(|_| ControlError::QueueFull {
            capacity: self.capacity,
        })
    }

    /// Commands waiting for the audio thread.
    pub fn pending(&self) -> usize {
        self.capacity - self.tx.slots()
    }

    pub fn note_on(&mut self, key: NoteKey, frequency: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::NoteOn { key, frequency })
    }

    pub fn note_off(&mut self, key: NoteKey) -> Result<(), ControlError> {
        self.send(SynthMessage::NoteOff { key })
    }

    pub fn all_notes_off(&mut self) -> Result<(), ControlError> {
        self.send(SynthMessage::AllNotesOff)
    }

    pub fn silence(&mut self) -> Result<(), ControlError> {
        self.send(SynthMessage::Silence)
    }

    pub fn set_algorithm(&mut self, kind: AlgorithmKind) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAlgorithm(kind))
    }

    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthMessage::SetWaveform(waveform))
    }

    /// Values are clamped here, before they cross to the audio thread.
    pub fn set_adsr(
        &mut self,
        attack: f32,
        decay: f32,
        sustain: f32,
        release: f32,
    ) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAdsr(Adsr::new(attack, decay, sustain, release)))
    }

    pub fn set_partial_count(&mut self, count: usize) -> Result<(), ControlError> {
        self.send(SynthMessage::SetPartialCount(count))
    }

    pub fn set_partial_amplitude(&mut self, index: usize, amplitude: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::SetPartialAmplitude { index, amplitude })
    }

    pub fn set_partial_harmonic(&mut self, index: usize, harmonic: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::SetPartialHarmonic { index, harmonic })
    }

    pub fn set_additive_waveform(&mut self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAdditiveWaveform(waveform))
    }

    pub fn set_fm_ratio(&mut self, ratio: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::SetFmRatio(ratio))
    }

    pub fn set_fm_index(&mut self, index: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::SetFmIndex(index))
    }

    pub fn set_fm_carrier_waveform(&mut self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthMessage::SetFmCarrierWaveform(waveform))
    }

    pub fn set_fm_modulator_waveform(&mut self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthMessage::SetFmModulatorWaveform(waveform))
    }

    pub fn set_am_frequency(&mut self, hz: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAmFrequency(hz))
    }

    pub fn set_am_depth(&mut self, depth: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAmDepth(depth))
    }

    pub fn set_am_phase_offset(&mut self, degrees: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAmPhaseOffset(degrees))
    }

    pub fn set_am_carrier_waveform(&mut self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAmCarrierWaveform(waveform))
    }

    pub fn set_am_modulator_waveform(&mut self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthMessage::SetAmModulatorWaveform(waveform))
    }

    pub fn lfo_start(&mut self) -> Result<(), ControlError> {
        self.send(SynthMessage::LfoStart)
    }

    pub fn lfo_stop(&mut self) -> Result<(), ControlError> {
        self.send(SynthMessage::LfoStop)
    }

    pub fn lfo_set_frequency(&mut self, hz: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::LfoSetFrequency(hz))
    }

    pub fn lfo_set_depth(&mut self, depth: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::LfoSetDepth(depth))
    }

    pub fn lfo_set_waveform(&mut self, waveform: Waveform) -> Result<(), ControlError> {
        self.send(SynthMessage::LfoSetWaveform(waveform))
    }

    pub fn lfo_connect(&mut self, target: ModTarget, range: f32) -> Result<(), ControlError> {
        self.send(SynthMessage::LfoConnect { target, range })
    }

    pub fn lfo_disconnect(&mut self) -> Result<(), ControlError> {
        self.send(SynthMessage::LfoDisconnect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{config::EngineConfig, engine::SynthEngine};

    #[test]
    fn commands_apply_at_next_block() {
        let (mut engine, mut controller) =
            SynthEngine::with_controller(EngineConfig::default()).unwrap();
        controller.set_algorithm(AlgorithmKind::Am).unwrap();
        controller.note_on(1, 440.0).unwrap();
        assert_eq!(controller.pending(), 2);
        assert_eq!(engine.voice_count(), 0);

        let mut buffer = vec![0.0; 256];
        engine.render_block(&mut buffer);
        assert_eq!(controller.pending(), 0);
        assert!(engine.is_held(1));
        assert_eq!(engine.params().algorithm, AlgorithmKind::Am);
        assert!(buffer.iter().any(|s| s.abs() > 0.0));
    }

    #[test]
    fn full_queue_reports_error() {
        let config = EngineConfig {
            queue_capacity: 2,
            ..EngineConfig::default()
        };
        let (_engine, mut controller) = SynthEngine::with_controller(config).unwrap();
        controller.lfo_start().unwrap();
        controller.lfo_stop().unwrap();
        assert_eq!(
            controller.lfo_start(),
            Err(ControlError::QueueFull { capacity: 2 })
        );
    }
}
