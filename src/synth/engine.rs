use tracing::debug;

use crate::{
    dsp::{
        automation::AutomationParam,
        envelope::Adsr,
        lfo::{Lfo, ModTarget},
        oscillator::Waveform,
    },
    error::ConfigError,
    synth::{
        algorithm::RenderCtx,
        config::{AlgorithmKind, EngineConfig, SynthParams},
        message::{MessageReceiver, SynthMessage},
        poly::{gain_compensation, NoteOnOutcome, PolySynth},
        voice::{NoteKey, VoiceSnapshot},
    },
    MAX_BLOCK_SIZE,
};

#[cfg(feature = "rtrb")]
use crate::synth::controller::SynthController;

/// Gain before any note has been played.
const INITIAL_MASTER_GAIN: f32 = 0.5;

/// The audio-side synthesizer.
///
/// Owns the parameter set, the voice table, the master gain stage and the
/// LFO. Time is the engine's own sample counter. Commands from a
/// [`SynthController`] are applied at the start of each block, in the order
/// they were sent; the direct methods below do the same work immediately and
/// are meant for single-threaded hosts and tests.
pub struct SynthEngine {
    config: EngineConfig,
    params: SynthParams,
    poly: PolySynth,
    master_gain: AutomationParam,
    lfo: Lfo,
    lfo_buffer: Vec<f32>,
    voice_mod_buffer: Vec<f32>,
    frame_counter: u64,
    rx: Option<Box<dyn MessageReceiver + Send>>,
}

impl SynthEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            params: SynthParams::default(),
            poly: PolySynth::new(config.sample_rate, config.max_voices, config.settle_margin),
            master_gain: AutomationParam::new(INITIAL_MASTER_GAIN),
            lfo: Lfo::new(),
            lfo_buffer: vec![0.0; MAX_BLOCK_SIZE],
            voice_mod_buffer: vec![0.0; MAX_BLOCK_SIZE],
            frame_counter: 0,
            rx: None,
        })
    }

    /// Engine that drains `rx` at every block boundary.
    pub fn with_receiver<R>(config: EngineConfig, rx: R) -> Result<Self, ConfigError>
    where
        R: MessageReceiver + Send + 'static,
    {
        let mut engine = Self::new(config)?;
        engine.rx = Some(Box::new(rx));
        Ok(engine)
    }

    /// Engine plus the controller that feeds it, joined by a ring buffer of
    /// `config.queue_capacity` commands.
    #[cfg(feature = "rtrb")]
    pub fn with_controller(config: EngineConfig) -> Result<(Self, SynthController), ConfigError> {
        config.validate()?;
        let (tx, rx) = rtrb::RingBuffer::new(config.queue_capacity);
        let engine = Self::with_receiver(config, rx)?;
        Ok((engine, SynthController::new(tx, config.queue_capacity)))
    }

    /// Render the next `out.len()` samples.
    ///
    /// Pending commands are applied before each chunk of at most
    /// `MAX_BLOCK_SIZE` samples; finished voices are freed at the same point.
    pub fn render_block(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let now = self.now();
        self.drain_messages();
        self.poly.collect_removals(now);
        self.master_gain.prune(now);

        let len = out.len();
        let sample_rate = self.config.sample_rate;
        let lfo_out = &mut self.lfo_buffer[..len];
        self.lfo.render(lfo_out, sample_rate);

        // Voice targets get their own per-sample tap; master gain is applied below
        let mut ctx = RenderCtx::new(sample_rate, now);
        if let Some(target) = self.lfo.voice_target() {
            for (offset, lfo) in self.voice_mod_buffer[..len].iter_mut().zip(lfo_out.iter()) {
                *offset = self.lfo.tap(*lfo, target);
            }
            ctx = ctx.with_modulation(target, &self.voice_mod_buffer[..len]);
        }
        self.poly.render(out, &ctx);

        for (i, (sample, lfo)) in out.iter_mut().zip(lfo_out.iter()).enumerate() {
            let t = ctx.sample_time(i);
            let gain = self.master_gain.value_at(t) + self.lfo.tap(*lfo, ModTarget::MasterGain);
            *sample *= gain.clamp(0.0, 1.0);
        }

        self.frame_counter += len as u64;
    }

    fn drain_messages(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };
        while let Some(msg) = rx.pop() {
            self.handle_message(msg);
        }
        self.rx = Some(rx);
    }

    /// Apply one command now.
    pub fn handle_message(&mut self, msg: SynthMessage) {
        match msg {
            SynthMessage::NoteOn { key, frequency } => {
                self.note_on(key, frequency);
            }
            SynthMessage::NoteOff { key } => {
                self.note_off(key);
            }
            SynthMessage::AllNotesOff => self.all_notes_off(),
            SynthMessage::Silence => self.silence(),

            SynthMessage::SetAlgorithm(kind) => self.set_algorithm(kind),
            SynthMessage::SetWaveform(waveform) => self.set_waveform(waveform),
            SynthMessage::SetAdsr(adsr) => self.params.adsr = adsr,

            SynthMessage::SetPartialCount(count) => self.set_partial_count(count),
            SynthMessage::SetPartialAmplitude { index, amplitude } => {
                self.set_partial_amplitude(index, amplitude)
            }
            SynthMessage::SetPartialHarmonic { index, harmonic } => {
                self.set_partial_harmonic(index, harmonic)
            }
            SynthMessage::SetAdditiveWaveform(waveform) => self.set_additive_waveform(waveform),

            SynthMessage::SetFmRatio(ratio) => self.set_fm_ratio(ratio),
            SynthMessage::SetFmIndex(index) => self.set_fm_index(index),
            SynthMessage::SetFmCarrierWaveform(w) => self.set_fm_carrier_waveform(w),
            SynthMessage::SetFmModulatorWaveform(w) => self.set_fm_modulator_waveform(w),

            SynthMessage::SetAmFrequency(hz) => self.set_am_frequency(hz),
            SynthMessage::SetAmDepth(depth) => self.set_am_depth(depth),
            SynthMessage::SetAmPhaseOffset(degrees) => self.set_am_phase_offset(degrees),
            SynthMessage::SetAmCarrierWaveform(w) => self.set_am_carrier_waveform(w),
            SynthMessage::SetAmModulatorWaveform(w) => self.set_am_modulator_waveform(w),

            SynthMessage::LfoStart => self.lfo_start(),
            SynthMessage::LfoStop => self.lfo_stop(),
            SynthMessage::LfoSetFrequency(hz) => self.lfo_set_frequency(hz),
            SynthMessage::LfoSetDepth(depth) => self.lfo_set_depth(depth),
            SynthMessage::LfoSetWaveform(waveform) => self.lfo_set_waveform(waveform),
            SynthMessage::LfoConnect { target, range } => self.lfo_connect(target, range),
            SynthMessage::LfoDisconnect => self.lfo_disconnect(),
        }
    }

    // Notes

    /// Start a note for `key` at the current time.
    ///
    /// Every request other than a duplicate retargets the master gain to the
    /// compensation for the number of held keys.
    pub fn note_on(&mut self, key: NoteKey, frequency: f32) -> NoteOnOutcome {
        let now = self.now();
        let outcome = self.poly.note_on(key, frequency, &self.params, now);
        if outcome != NoteOnOutcome::Duplicate {
            let target = gain_compensation(self.poly.held_count());
            self.master_gain
                .set_target_at(target, now, self.config.gain_smoothing);
        }
        outcome
    }

    /// Release the held voice for `key`. Returns false if none is held.
    pub fn note_off(&mut self, key: NoteKey) -> bool {
        let now = self.now();
        self.poly.note_off(key, &self.params.adsr, now)
    }

    pub fn all_notes_off(&mut self) {
        let now = self.now();
        let released = self.poly.all_notes_off(&self.params.adsr, now);
        debug!(released, "all notes off");
    }

    /// Cut every voice without a release tail.
    pub fn silence(&mut self) {
        self.poly.silence();
        debug!("silenced");
    }

    // Parameters

    /// Algorithm for voices started from now on.
    pub fn set_algorithm(&mut self, kind: AlgorithmKind) {
        if self.params.algorithm != kind {
            debug!(from = self.params.algorithm.name(), to = kind.name(), "algorithm switched");
        }
        self.params.algorithm = kind;
    }

    /// Primary waveform of the selected algorithm.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.params.set_waveform(waveform);
    }

    pub fn set_adsr(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        self.params.adsr = Adsr::new(attack, decay, sustain, release);
    }

    pub fn set_partial_count(&mut self, count: usize) {
        self.params.additive.set_partial_count(count);
    }

    pub fn set_partial_amplitude(&mut self, index: usize, amplitude: f32) {
        self.params.additive.set_partial_amplitude(index, amplitude);
    }

    pub fn set_partial_harmonic(&mut self, index: usize, harmonic: f32) {
        self.params.additive.set_partial_harmonic(index, harmonic);
    }

    pub fn set_additive_waveform(&mut self, waveform: Waveform) {
        self.params.additive.set_waveform(waveform);
    }

    pub fn set_fm_ratio(&mut self, ratio: f32) {
        self.params.fm.set_ratio(ratio);
    }

    pub fn set_fm_index(&mut self, index: f32) {
        self.params.fm.set_index(index);
    }

    pub fn set_fm_carrier_waveform(&mut self, waveform: Waveform) {
        self.params.fm.set_carrier_waveform(waveform);
    }

    pub fn set_fm_modulator_waveform(&mut self, waveform: Waveform) {
        self.params.fm.set_modulator_waveform(waveform);
    }

    pub fn set_am_frequency(&mut self, hz: f32) {
        self.params.am.set_mod_frequency(hz);
    }

    pub fn set_am_depth(&mut self, depth: f32) {
        self.params.am.set_depth(depth);
    }

    pub fn set_am_phase_offset(&mut self, degrees: f32) {
        self.params.am.set_phase_offset(degrees);
    }

    pub fn set_am_carrier_waveform(&mut self, waveform: Waveform) {
        self.params.am.set_carrier_waveform(waveform);
    }

    pub fn set_am_modulator_waveform(&mut self, waveform: Waveform) {
        self.params.am.set_modulator_waveform(waveform);
    }

    // LFO

    pub fn lfo_start(&mut self) {
        self.lfo.start();
    }

    pub fn lfo_stop(&mut self) {
        self.lfo.stop();
    }

    pub fn lfo_set_frequency(&mut self, hz: f32) {
        self.lfo.set_frequency(hz);
    }

    pub fn lfo_set_depth(&mut self, depth: f32) {
        self.lfo.set_depth(depth);
    }

    pub fn lfo_set_waveform(&mut self, waveform: Waveform) {
        self.lfo.set_waveform(waveform);
    }

    pub fn lfo_connect(&mut self, target: ModTarget, range: f32) {
        debug!(?target, range, "lfo connected");
        self.lfo.connect(target, range);
    }

    pub fn lfo_disconnect(&mut self) {
        self.lfo.disconnect();
    }

    // Queries

    /// Seconds of audio rendered so far.
    pub fn now(&self) -> f64 {
        self.frame_counter as f64 / self.config.sample_rate as f64
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_counter
    }

    /// Smoothed master gain at the current time, without the LFO tap.
    pub fn master_gain(&self) -> f32 {
        self.master_gain.value_at(self.now())
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }

    pub fn voice_count(&self) -> usize {
        self.poly.voice_count()
    }

    pub fn held_count(&self) -> usize {
        self.poly.held_count()
    }

    pub fn is_held(&self, key: NoteKey) -> bool {
        self.poly.is_held(key)
    }

    pub fn voice_snapshots(&self) -> impl Iterator<Item = VoiceSnapshot> + '_ {
        self.poly.voice_snapshots(self.now())
    }
}
