//! Saavy - audio setup and the keyboard event loop

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use rtrb::{Consumer, RingBuffer};
use tracing::{info, warn};

use saavy_synth::{
    dsp::lfo::{ModTarget, MAX_LFO_FREQUENCY, MIN_LFO_FREQUENCY},
    error::ControlError,
    synth::{AlgorithmKind, EngineConfig, NoteKey, SynthController, SynthEngine},
    MAX_BLOCK_SIZE,
};

use crate::keyboard;
use crate::ui::{self, Controls, StatusUpdate, View};

/// Samples kept for the oscilloscope
const SCOPE_SIZE: usize = 1024;

/// How long a note sounds when the terminal cannot report key releases.
/// Longer than typical key-repeat delays so a held key keeps sounding.
const GATE_TIME: Duration = Duration::from_millis(600);

const LFO_FREQUENCY_STEP: f32 = 0.5;
const LFO_DEPTH_STEP: f32 = 0.05;

/// Cycle order of LFO routes; `None` disconnects.
const LFO_TARGETS: [Option<ModTarget>; 5] = [
    None,
    Some(ModTarget::MasterGain),
    Some(ModTarget::Pitch),
    Some(ModTarget::FmIndex),
    Some(ModTarget::AmDepth),
];

/// Tap range used for each LFO target, in the target's units.
fn lfo_range(target: ModTarget) -> f32 {
    match target {
        ModTarget::MasterGain => 0.5,
        ModTarget::Pitch => 20.0,
        ModTarget::FmIndex => 200.0,
        ModTarget::AmDepth => 0.5,
    }
}

fn next_algorithm(kind: AlgorithmKind) -> AlgorithmKind {
    let idx = AlgorithmKind::ALL
        .iter()
        .position(|&k| k == kind)
        .unwrap_or(0);
    AlgorithmKind::ALL[(idx + 1) % AlgorithmKind::ALL.len()]
}

/// Running audio output; dropping it stops the stream.
pub struct Audio {
    _stream: cpal::Stream,
    pub sample_rate: f32,
    pub controller: SynthController,
    pub scope_rx: Consumer<f32>,
    pub status_rx: Consumer<StatusUpdate>,
}

impl Audio {
    /// Open the default output device and start rendering.
    pub fn start() -> EyreResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!(
            host = ?host.id(),
            sample_rate,
            channels,
            "audio output"
        );

        let (mut engine, controller) =
            SynthEngine::with_controller(EngineConfig::with_sample_rate(sample_rate))
                .wrap_err("failed to build synth engine")?;

        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(sample_rate as usize / 4);
        let (mut status_tx, status_rx) = RingBuffer::<StatusUpdate>::new(16);
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames];
                    engine.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        let frame = out_off + i * channels;
                        data[frame..frame + channels].fill(s);
                        let _ = scope_tx.push(s);
                    }

                    frames_written += frames;
                }

                let _ = status_tx.push(StatusUpdate::capture(&engine));
            },
            |err| tracing::error!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate,
            controller,
            scope_rx,
            status_rx,
        })
    }
}

pub struct App {
    audio: Audio,
    controls: Controls,
    status: StatusUpdate,
    scope: VecDeque<f32>,
    /// Report releases (keyboard enhancement) instead of timing out notes.
    key_release: bool,
    /// Release deadlines for notes played without key-release events.
    gates: Vec<(NoteKey, Instant)>,
    should_quit: bool,
}

impl App {
    pub fn new(audio: Audio, key_release: bool) -> Self {
        Self {
            audio,
            controls: Controls::default(),
            status: StatusUpdate::default(),
            scope: VecDeque::with_capacity(SCOPE_SIZE),
            key_release,
            gates: Vec::new(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.expire_gates();

            terminal.draw(|frame| {
                let view = View {
                    controls: &self.controls,
                    status: &self.status,
                    scope: &self.scope,
                    sample_rate: self.audio.sample_rate,
                    key_release: self.key_release,
                };
                ui::draw(frame, &view)
            })?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }
        }

        self.send(|c| c.all_notes_off());
        Ok(())
    }

    fn poll_audio(&mut self) {
        while let Ok(sample) = self.audio.scope_rx.pop() {
            if self.scope.len() == SCOPE_SIZE {
                self.scope.pop_front();
            }
            self.scope.push_back(sample);
        }

        // Keep only the latest status
        while let Ok(status) = self.audio.status_rx.pop() {
            self.status = status;
        }
    }

    fn expire_gates(&mut self) {
        let now = Instant::now();
        let mut i = 0;
        while i < self.gates.len() {
            let (key, deadline) = self.gates[i];
            if now >= deadline {
                self.gates.swap_remove(i);
                self.send(|c| c.note_off(key));
            } else {
                i += 1;
            }
        }
    }

    /// Hand a command to the audio thread, logging if the queue is full.
    fn send(&mut self, command: impl FnOnce(&mut SynthController) -> Result<(), ControlError>) {
        if let Err(err) = command(&mut self.audio.controller) {
            warn!(%err, "control command dropped");
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Press => self.handle_press(key),
            KeyEventKind::Release => {
                if let KeyCode::Char(c) = key.code {
                    if keyboard::frequency(c).is_some() {
                        let note = keyboard::note_key(c);
                        self.send(|ctl| ctl.note_off(note));
                    }
                }
            }
            KeyEventKind::Repeat => {}
        }
    }

    fn handle_press(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char(c) => {
                if let Some(frequency) = keyboard::frequency(c) {
                    self.play(keyboard::note_key(c), frequency);
                } else if c == ' ' {
                    self.gates.clear();
                    self.send(|ctl| ctl.all_notes_off());
                }
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Backspace => {
                self.gates.clear();
                self.send(|ctl| ctl.silence());
            }
            KeyCode::Tab => {
                let kind = next_algorithm(self.controls.algorithm);
                self.controls.algorithm = kind;
                self.send(|ctl| ctl.set_algorithm(kind));
                // The waveform setter targets the selected algorithm
                let waveform = self.controls.waveform;
                self.send(|ctl| ctl.set_waveform(waveform));
            }
            KeyCode::F(1) => {
                let waveform = self.controls.waveform.next();
                self.controls.waveform = waveform;
                self.send(|ctl| ctl.set_waveform(waveform));
            }
            KeyCode::F(2) => {
                if self.controls.lfo_active {
                    self.controls.lfo_active = false;
                    self.controls.lfo_target = None;
                    self.send(|ctl| ctl.lfo_stop());
                } else {
                    self.controls.lfo_active = true;
                    self.send(|ctl| ctl.lfo_start());
                }
            }
            KeyCode::F(3) => self.cycle_lfo_target(),
            KeyCode::Up | KeyCode::Down => {
                let step = if key.code == KeyCode::Up {
                    LFO_FREQUENCY_STEP
                } else {
                    -LFO_FREQUENCY_STEP
                };
                let hz = (self.controls.lfo_frequency + step)
                    .clamp(MIN_LFO_FREQUENCY, MAX_LFO_FREQUENCY);
                self.controls.lfo_frequency = hz;
                self.send(|ctl| ctl.lfo_set_frequency(hz));
            }
            KeyCode::Left | KeyCode::Right => {
                let step = if key.code == KeyCode::Right {
                    LFO_DEPTH_STEP
                } else {
                    -LFO_DEPTH_STEP
                };
                let depth = (self.controls.lfo_depth + step).clamp(0.0, 1.0);
                self.controls.lfo_depth = depth;
                self.send(|ctl| ctl.lfo_set_depth(depth));
            }
            _ => {}
        }
    }

    fn play(&mut self, note: NoteKey, frequency: f32) {
        self.send(|ctl| ctl.note_on(note, frequency));
        if self.key_release {
            return;
        }

        // Key repeat refreshes the gate instead of retriggering
        let deadline = Instant::now() + GATE_TIME;
        match self.gates.iter_mut().find(|(k, _)| *k == note) {
            Some((_, d)) => *d = deadline,
            None => self.gates.push((note, deadline)),
        }
    }

    fn cycle_lfo_target(&mut self) {
        let idx = LFO_TARGETS
            .iter()
            .position(|&t| t == self.controls.lfo_target)
            .unwrap_or(0);
        let target = LFO_TARGETS[(idx + 1) % LFO_TARGETS.len()];
        self.controls.lfo_target = target;

        match target {
            Some(target) => {
                // Connecting starts the LFO
                self.controls.lfo_active = true;
                self.send(|ctl| ctl.lfo_connect(target, lfo_range(target)));
            }
            None => self.send(|ctl| ctl.lfo_disconnect()),
        }
    }
}
