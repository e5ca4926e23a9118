//! Low Frequency Oscillator (LFO) and its single-target modulation route.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::oscillator::{OscillatorBlock, Waveform};

/*
Low Frequency Oscillators
=========================

An LFO is an oscillator running below the audible range. It produces no
sound of its own; its output is added to some other parameter so that
parameter moves over time.

Vocabulary
----------

  control-rate    Frequencies below ~20 Hz. The LFO here is limited to
                  0.1 - 20 Hz.

  depth           Output scale of the LFO itself (0.0 to 1.0):

                      lfo(t) = depth × waveform(phase(t))

  range           Scale of the tap into the target, in the target's units:

                      target(t) = target_automation(t) + lfo(t) × range

                  With depth 0.3 and range 0.5 on master gain, the gain
                  swings ±0.15 around wherever its own automation has it.

  bipolar         Output swings negative and positive (-1.0 to +1.0). LFO
                  output is bipolar.

  unipolar        Output only positive (0.0 to 1.0). The AM modulator maps its
                  output to unipolar so its gain never dips below 1 - depth.


Typical Rates
-------------

    0.1 - 0.5 Hz    Slow sweeps
    0.5 - 2 Hz      Classic tremolo
    2 - 7 Hz        Vibrato sweet spot
    7 - 20 Hz       Fast tremolo, "helicopter" effect


Routing
-------

There is exactly one LFO and at most one connection. Connecting to a new
target replaces the old route. The LFO is free-running: its phase is not
reset on note-on, only when it is stopped.

  MasterGain   Added per sample to the smoothed master gain (then clamped
               to [0, 1]).
  Pitch        Hz added to every voice's base frequency.
  FmIndex      Hz added to the FM modulation index.
  AmDepth      Added to the AM depth (then clamped to [0, 1]).

Every target follows the LFO per sample, so the modulation is the same
whatever block size the host renders with.
*/

pub const MIN_LFO_FREQUENCY: f32 = 0.1;
pub const MAX_LFO_FREQUENCY: f32 = 20.0;

/// Parameters the LFO can be routed to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModTarget {
    MasterGain,
    Pitch,
    FmIndex,
    AmDepth,
}

impl ModTarget {
    /// True for targets read inside each voice rather than on the mix.
    pub fn is_voice_param(self) -> bool {
        !matches!(self, ModTarget::MasterGain)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LfoConnection {
    pub target: ModTarget,
    pub range: f32,
}

#[derive(Debug, Clone)]
pub struct Lfo {
    osc: OscillatorBlock,
    frequency: f32,
    depth: f32,
    active: bool,
    connection: Option<LfoConnection>,
}

impl Lfo {
    pub fn new() -> Self {
        Self {
            osc: OscillatorBlock::new(Waveform::Sine),
            frequency: 5.0,
            depth: 0.3,
            active: false,
            connection: None,
        }
    }

    pub fn set_frequency(&mut self, hz: f32) {
        if hz.is_nan() {
            return;
        }
        self.frequency = hz.clamp(MIN_LFO_FREQUENCY, MAX_LFO_FREQUENCY);
    }

    pub fn set_depth(&mut self, depth: f32) {
        if depth.is_nan() {
            return;
        }
        self.depth = depth.clamp(0.0, 1.0);
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.osc.set_waveform(waveform);
    }

    /// Start oscillating. No-op when already running.
    pub fn start(&mut self) {
        if self.active {
            return;
        }
        self.osc.reset();
        self.active = true;
    }

    /// Stop oscillating and drop the route. No-op when already stopped.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.osc.reset();
        self.connection = None;
    }

    /// Route `output × range` into `target`, starting the LFO if needed.
    pub fn connect(&mut self, target: ModTarget, range: f32) {
        self.start();
        let range = if range.is_finite() { range } else { 0.0 };
        self.connection = Some(LfoConnection { target, range });
    }

    pub fn disconnect(&mut self) {
        self.connection = None;
    }

    /// Next output sample; 0 while stopped.
    #[inline]
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if !self.active {
            return 0.0;
        }
        self.depth * self.osc.next_sample(self.frequency, sample_rate)
    }

    pub fn render(&mut self, out: &mut [f32], sample_rate: f32) {
        for s in out.iter_mut() {
            *s = self.next_sample(sample_rate);
        }
    }

    /// Scaled tap for `target`, or 0 when the LFO is routed elsewhere.
    #[inline]
    pub fn tap(&self, output: f32, target: ModTarget) -> f32 {
        match self.connection {
            Some(c) if self.active && c.target == target => output * c.range,
            _ => 0.0,
        }
    }

    /// Voice parameter the LFO currently drives, if any.
    pub fn voice_target(&self) -> Option<ModTarget> {
        self.connection
            .map(|c| c.target)
            .filter(|t| self.active && t.is_voice_param())
    }

    pub fn connection(&self) -> Option<LfoConnection> {
        self.connection
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn waveform(&self) -> Waveform {
        self.osc.waveform()
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert bipolar signal (-1.0 to +1.0) to unipolar (0.0 to 1.0).
#[inline]
pub fn bipolar_to_unipolar(bipolar: f32) -> f32 {
    (bipolar + 1.0) * 0.5
}
