#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::automation::{AutomationParam, FLOOR},
    MIN_TIME,
};

/*
ADSR Envelope Implementation
============================

The amplitude envelope every voice runs through. Instead of stepping a level
by a per-sample increment, the envelope schedules its stages on an
`AutomationParam` at note-on and note-off, then samples that timeline.

Vocabulary
----------

  start level   Where the attack begins. Never 0: an exponential curve
                cannot leave 0 (0 × anything = 0). Each algorithm picks its own
                (0.1 for the simple oscillator, 0.01 for the others).

  peak          Level reached at the end of the attack. Also per algorithm
                (0.5, 0.3 or 0.4) so stacked partials or modulated carriers
                don't clip.

  sustain       A RATIO of the peak (0.0 to 1.0). The decay target is
                max(sustain × peak, FLOOR).

  floor         0.001. The release target, and the lowest level any
                exponential segment may aim for.


The Shape: Exponential Segments
-------------------------------

  Level
   peak ┐    ╭╮
        │   ╱  ╲__
    S·p │  ╱      ‾‾‾‾‾‾‾‾╲
        │ ╱                ╲_
  start ┤╱                   ‾‾──___ floor
        └──────────────────────────→ Time
         Attack Decay Sustain Release

Each segment multiplies the level by a constant ratio per unit of time:

    level(t) = from × (to / from) ^ ((t - t0) / duration)

That is how we hear loudness change, and it avoids the corner a linear ramp
leaves in the gain curve at each stage boundary.


The Schedule
------------

note_on at t0:
    set        start            at t0
    exp ramp → peak             by t0 + attack
    exp ramp → max(S × peak, ε) by t0 + attack + decay

note_off at t1 (from ANY stage):
    cancel_and_hold at t1       freeze wherever we are on the curve
    exp ramp → floor            by t1 + release

Releasing mid-attack therefore starts from the level actually reached, not
from the peak or the sustain level, so there is no jump.


Stages From Time
----------------

The stage is a function of the query time and the scheduled boundaries:

    not triggered                     Idle
    released, t >= release end        Idle   (the voice may be freed)
    released                          Release
    t < t0 + attack                   Attack
    t < t0 + attack + decay           Decay
    otherwise                         Sustain

Durations at or below zero are clamped to MIN_TIME so no segment has zero
length (an infinite ramp rate).
*/

/// Attack/decay/release times in seconds and sustain as a ratio of peak.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    attack: f32,
    decay: f32,
    sustain: f32,
    release: f32,
}

impl Adsr {
    /// Out-of-range values are clamped: times to at least `MIN_TIME`,
    /// sustain to `[0, 1]`.
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack: clamp_time(attack),
            decay: clamp_time(decay),
            sustain: if sustain.is_nan() {
                0.0
            } else {
                sustain.clamp(0.0, 1.0)
            },
            release: clamp_time(release),
        }
    }

    pub fn attack(&self) -> f32 {
        self.attack
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    pub fn sustain(&self) -> f32 {
        self.sustain
    }

    pub fn release(&self) -> f32 {
        self.release
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::new(0.01, 0.1, 0.6, 0.2)
    }
}

fn clamp_time(seconds: f32) -> f32 {
    if seconds.is_nan() {
        MIN_TIME
    } else {
        seconds.max(MIN_TIME)
    }
}

/// Per-algorithm level targets for the envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    pub start_level: f32,
    pub peak: f32,
}

impl EnvelopeShape {
    pub const fn new(start_level: f32, peak: f32) -> Self {
        Self { start_level, peak }
    }
}

/// The current stage of the envelope state machine.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    shape: EnvelopeShape,
    gain: AutomationParam,

    triggered_at: Option<f64>,
    attack_end: f64,
    decay_end: f64,

    released_at: Option<f64>,
    release_end: f64,

    last_level: f32,
}

impl Envelope {
    pub fn new(shape: EnvelopeShape) -> Self {
        Self {
            shape,
            gain: AutomationParam::new(0.0),
            triggered_at: None,
            attack_end: 0.0,
            decay_end: 0.0,
            released_at: None,
            release_end: 0.0,
            last_level: 0.0,
        }
    }

    /// Gate high at `time`: schedule attack and decay from `adsr`.
    pub fn note_on(&mut self, time: f64, adsr: &Adsr) {
        let start = self.shape.start_level.max(FLOOR);
        let peak = self.shape.peak.max(FLOOR);

        self.gain = AutomationParam::new(0.0);
        self.gain.set_value_at(start, time);

        self.attack_end = time + adsr.attack() as f64;
        self.gain.exponential_ramp_to(peak, self.attack_end);

        self.decay_end = self.attack_end + adsr.decay() as f64;
        self.gain
            .exponential_ramp_to((adsr.sustain() * peak).max(FLOOR), self.decay_end);

        self.triggered_at = Some(time);
        self.released_at = None;
        self.release_end = 0.0;
        self.last_level = start;
    }

    /// Gate low at `time`: hold the current level and ramp it to the floor
    /// over `release` seconds. Ignored when idle or already releasing.
    pub fn note_off(&mut self, time: f64, release: f32) {
        let Some(triggered_at) = self.triggered_at else {
            return;
        };
        if self.released_at.is_some() {
            return;
        }

        let time = time.max(triggered_at);
        self.gain.cancel_and_hold(time);
        self.gain.prune(time);

        self.release_end = time + clamp_time(release) as f64;
        self.gain.exponential_ramp_to(FLOOR, self.release_end);
        self.released_at = Some(time);
    }

    /// Envelope level at `time` without touching state.
    pub fn level_at(&self, time: f64) -> f32 {
        match self.triggered_at {
            Some(t0) if time >= t0 => self.gain.value_at(time),
            _ => 0.0,
        }
    }

    /// Level at `time`, remembered as the last output.
    #[inline]
    pub fn next_level(&mut self, time: f64) -> f32 {
        self.last_level = self.level_at(time);
        self.last_level
    }

    /// Render levels for consecutive samples starting at `start_time`.
    pub fn render(&mut self, buffer: &mut [f32], start_time: f64, sample_rate: f32) {
        let dt = 1.0 / sample_rate as f64;
        for (i, level) in buffer.iter_mut().enumerate() {
            *level = self.next_level(start_time + i as f64 * dt);
        }
    }

    pub fn stage_at(&self, time: f64) -> EnvelopeState {
        let Some(t0) = self.triggered_at else {
            return EnvelopeState::Idle;
        };

        if self.released_at.is_some() {
            if time >= self.release_end {
                EnvelopeState::Idle
            } else {
                EnvelopeState::Release
            }
        } else if time < t0 {
            EnvelopeState::Idle
        } else if time < self.attack_end {
            EnvelopeState::Attack
        } else if time < self.decay_end {
            EnvelopeState::Decay
        } else {
            EnvelopeState::Sustain
        }
    }

    /// When the stage reported by `stage_at(time)` began.
    pub fn stage_entered_at(&self, time: f64) -> Option<f64> {
        let t0 = self.triggered_at?;
        match self.stage_at(time) {
            EnvelopeState::Idle => self.released_at.map(|_| self.release_end),
            EnvelopeState::Attack => Some(t0),
            EnvelopeState::Decay => Some(self.attack_end),
            EnvelopeState::Sustain => Some(self.decay_end),
            EnvelopeState::Release => self.released_at,
        }
    }

    /// True once a release has been scheduled and has run its course.
    pub fn is_finished(&self, time: f64) -> bool {
        self.released_at.is_some() && time >= self.release_end
    }

    pub fn is_released(&self) -> bool {
        self.released_at.is_some()
    }

    /// Time at which the release reaches the floor, once released.
    pub fn release_end(&self) -> Option<f64> {
        self.released_at.map(|_| self.release_end)
    }

    pub fn last_level(&self) -> f32 {
        self.last_level
    }

    pub fn shape(&self) -> EnvelopeShape {
        self.shape
    }

    pub fn reset(&mut self) {
        self.gain = AutomationParam::new(0.0);
        self.triggered_at = None;
        self.released_at = None;
        self.last_level = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;
    const SHAPE: EnvelopeShape = EnvelopeShape::new(0.01, 0.4);

    #[test]
    fn attack_reaches_peak() {
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &Adsr::new(0.01, 0.1, 0.7, 0.2));

        assert!((env.level_at(0.0) - 0.01).abs() < 1e-6);
        assert!((env.level_at(0.01) - 0.4).abs() < 1e-4);
        assert_eq!(env.stage_at(0.005), EnvelopeState::Attack);
        assert_eq!(env.stage_at(0.01), EnvelopeState::Decay);
    }

    #[test]
    fn sustain_holds_ratio_of_peak() {
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &Adsr::new(0.01, 0.05, 0.6, 0.2));

        assert_eq!(env.stage_at(0.2), EnvelopeState::Sustain);
        assert!((env.level_at(0.2) - 0.24).abs() < 1e-4);
        assert!((env.level_at(5.0) - 0.24).abs() < 1e-4);
    }

    #[test]
    fn zero_sustain_decays_to_floor() {
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &Adsr::new(0.01, 0.05, 0.0, 0.2));
        assert!((env.level_at(1.0) - FLOOR).abs() < 1e-6);
    }

    #[test]
    fn release_falls_to_floor_then_idle() {
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &Adsr::new(0.01, 0.05, 0.5, 0.03));
        env.note_off(0.5, 0.03);

        assert_eq!(env.stage_at(0.51), EnvelopeState::Release);
        assert!((env.level_at(0.5) - 0.2).abs() < 1e-4);
        assert!((env.level_at(0.53) - FLOOR).abs() < 1e-6);
        assert_eq!(env.stage_at(0.53), EnvelopeState::Idle);
        assert!(env.is_finished(0.53));
        assert!(!env.is_finished(0.52));
    }

    #[test]
    fn early_release_starts_from_current_level() {
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &Adsr::new(0.1, 0.1, 0.5, 0.2));

        let mid_attack = env.level_at(0.05);
        env.note_off(0.05, 0.2);

        assert!((env.level_at(0.05) - mid_attack).abs() < 1e-6);
        assert!(env.level_at(0.06) < mid_attack);
        assert_eq!(env.stage_entered_at(0.1), Some(0.05));
    }

    #[test]
    fn render_is_continuous_through_every_stage() {
        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &Adsr::new(0.05, 0.05, 0.5, 0.1));

        let mut held = vec![0.0; 300];
        env.render(&mut held, 0.0, SAMPLE_RATE);
        env.note_off(0.3, 0.1);
        let mut released = vec![0.0; 150];
        env.render(&mut released, 0.3, SAMPLE_RATE);

        let all: Vec<f32> = held.iter().chain(&released).copied().collect();
        for pair in all.windows(2) {
            assert!((pair[1] - pair[0]).abs() < 0.05, "jump {pair:?}");
        }
        assert!(env.last_level() <= FLOOR + 1e-6);
    }

    #[test]
    fn degenerate_times_are_clamped() {
        let adsr = Adsr::new(0.0, -1.0, 2.0, f32::NAN);
        assert_eq!(adsr.attack(), MIN_TIME);
        assert_eq!(adsr.decay(), MIN_TIME);
        assert_eq!(adsr.sustain(), 1.0);
        assert_eq!(adsr.release(), MIN_TIME);

        let mut env = Envelope::new(SHAPE);
        env.note_on(0.0, &adsr);
        assert!(env.level_at(0.001).is_finite());
    }

    #[test]
    fn note_off_without_note_on_is_ignored() {
        let mut env = Envelope::new(SHAPE);
        env.note_off(1.0, 0.2);
        assert_eq!(env.stage_at(1.0), EnvelopeState::Idle);
        assert!(!env.is_released());
        assert_eq!(env.level_at(1.0), 0.0);
    }
}
