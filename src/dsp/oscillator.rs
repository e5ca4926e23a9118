#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::{PI, TAU};

/*
Waveform Generation
===================

Every sound source in the engine (carriers, modulators, partials, the LFO)
is a phase accumulator feeding one of four waveform shapes. This module
holds both halves: the pure shape functions and the accumulator.

Vocabulary
----------

  phase       Position inside one cycle, in radians. 0 is the start of the
              cycle, 2π is the start of the next one.

  increment   How far the phase moves per sample:

                  increment = 2π × frequency / sample_rate

              At 440 Hz and 48 kHz the phase advances ~0.0576 rad per
              sample and wraps every ~109 samples.

  wrap        Keeping phase inside [0, 2π). Phase is only meaningful modulo
              one cycle, and small numbers keep f32 precision high.


The Shapes (one period)
-----------------------

  SINE        sin(phase)

               1 ┤  ╭─╮
                 │ ╱   ╲
               0 ┼╱─────╲─────╱
                 │       ╲   ╱
              -1 ┤        ╰─╯

  SQUARE      sign of sin(phase): +1 on the first half, -1 on the second.

  SAWTOOTH    A straight ramp from -1 to +1 across the period, then a jump.

                  saw = phase/π - 1

  TRIANGLE    -1 at phase 0, +1 at π, back to -1 at 2π.

                  tri = 2 × |saw| - 1   (with the sign flipped so it starts low)

All four stay inside [-1, 1] for any finite phase, including negative
phases (we wrap with rem_euclid before evaluating the shape).


Why Not Band-Limit?
-------------------

Naive square and saw waves alias at high pitches. The engine instead rejects
notes at or above Nyquist and skips additive partials above it; the shapes
themselves stay exact so renders are reproducible sample for sample.
*/

/// Periodic shapes shared by oscillators, modulators and the LFO.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Next waveform in `ALL` order, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&w| w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

/// Wrap any finite phase into `[0, 2π)`.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Unit-amplitude sample of `kind` at `phase` radians.
#[inline]
pub fn sample(phase: f32, kind: Waveform) -> f32 {
    let p = wrap_phase(phase);
    match kind {
        Waveform::Sine => p.sin(),
        Waveform::Square => {
            if p < PI {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Sawtooth => p / PI - 1.0,
        Waveform::Triangle => {
            if p < PI {
                2.0 * p / PI - 1.0
            } else {
                3.0 - 2.0 * p / PI
            }
        }
    }
}

/// Phase accumulator for one oscillator.
///
/// Frequency is passed per sample so callers can modulate it (FM, vibrato)
/// without touching oscillator state.
#[derive(Debug, Clone, Copy)]
pub struct OscillatorBlock {
    waveform: Waveform,
    phase: f32,
}

impl OscillatorBlock {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Output at the current phase, then advance by one sample at `frequency`.
    #[inline]
    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let out = sample(self.phase, self.waveform);
        self.advance(frequency, sample_rate);
        out
    }

    #[inline]
    pub fn advance(&mut self, frequency: f32, sample_rate: f32) {
        self.phase = wrap_phase(self.phase + TAU * frequency / sample_rate);
    }

    /// Fill `out` with a fixed-frequency run of samples.
    pub fn render(&mut self, out: &mut [f32], frequency: f32, sample_rate: f32) {
        for s in out.iter_mut() {
            *s = self.next_sample(frequency, sample_rate);
        }
    }
}
