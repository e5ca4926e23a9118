//! Engine construction settings and the live synthesis parameter set.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{envelope::Adsr, oscillator::Waveform},
    error::ConfigError,
};

pub const MAX_PARTIALS: usize = 8;

/// Which synthesis algorithm builds new voices.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmKind {
    #[default]
    Simple,
    Additive,
    Fm,
    Am,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::Simple,
        AlgorithmKind::Additive,
        AlgorithmKind::Fm,
        AlgorithmKind::Am,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::Simple => "simple",
            AlgorithmKind::Additive => "additive",
            AlgorithmKind::Fm => "fm",
            AlgorithmKind::Am => "am",
        }
    }
}

/// Clamp helper: NaN keeps the current value, everything else is pinned to
/// `[min, max]`.
fn clamp_or(value: f32, current: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        current
    } else {
        value.clamp(min, max)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimpleConfig {
    pub waveform: Waveform,
}

/// One harmonic component of an additive voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partial {
    pub harmonic: f32,
    pub amplitude: f32,
}

impl Partial {
    /// Default partial for 1-based harmonic `n`: amplitude falls off as 1/n.
    pub fn harmonic_default(n: usize) -> Self {
        let n = n.max(1) as f32;
        Self {
            harmonic: n,
            amplitude: 1.0 / n,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdditiveConfig {
    partial_count: usize,
    /// Entries `[..populated]` have been configured; the rest are filled with
    /// defaults the first time the count grows over them.
    populated: usize,
    partials: [Partial; MAX_PARTIALS],
    waveform: Waveform,
}

impl AdditiveConfig {
    pub const MIN_HARMONIC: f32 = 0.5;
    pub const MAX_HARMONIC: f32 = 16.0;

    pub fn set_partial_count(&mut self, count: usize) {
        self.partial_count = count.clamp(1, MAX_PARTIALS);
        while self.populated < self.partial_count {
            self.partials[self.populated] = Partial::harmonic_default(self.populated + 1);
            self.populated += 1;
        }
    }

    /// Ignored for partials that have never been populated.
    pub fn set_partial_amplitude(&mut self, index: usize, amplitude: f32) {
        if index < self.populated {
            let p = &mut self.partials[index];
            p.amplitude = clamp_or(amplitude, p.amplitude, 0.0, 1.0);
        }
    }

    /// Ignored for partials that have never been populated.
    pub fn set_partial_harmonic(&mut self, index: usize, harmonic: f32) {
        if index < self.populated {
            let p = &mut self.partials[index];
            p.harmonic = clamp_or(harmonic, p.harmonic, Self::MIN_HARMONIC, Self::MAX_HARMONIC);
        }
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn partial_count(&self) -> usize {
        self.partial_count
    }

    /// The partials that sound, in order.
    pub fn partials(&self) -> &[Partial] {
        &self.partials[..self.partial_count]
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}

impl Default for AdditiveConfig {
    fn default() -> Self {
        let mut partials = [Partial::harmonic_default(1); MAX_PARTIALS];
        for (i, amplitude) in [1.0, 0.5, 0.3, 0.2, 0.1].into_iter().enumerate() {
            partials[i] = Partial {
                harmonic: (i + 1) as f32,
                amplitude,
            };
        }
        Self {
            partial_count: 5,
            populated: 5,
            partials,
            waveform: Waveform::Sine,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmConfig {
    ratio: f32,
    index: f32,
    carrier_waveform: Waveform,
    modulator_waveform: Waveform,
}

impl FmConfig {
    pub const MIN_RATIO: f32 = 0.1;
    pub const MAX_RATIO: f32 = 10.0;
    pub const MAX_INDEX: f32 = 1000.0;

    pub fn set_ratio(&mut self, ratio: f32) {
        self.ratio = clamp_or(ratio, self.ratio, Self::MIN_RATIO, Self::MAX_RATIO);
    }

    /// Peak carrier deviation in Hz.
    pub fn set_index(&mut self, index: f32) {
        self.index = clamp_or(index, self.index, 0.0, Self::MAX_INDEX);
    }

    pub fn set_carrier_waveform(&mut self, waveform: Waveform) {
        self.carrier_waveform = waveform;
    }

    pub fn set_modulator_waveform(&mut self, waveform: Waveform) {
        self.modulator_waveform = waveform;
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn index(&self) -> f32 {
        self.index
    }

    pub fn carrier_waveform(&self) -> Waveform {
        self.carrier_waveform
    }

    pub fn modulator_waveform(&self) -> Waveform {
        self.modulator_waveform
    }
}

impl Default for FmConfig {
    fn default() -> Self {
        Self {
            ratio: 2.0,
            index: 100.0,
            carrier_waveform: Waveform::Sine,
            modulator_waveform: Waveform::Sine,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmConfig {
    mod_frequency: f32,
    depth: f32,
    phase_offset: f32,
    carrier_waveform: Waveform,
    modulator_waveform: Waveform,
}

impl AmConfig {
    pub const MIN_MOD_FREQUENCY: f32 = 0.1;
    pub const MAX_MOD_FREQUENCY: f32 = 500.0;

    pub fn set_mod_frequency(&mut self, hz: f32) {
        self.mod_frequency = clamp_or(
            hz,
            self.mod_frequency,
            Self::MIN_MOD_FREQUENCY,
            Self::MAX_MOD_FREQUENCY,
        );
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = clamp_or(depth, self.depth, 0.0, 1.0);
    }

    /// Degrees, wrapped into `[0, 360)`.
    pub fn set_phase_offset(&mut self, degrees: f32) {
        if degrees.is_finite() {
            let wrapped = degrees.rem_euclid(360.0);
            self.phase_offset = if wrapped >= 360.0 { 0.0 } else { wrapped };
        }
    }

    pub fn set_carrier_waveform(&mut self, waveform: Waveform) {
        self.carrier_waveform = waveform;
    }

    pub fn set_modulator_waveform(&mut self, waveform: Waveform) {
        self.modulator_waveform = waveform;
    }

    pub fn mod_frequency(&self) -> f32 {
        self.mod_frequency
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn phase_offset(&self) -> f32 {
        self.phase_offset
    }

    /// How long the modulator waits after the carrier starts, in seconds.
    pub fn modulator_delay(&self) -> f32 {
        (self.phase_offset / 360.0) / self.mod_frequency
    }

    pub fn carrier_waveform(&self) -> Waveform {
        self.carrier_waveform
    }

    pub fn modulator_waveform(&self) -> Waveform {
        self.modulator_waveform
    }
}

impl Default for AmConfig {
    fn default() -> Self {
        Self {
            mod_frequency: 4.0,
            depth: 0.8,
            phase_offset: 0.0,
            carrier_waveform: Waveform::Sine,
            modulator_waveform: Waveform::Sine,
        }
    }
}

/// Everything a new voice reads at note-on.
///
/// Owned by the engine and changed only through its setters. Voices copy
/// what they need when they start, so edits never reach a sounding voice.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SynthParams {
    pub algorithm: AlgorithmKind,
    pub simple: SimpleConfig,
    pub additive: AdditiveConfig,
    pub fm: FmConfig,
    pub am: AmConfig,
    pub adsr: Adsr,
}

impl SynthParams {
    /// Set the primary waveform of the selected algorithm (the oscillator,
    /// the partials, or the carrier).
    pub fn set_waveform(&mut self, waveform: Waveform) {
        match self.algorithm {
            AlgorithmKind::Simple => self.simple.waveform = waveform,
            AlgorithmKind::Additive => self.additive.set_waveform(waveform),
            AlgorithmKind::Fm => self.fm.set_carrier_waveform(waveform),
            AlgorithmKind::Am => self.am.set_carrier_waveform(waveform),
        }
    }

    /// Primary waveform of the selected algorithm.
    pub fn waveform(&self) -> Waveform {
        match self.algorithm {
            AlgorithmKind::Simple => self.simple.waveform,
            AlgorithmKind::Additive => self.additive.waveform(),
            AlgorithmKind::Fm => self.fm.carrier_waveform(),
            AlgorithmKind::Am => self.am.carrier_waveform(),
        }
    }
}

/// Fixed settings chosen when the engine is built.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz; half of it is the Nyquist limit for notes.
    pub sample_rate: f32,
    /// Voice slots allocated up front.
    pub max_voices: usize,
    /// Pending control commands the queue can hold.
    pub queue_capacity: usize,
    /// Seconds a released voice lingers after its release ends.
    pub settle_margin: f32,
    /// Time constant (seconds) of the master gain smoothing.
    pub gain_smoothing: f32,
}

impl EngineConfig {
    pub fn with_sample_rate(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate * 0.5
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_voices == 0 {
            return Err(ConfigError::NoVoices);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::EmptyQueue);
        }
        for (name, value) in [
            ("settle margin", self.settle_margin),
            ("gain smoothing", self.gain_smoothing),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 32,
            queue_capacity: 256,
            settle_margin: 0.01,
            gain_smoothing: 0.02,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additive_defaults() {
        let cfg = AdditiveConfig::default();
        let amps: Vec<f32> = cfg.partials().iter().map(|p| p.amplitude).collect();
        assert_eq!(amps, vec![1.0, 0.5, 0.3, 0.2, 0.1]);
        assert_eq!(cfg.partials()[4].harmonic, 5.0);
    }

    #[test]
    fn growing_partials_populates_one_over_n() {
        let mut cfg = AdditiveConfig::default();
        cfg.set_partial_count(8);
        assert_eq!(cfg.partial_count(), 8);
        assert_eq!(cfg.partials()[5], Partial::harmonic_default(6));
        assert!((cfg.partials()[7].amplitude - 0.125).abs() < 1e-6);
    }

    #[test]
    fn shrinking_then_growing_keeps_edits() {
        let mut cfg = AdditiveConfig::default();
        cfg.set_partial_count(7);
        cfg.set_partial_amplitude(6, 0.9);
        cfg.set_partial_count(2);
        cfg.set_partial_count(7);
        assert_eq!(cfg.partials()[6].amplitude, 0.9);
    }

    #[test]
    fn partial_count_clamps() {
        let mut cfg = AdditiveConfig::default();
        cfg.set_partial_count(0);
        assert_eq!(cfg.partial_count(), 1);
        cfg.set_partial_count(100);
        assert_eq!(cfg.partial_count(), MAX_PARTIALS);
    }

    #[test]
    fn unpopulated_partial_edits_are_ignored() {
        let mut cfg = AdditiveConfig::default();
        cfg.set_partial_amplitude(6, 0.9);
        cfg.set_partial_count(7);
        assert!((cfg.partials()[6].amplitude - 1.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn fm_setters_clamp() {
        let mut fm = FmConfig::default();
        fm.set_ratio(50.0);
        fm.set_index(-5.0);
        assert_eq!(fm.ratio(), FmConfig::MAX_RATIO);
        assert_eq!(fm.index(), 0.0);
        fm.set_ratio(f32::NAN);
        assert_eq!(fm.ratio(), FmConfig::MAX_RATIO);
    }

    #[test]
    fn am_phase_offset_wraps() {
        let mut am = AmConfig::default();
        am.set_phase_offset(450.0);
        assert!((am.phase_offset() - 90.0).abs() < 1e-4);
        am.set_phase_offset(-90.0);
        assert!((am.phase_offset() - 270.0).abs() < 1e-4);

        am.set_mod_frequency(4.0);
        am.set_phase_offset(180.0);
        assert!((am.modulator_delay() - 0.125).abs() < 1e-6);
    }

    #[test]
    fn set_waveform_targets_selected_algorithm() {
        let mut params = SynthParams::default();
        params.algorithm = AlgorithmKind::Fm;
        params.set_waveform(Waveform::Square);
        assert_eq!(params.fm.carrier_waveform(), Waveform::Square);
        assert_eq!(params.fm.modulator_waveform(), Waveform::Sine);
        assert_eq!(params.simple.waveform, Waveform::Sine);
    }

    #[test]
    fn engine_config_validation() {
        assert!(EngineConfig::default().validate().is_ok());
        assert_eq!(
            EngineConfig::with_sample_rate(0.0).validate(),
            Err(ConfigError::InvalidSampleRate(0.0))
        );
        let cfg = EngineConfig {
            max_voices: 0,
            ..EngineConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoVoices));
        let cfg = EngineConfig {
            settle_margin: -1.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }
}
