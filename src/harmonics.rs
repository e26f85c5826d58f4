//! Additive timbre: which overtones sound and how loud, relative to each other.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A number as written in a music document.
///
/// Files keep `1` and `1.0` apart, so a value remembers which form it was
/// read in and is written back the same way. Compares by value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Integer(i64),
    Real(f64),
}

impl Level {
    /// Largest magnitude an `f64` holds without losing integer precision
    const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

    pub fn value(self) -> f64 {
        match self {
            Level::Integer(i) => i as f64,
            Level::Real(x) => x,
        }
    }
}

impl From<f64> for Level {
    /// Whole numbers become `Integer`, the way the recorder writes its
    /// slider values.
    fn from(x: f64) -> Self {
        if x.fract() == 0.0 && x.abs() <= Self::EXACT_INTEGER_LIMIT {
            Level::Integer(x as i64)
        } else {
            Level::Real(x)
        }
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

/// One overtone: `multiplier` times the fundamental at `amplitude` weight.
///
/// Serialized as a `[multiplier, amplitude]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Level, Level)", into = "(Level, Level)")]
pub struct Harmonic {
    multiplier: Level,
    amplitude: Level,
}

impl Harmonic {
    pub fn new(multiplier: f64, amplitude: f64) -> Self {
        Self {
            multiplier: multiplier.into(),
            amplitude: amplitude.into(),
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier.value()
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude.value()
    }
}

impl From<(f64, f64)> for Harmonic {
    fn from((multiplier, amplitude): (f64, f64)) -> Self {
        Self::new(multiplier, amplitude)
    }
}

impl From<(Level, Level)> for Harmonic {
    fn from((multiplier, amplitude): (Level, Level)) -> Self {
        Self {
            multiplier,
            amplitude,
        }
    }
}

impl From<Harmonic> for (Level, Level) {
    fn from(h: Harmonic) -> Self {
        (h.multiplier, h.amplitude)
    }
}

/// Ordered list of harmonics. Order does not change the sound but is kept
/// so saved documents read back identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HarmonicsProfile(Vec<Harmonic>);

impl HarmonicsProfile {
    /// Overtone multipliers offered by the recorder, one slider each
    pub const RECORDER_MULTIPLIERS: [f64; 19] = [
        1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0, 9.5,
        10.0,
    ];

    /// Slider range of the recorder
    pub const RECORDER_MAX_AMPLITUDE: u8 = 100;

    pub fn new(harmonics: Vec<Harmonic>) -> Result<Self> {
        for h in &harmonics {
            // NaN fails both comparisons
            let in_range = h.multiplier() > 0.0 && h.amplitude() >= 0.0;
            if !in_range {
                return Err(Error::InvalidHarmonic {
                    multiplier: h.multiplier(),
                    amplitude: h.amplitude(),
                });
            }
        }
        Ok(Self(harmonics))
    }

    /// Build a profile from `(multiplier, amplitude)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        Self::new(pairs.iter().copied().map(Harmonic::from).collect())
    }

    /// The recorder's slider bank: amplitude `levels[i]` for
    /// `RECORDER_MULTIPLIERS[i]`, each capped at 100. Missing levels are 0.
    pub fn recorder_bank(levels: &[u8]) -> Self {
        let harmonics = Self::RECORDER_MULTIPLIERS
            .iter()
            .enumerate()
            .map(|(i, &multiplier)| {
                let level = levels
                    .get(i)
                    .copied()
                    .unwrap_or(0)
                    .min(Self::RECORDER_MAX_AMPLITUDE);
                Harmonic::new(multiplier, level as f64)
            })
            .collect();
        Self(harmonics)
    }

    pub fn harmonics(&self) -> &[Harmonic] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of relative amplitudes, the normalizing denominator for synthesis.
    ///
    /// Fails with `DegenerateHarmonics` unless the sum is strictly positive.
    pub fn amplitude_sum(&self) -> Result<f64> {
        let sum: f64 = self.0.iter().map(Harmonic::amplitude).sum();
        if sum > 0.0 {
            Ok(sum)
        } else {
            Err(Error::DegenerateHarmonics)
        }
    }

    /// Check every pair is in range. Used after deserializing.
    pub fn validate(&self) -> Result<()> {
        Self::new(self.0.clone()).map(|_| ())
    }
}

impl Default for HarmonicsProfile {
    /// A single unity fundamental
    fn default() -> Self {
        Self(vec![Harmonic::new(1.0, 1.0)])
    }
}

/// Built-in timbres
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    /// Fundamental only
    Pure,
    /// Strong fundamental with a faint odd-heavy overtone series
    Bright,
    /// Fuller even overtones
    Rich,
    /// Odd harmonics only, clarinet-like
    Hollow,
    /// Weak fundamental, energy spread over even overtones
    Airy,
}

impl Preset {
    pub fn profile(self) -> HarmonicsProfile {
        let pairs: &[(f64, f64)] = match self {
            Preset::Pure => &[(1.0, 1.0)],
            Preset::Bright => &[
                (1.0, 1.0),
                (2.0, 0.01),
                (3.0, 0.1),
                (4.0, 0.02),
                (5.0, 0.05),
                (6.0, 0.01),
                (7.0, 0.01),
            ],
            Preset::Rich => &[
                (1.0, 1.0),
                (2.0, 0.1),
                (3.0, 0.05),
                (4.0, 0.2),
                (5.0, 0.05),
                (6.0, 0.1),
                (7.0, 0.1),
            ],
            Preset::Hollow => &[(1.0, 0.3), (3.0, 0.2), (5.0, 0.2), (7.0, 0.1), (9.0, 0.1)],
            Preset::Airy => &[
                (1.0, 0.1),
                (2.0, 0.2),
                (3.0, 0.05),
                (4.0, 0.2),
                (5.0, 0.05),
                (6.0, 0.2),
                (7.0, 0.05),
                (8.0, 0.1),
            ],
        };
        HarmonicsProfile(pairs.iter().copied().map(Harmonic::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unity_fundamental() {
        let profile = HarmonicsProfile::default();
        assert_eq!(profile.harmonics(), &[Harmonic::new(1.0, 1.0)]);
        assert_eq!(profile.amplitude_sum().unwrap(), 1.0);
    }

    #[test]
    fn test_amplitude_sum() {
        let profile = HarmonicsProfile::from_pairs(&[(1.0, 0.3), (3.0, 0.2), (5.0, 0.5)]).unwrap();
        assert!((profile.amplitude_sum().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_is_degenerate() {
        let profile = HarmonicsProfile::from_pairs(&[(1.0, 0.0), (2.0, 0.0)]).unwrap();
        assert!(matches!(
            profile.amplitude_sum(),
            Err(Error::DegenerateHarmonics)
        ));

        let empty = HarmonicsProfile::new(Vec::new()).unwrap();
        assert!(empty.amplitude_sum().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_pairs() {
        assert!(matches!(
            HarmonicsProfile::from_pairs(&[(0.0, 1.0)]),
            Err(Error::InvalidHarmonic { .. })
        ));
        assert!(HarmonicsProfile::from_pairs(&[(1.0, -0.5)]).is_err());
        assert!(HarmonicsProfile::from_pairs(&[(f64::NAN, 1.0)]).is_err());
    }

    #[test]
    fn test_serializes_as_pairs() {
        let profile = HarmonicsProfile::from_pairs(&[(1.0, 1.0), (2.5, 0.25)]).unwrap();
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, "[[1,1],[2.5,0.25]]");

        let back: HarmonicsProfile = serde_json::from_str("[[1, 100], [1.5, 20]]").unwrap();
        assert_eq!(
            back.harmonics(),
            &[Harmonic::new(1.0, 100.0), Harmonic::new(1.5, 20.0)]
        );
    }

    #[test]
    fn test_keeps_number_forms() {
        let text = "[[1,100],[1.0,20.0],[1.5,0]]";
        let profile: HarmonicsProfile = serde_json::from_str(text).unwrap();
        assert_eq!(profile.harmonics()[1].multiplier(), 1.0);
        assert_eq!(profile.harmonics()[1].amplitude(), 20.0);
        assert_eq!(serde_json::to_string(&profile).unwrap(), text);
    }

    #[test]
    fn test_level_from_float() {
        assert!(matches!(Level::from(3.0), Level::Integer(3)));
        assert!(matches!(Level::from(-0.0), Level::Integer(0)));
        assert!(matches!(Level::from(2.5), Level::Real(_)));
        assert!(matches!(Level::from(1e300), Level::Real(_)));
        assert!(matches!(Level::from(f64::NAN), Level::Real(_)));
        assert_eq!(Level::Integer(2), Level::Real(2.0));
    }

    #[test]
    fn test_recorder_bank() {
        let profile = HarmonicsProfile::recorder_bank(&[100, 0, 50, 255]);
        assert_eq!(profile.len(), 19);
        assert_eq!(profile.harmonics()[0], Harmonic::new(1.0, 100.0));
        assert_eq!(profile.harmonics()[2], Harmonic::new(2.0, 50.0));
        assert_eq!(profile.harmonics()[3], Harmonic::new(2.5, 100.0));
        assert_eq!(profile.harmonics()[18], Harmonic::new(10.0, 0.0));
    }

    #[test]
    fn test_presets_are_usable() {
        for preset in [
            Preset::Pure,
            Preset::Bright,
            Preset::Rich,
            Preset::Hollow,
            Preset::Airy,
        ] {
            let profile = preset.profile();
            profile.validate().unwrap();
            assert!(profile.amplitude_sum().unwrap() > 0.0);
        }
        assert_eq!(Preset::Pure.profile(), HarmonicsProfile::default());
    }
}
