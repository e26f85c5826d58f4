//! Additive synthesis of one notation into 16-bit samples.

use std::f64::consts::PI;

use crate::error::{Error, Result};
use crate::harmonics::HarmonicsProfile;
use crate::notation::parse_notation;

/// Length of one duration unit in milliseconds
pub const DURATION_UNIT_MS: u32 = 250;

/// Default output rate in Hz
pub const DEFAULT_SAMPLING_RATE: u32 = 48_000;

/// Peak level of a single voice: half of the 16-bit range.
pub const AMPLITUDE: f64 = (i16::MAX as f64) / 2.0;

/// Largest sample magnitude ever produced
pub const SAMPLE_LIMIT: i16 = i16::MAX;

/// Most frames one buffer may hold: a 16-bit mono wave's data chunk is
/// capped at `u32::MAX` bytes.
pub const MAX_FRAMES: usize = (u32::MAX / 2) as usize;

/// Number of sample frames for `duration` units at `sampling_rate`.
pub fn sample_frame_count(duration: u32, sampling_rate: u32) -> usize {
    let frames =
        sampling_rate as f64 * duration as f64 * DURATION_UNIT_MS as f64 / 1000.0;
    frames.round_ties_even() as usize
}

/// Render simultaneous `frequencies` for `duration` units.
///
/// Every (frequency, harmonic) pair contributes a sine at
/// `multiplier * frequency`, weighted by its share of the profile's total
/// amplitude, by `|sin(4 * multiplier * frequency)|` and by a decay from 1
/// at the first frame toward 1/e at the last. Voices are averaged, so a
/// chord is never louder than a single note.
///
/// An empty frequency list renders silence of the full length.
pub fn synthesize(
    frequencies: &[f64],
    duration: u32,
    harmonics: &HarmonicsProfile,
    sampling_rate: u32,
) -> Result<Vec<i16>> {
    let amplitude_sum = harmonics.amplitude_sum()?;
    let frame_count = sample_frame_count(duration, sampling_rate);
    if frame_count > MAX_FRAMES {
        return Err(Error::TooLong {
            frames: frame_count as u64,
        });
    }

    let mut samples = Vec::new();
    samples
        .try_reserve_exact(frame_count)
        .map_err(|_| Error::TooLong {
            frames: frame_count as u64,
        })?;

    if frequencies.is_empty() {
        samples.resize(frame_count, 0);
        return Ok(samples);
    }

    let partials: Vec<Partial> = frequencies
        .iter()
        .flat_map(|&freq| {
            harmonics
                .harmonics()
                .iter()
                .map(move |h| Partial::new(freq, h.multiplier(), h.amplitude(), amplitude_sum))
        })
        .collect();

    let voices = frequencies.len() as f64;
    let frames = frame_count as f64;
    let rate = sampling_rate as f64;
    let limit = SAMPLE_LIMIT as f64;

    samples.extend((0..frame_count).map(|t| {
        let t = t as f64;
        let envelope = (-t / frames).exp();
        let mut sum = 0.0;
        for p in &partials {
            sum += p.scale * envelope * p.shimmer * (p.omega * t / rate).sin();
        }
        (sum / voices).round_ties_even().clamp(-limit, limit) as i16
    }));

    Ok(samples)
}

/// Frame-independent factors of one (frequency, harmonic) pair. Each is
/// evaluated in the same order as the per-frame formula so results match it
/// bit for bit.
struct Partial {
    /// `AMPLITUDE * amplitude / amplitude_sum`
    scale: f64,
    /// `|sin(multiplier * frequency * 4)|`
    shimmer: f64,
    /// `2π * multiplier * frequency`
    omega: f64,
}

impl Partial {
    fn new(frequency: f64, multiplier: f64, amplitude: f64, amplitude_sum: f64) -> Self {
        Self {
            scale: AMPLITUDE * amplitude / amplitude_sum,
            shimmer: (multiplier * frequency * 4.0).sin().abs(),
            omega: 2.0 * PI * multiplier * frequency,
        }
    }
}

/// Parse a single notation and render it. Separators render nothing.
pub fn render_notation(
    notation: &str,
    harmonics: &HarmonicsProfile,
    sampling_rate: u32,
) -> Result<Vec<i16>> {
    let parsed = parse_notation(notation)?;
    if parsed.is_separator() {
        return Ok(Vec::new());
    }
    synthesize(&parsed.frequencies(), parsed.duration, harmonics, sampling_rate)
}
