//! Music documents: a timbre plus an ordered list of notations.
//!
//! On disk a document is a JSON object:
//! ```text
//! {
//!     "harmonics": [[1, 100], [2, 20]],
//!     "notations": "c4e4g42 _1 , a41"
//! }
//! ```
//! `notations` is the space-joined notation list. Loading splits on every
//! single space, so a doubled space becomes an empty entry. Empty entries are
//! kept so the file saves back unchanged, and are skipped when rendering.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::harmonics::HarmonicsProfile;
use crate::notation::{Notation, SEPARATOR, parse_notation};
use crate::synth::{DURATION_UNIT_MS, MAX_FRAMES, render_notation, sample_frame_count};

/// Joins notations in the saved form
pub const SPACE: &str = " ";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "MusicFile", into = "MusicFile")]
pub struct MusicDocument {
    harmonics: HarmonicsProfile,
    notations: Vec<String>,
}

/// Saved shape of a document
#[derive(Serialize, Deserialize)]
struct MusicFile {
    harmonics: HarmonicsProfile,
    notations: String,
}

impl TryFrom<MusicFile> for MusicDocument {
    type Error = Error;

    fn try_from(file: MusicFile) -> Result<Self> {
        file.harmonics.validate()?;
        let notations = if file.notations.is_empty() {
            Vec::new()
        } else {
            file.notations.split(SPACE).map(str::to_string).collect()
        };
        Ok(Self {
            harmonics: file.harmonics,
            notations,
        })
    }
}

impl From<MusicDocument> for MusicFile {
    fn from(doc: MusicDocument) -> Self {
        Self {
            harmonics: doc.harmonics,
            notations: doc.notations.join(SPACE),
        }
    }
}

impl MusicDocument {
    /// Empty document with the default unity harmonic
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_harmonics(harmonics: HarmonicsProfile) -> Self {
        Self {
            harmonics,
            notations: Vec::new(),
        }
    }

    pub fn harmonics(&self) -> &HarmonicsProfile {
        &self.harmonics
    }

    pub fn set_harmonics(&mut self, harmonics: HarmonicsProfile) {
        self.harmonics = harmonics;
    }

    pub fn notations(&self) -> &[String] {
        &self.notations
    }

    /// Append a notation after checking that it parses.
    pub fn append_notation(&mut self, notation: &str) -> Result<()> {
        parse_notation(notation)?;
        self.notations.push(notation.to_string());
        Ok(())
    }

    pub fn push(&mut self, notation: &Notation) {
        self.notations.push(notation.to_string());
    }

    pub fn remove_last_notation(&mut self) -> Option<String> {
        self.notations.pop()
    }

    /// Back to a single unity harmonic and no notations
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Parse every notation, separators included, in order. Empty entries
    /// are skipped.
    pub fn parse_all(&self) -> Result<Vec<Notation>> {
        self.notations
            .iter()
            .filter(|n| !n.is_empty())
            .map(|n| parse_notation(n))
            .collect()
    }

    /// Total length in duration units
    pub fn duration_units(&self) -> Result<u64> {
        Ok(self
            .parse_all()?
            .iter()
            .map(|n| n.duration as u64)
            .sum())
    }

    /// Total length in milliseconds
    pub fn duration_ms(&self) -> Result<u64> {
        Ok(self.duration_units()? * DURATION_UNIT_MS as u64)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Pretty JSON with four-space indentation
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(serde::ser::Error::custom)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let doc = Self::from_json(&text).map_err(|source| Error::Document {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "loaded {}: {} notations, {} harmonics",
            path.display(),
            doc.notations.len(),
            doc.harmonics.len()
        );
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json().map_err(|source| Error::Document {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|e| Error::io(path, e))
    }
}

/// Render each sounding notation of `music` in order, one buffer per notation.
/// Separators and empty entries are skipped.
pub fn render_notations<'a>(
    music: &'a MusicDocument,
    sampling_rate: u32,
) -> impl Iterator<Item = Result<Vec<i16>>> + 'a {
    music
        .notations
        .iter()
        .filter(|n| !n.is_empty() && n.as_str() != SEPARATOR)
        .map(move |n| render_notation(n, &music.harmonics, sampling_rate))
}

/// Render the whole document into one buffer.
pub fn render_music(music: &MusicDocument, sampling_rate: u32) -> Result<Vec<i16>> {
    let frames: u64 = music
        .parse_all()?
        .iter()
        .map(|n| sample_frame_count(n.duration, sampling_rate) as u64)
        .sum();
    if frames > MAX_FRAMES as u64 {
        return Err(Error::TooLong { frames });
    }

    let mut samples = Vec::new();
    samples
        .try_reserve_exact(frames as usize)
        .map_err(|_| Error::TooLong { frames })?;
    for buffer in render_notations(music, sampling_rate) {
        samples.extend(buffer?);
    }
    debug!(
        "rendered {} notations into {} samples at {} Hz",
        music.notations.len(),
        samples.len(),
        sampling_rate
    );
    Ok(samples)
}
