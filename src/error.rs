use std::path::PathBuf;

/// Everything that can go wrong between a notation string and a wave file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed notation (duration suffix or octave digit)
    #[error("invalid notation '{notation}': {reason}")]
    Parse { notation: String, reason: String },

    #[error("unknown note name '{0}'")]
    UnknownNote(char),

    /// All relative amplitudes are zero, nothing to normalize against
    #[error("harmonics profile has no energy (amplitude sum must be > 0)")]
    DegenerateHarmonics,

    /// More frames than one buffer or wave file can hold
    #[error("too long to render: {frames} sample frames")]
    TooLong { frames: u64 },

    #[error("invalid harmonic (multiplier {multiplier}, amplitude {amplitude})")]
    InvalidHarmonic { multiplier: f64, amplitude: f64 },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was readable but is not a music document
    #[error("{}: malformed music document: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("wave encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("audio output: {0}")]
    Audio(String),

    #[error("playback worker is closed")]
    PlayerClosed,
}

impl Error {
    pub(crate) fn parse(notation: &str, reason: impl Into<String>) -> Self {
        Error::Parse {
            notation: notation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
