//! Additive synthesis from a compact note notation.
//!
//! A notation such as `c4e4g42` names the notes that sound together and how
//! many 250 ms units they last. A [`MusicDocument`] pairs a list of them with a
//! [`HarmonicsProfile`]; rendering it yields signed 16-bit mono samples that
//! can be written to a wave file or played on the default output device.

pub mod error;
pub mod harmonics;
pub mod music;
pub mod notation;
pub mod note;
pub mod player;
pub mod synth;
pub mod wav;

pub use error::{Error, Result};
pub use harmonics::{Harmonic, HarmonicsProfile, Level, Preset};
pub use music::{MusicDocument, render_music, render_notations};
pub use notation::{Notation, SEPARATOR, parse_notation};
pub use note::{Note, NoteName};
pub use player::{DeviceSink, PlaybackWorker, PlayerEvent, PlayerMessage, SampleSink};
pub use synth::{DEFAULT_SAMPLING_RATE, render_notation, sample_frame_count, synthesize};
pub use wav::{save_wave, write_wav};
