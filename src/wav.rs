//! Mono 16-bit PCM wave output.

use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};
use crate::music::{MusicDocument, render_music};

pub const BITS_PER_SAMPLE: u16 = 16;

pub fn wav_spec(sampling_rate: u32) -> hound::WavSpec {
    hound::WavSpec {
        channels: 1,
        sample_rate: sampling_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Encode `samples` as a complete wave stream into `writer`.
pub fn write_samples<W: Write + Seek>(writer: W, samples: &[i16], sampling_rate: u32) -> Result<()> {
    let mut wav = hound::WavWriter::new(writer, wav_spec(sampling_rate))?;
    for &sample in samples {
        wav.write_sample(sample)?;
    }
    wav.finalize()?;
    Ok(())
}

/// Write a wave file atomically: the data goes to a temp file next to
/// `path` which is renamed into place only once fully written.
pub fn write_wav(path: &Path, samples: &[i16], sampling_rate: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;

    write_samples(BufWriter::new(temp.as_file_mut()), samples, sampling_rate)?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

/// Render `music` and write it to `path`.
pub fn save_wave(path: &Path, music: &MusicDocument, sampling_rate: u32) -> Result<()> {
    let samples = render_music(music, sampling_rate)?;
    write_wav(path, &samples, sampling_rate)?;
    info!(
        "wrote {} ({} samples, {:.2} s at {} Hz)",
        path.display(),
        samples.len(),
        samples.len() as f64 / sampling_rate as f64,
        sampling_rate
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let mut cursor = Cursor::new(Vec::new());
        write_samples(&mut cursor, &[0, 1, -1, 32767, -32767], 48_000).unwrap();
        let data = cursor.into_inner();

        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([data[20], data[21]]), 1); // PCM
        assert_eq!(u16::from_le_bytes([data[22], data[23]]), 1); // mono
        assert_eq!(
            u32::from_le_bytes([data[24], data[25], data[26], data[27]]),
            48_000
        );
        assert_eq!(u16::from_le_bytes([data[34], data[35]]), 16);
        assert_eq!(&data[36..40], b"data");
        assert_eq!(u32::from_le_bytes([data[40], data[41], data[42], data[43]]), 10);
        assert_eq!(i16::from_le_bytes([data[50], data[51]]), 32767);
        assert_eq!(i16::from_le_bytes([data[52], data[53]]), -32767);
    }

    #[test]
    fn test_samples_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let samples: Vec<i16> = (-50..50).map(|i| i * 300).collect();
        write_wav(&path, &samples, 22_050).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec(), wav_spec(22_050));
        let back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(back, samples);
    }

    #[test]
    fn test_save_wave_renders_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.wav");
        let mut music = MusicDocument::new();
        for n in ["c41", ",", "_2"] {
            music.append_notation(n).unwrap();
        }
        save_wave(&path, &music, 8_000).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 6_000);
    }

    #[test]
    fn test_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        let music = MusicDocument::from_json(r#"{"harmonics": [[1, 1]], "notations": "c41 c4"}"#)
            .unwrap();

        assert!(matches!(
            save_wave(&path, &music, 8_000),
            Err(Error::Parse { .. })
        ));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.wav");
        assert!(matches!(
            write_wav(&path, &[0; 4], 8_000),
            Err(Error::Io { .. })
        ));
    }
}
