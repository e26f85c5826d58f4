use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use syllable::{
    DEFAULT_SAMPLING_RATE, DeviceSink, MusicDocument, Note, PlaybackWorker, Preset, Result,
    render_notations, save_wave,
};

#[derive(Parser)]
#[command(name = "syllable", about = "Additive synthesizer for a compact note notation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a music file to a 16-bit mono wave file
    Convert {
        /// Path to a music file
        music: PathBuf,

        /// Wave file to write
        wave: PathBuf,

        /// Output sampling rate (Hz)
        #[arg(long, default_value_t = DEFAULT_SAMPLING_RATE)]
        sample_rate: u32,

        /// Replace the file's harmonics with a built-in timbre
        #[arg(long, value_enum)]
        harmonics: Option<Preset>,
    },

    /// Play a music file through the default output device
    Play {
        /// Path to a music file
        music: PathBuf,

        /// Number of times to play it
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        repeat: u32,

        /// Output sampling rate (Hz)
        #[arg(long, default_value_t = DEFAULT_SAMPLING_RATE)]
        sample_rate: u32,

        /// Replace the file's harmonics with a built-in timbre
        #[arg(long, value_enum)]
        harmonics: Option<Preset>,
    },

    /// Show the harmonics and every notation of a music file
    Inspect {
        /// Path to a music file
        music: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("syllable=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Convert {
            music,
            wave,
            sample_rate,
            harmonics,
        } => convert(&music, &wave, sample_rate, harmonics),
        Command::Play {
            music,
            repeat,
            sample_rate,
            harmonics,
        } => play(&music, repeat, sample_rate, harmonics),
        Command::Inspect { music } => inspect(&music),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_music(path: &Path, preset: Option<Preset>) -> Result<MusicDocument> {
    let mut music = MusicDocument::load(path)?;
    if let Some(preset) = preset {
        music.set_harmonics(preset.profile());
    }
    Ok(music)
}

fn convert(music: &Path, wave: &Path, sample_rate: u32, preset: Option<Preset>) -> Result<()> {
    let doc = load_music(music, preset)?;
    save_wave(wave, &doc, sample_rate)?;
    println!("Wrote {}", wave.display());
    Ok(())
}

fn play(music: &Path, repeat: u32, sample_rate: u32, preset: Option<Preset>) -> Result<()> {
    let doc = load_music(music, preset)?;
    let mut worker = PlaybackWorker::spawn(move || DeviceSink::open(sample_rate))?;

    println!(
        "Playing: {} notations, {:.2} s{}",
        doc.notations().len(),
        doc.duration_ms()? as f64 / 1000.0,
        if repeat > 1 {
            format!(" x{}", repeat)
        } else {
            String::new()
        }
    );

    // First pass streams each notation as soon as it is rendered
    let mut rendered = Vec::with_capacity(doc.notations().len());
    for buffer in render_notations(&doc, sample_rate) {
        let buffer = buffer?;
        worker.play(buffer.clone())?;
        rendered.push(buffer);
    }
    for _ in 1..repeat {
        for buffer in &rendered {
            worker.play(buffer.clone())?;
        }
    }

    worker.end_of_stream()?;
    worker.wait_for_end()?;
    worker.close();
    Ok(())
}

fn inspect(music: &Path) -> Result<()> {
    let doc = MusicDocument::load(music)?;

    println!("Harmonics: {}", doc.harmonics().len());
    for h in doc.harmonics().harmonics() {
        println!("  x{:.2}  amplitude {}", h.multiplier(), h.amplitude());
    }
    println!();

    let notations = doc.parse_all()?;
    println!(
        "Notations: {} ({} units, {:.2} s)",
        notations.len(),
        doc.duration_units()?,
        doc.duration_ms()? as f64 / 1000.0
    );
    for notation in &notations {
        if notation.is_separator() {
            println!("  ,");
            continue;
        }
        let desc: Vec<String> = notation
            .notes
            .iter()
            .map(|note| match note {
                Note::Rest => "rest".to_string(),
                pitched => format!("{} ({:.1} Hz)", pitched, pitched.frequency()),
            })
            .collect();
        println!(
            "  {:<12} {} x{}",
            notation.to_string(),
            desc.join(" + "),
            notation.duration
        );
    }
    Ok(())
}
