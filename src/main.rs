use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use scalekit::{Scale, ScaleDataset, Synthesizer, Waveform};

mod wav;

fn parse_duration(s: &str) -> Result<Duration, std::num::ParseIntError> {
    let ms: u64 = s.parse()?;
    Ok(Duration::from_millis(ms))
}

/// Explore musical tuning systems and render them to audio
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all scales in a dataset file
    List {
        /// Path to the JSON scale dataset
        dataset: PathBuf,
    },
    /// Show the degrees of one scale
    Show {
        /// Path to the JSON scale dataset
        dataset: PathBuf,

        /// Name of the scale to show
        name: String,

        /// Tonic frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        base_freq: f64,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render one scale to a mono WAV file
    Render {
        /// Path to the JSON scale dataset
        dataset: PathBuf,

        /// Name of the scale to render
        name: String,

        /// Output WAV path
        out: PathBuf,

        /// Tonic frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        base_freq: f64,

        /// Length of each note in milliseconds
        #[arg(long, default_value = "500", value_parser = parse_duration)]
        note_ms: Duration,

        /// Oscillator shape (sine, square, triangle, sawtooth)
        #[arg(long, default_value = "sine")]
        waveform: Waveform,

        /// Output gain in [0, 1]
        #[arg(long, default_value_t = 0.8)]
        gain: f64,
    },
}

/// One scale degree as reported by `show`.
#[derive(Serialize, Debug)]
struct NoteReport {
    index: usize,
    interval_cents: f64,
    cumulative_cents: f64,
    proportion: f64,
    frequency: f64,
}

/// Everything `show` prints about one scale, also the `--json` payload.
#[derive(Serialize, Debug)]
struct ScaleReport<'a> {
    name: &'a str,
    description: &'a str,
    num_octaves: u32,
    num_intervals: usize,
    base_frequency: f64,
    notes: Vec<NoteReport>,
}

impl<'a> ScaleReport<'a> {
    fn new(scale: &'a Scale, base_frequency: f64) -> Result<Self> {
        let proportions = scale.proportions();

        let mut notes = Vec::with_capacity(scale.num_notes());
        notes.push(NoteReport {
            index: 0,
            interval_cents: 0.0,
            cumulative_cents: 0.0,
            proportion: 0.0,
            frequency: scale.note_frequency(0, base_frequency)?,
        });

        let mut cumulative = 0.0;
        for index in 1..=scale.num_intervals() {
            let interval = scale.interval(index - 1)?;
            cumulative += interval;
            notes.push(NoteReport {
                index,
                interval_cents: interval,
                cumulative_cents: cumulative,
                proportion: proportions[index - 1],
                frequency: scale.note_frequency(index, base_frequency)?,
            });
        }

        Ok(Self {
            name: scale.name(),
            description: scale.description(),
            num_octaves: scale.num_octaves(),
            num_intervals: scale.num_intervals(),
            base_frequency,
            notes,
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();

    const SAMPLE_RATE: u32 = 44_100;

    let args = Args::parse();

    match args.command {
        Commands::List { dataset } => {
            let dataset = load_dataset(&dataset)?;
            for (index, name) in dataset.names().iter().enumerate() {
                println!("{index}: {name}");
            }
        }
        Commands::Show {
            dataset,
            name,
            base_freq,
            json,
        } => {
            let dataset = load_dataset(&dataset)?;
            let scale = dataset.get(&name)?;
            let report = ScaleReport::new(scale, base_freq)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Render {
            dataset,
            name,
            out,
            base_freq,
            note_ms,
            waveform,
            gain,
        } => {
            let dataset = load_dataset(&dataset)?;
            let scale = dataset.get(&name)?;

            let mut synth = Synthesizer::new(SAMPLE_RATE);
            synth.set_waveform(waveform);
            synth.set_gain(gain);

            let samples = synth.render_scale(scale, base_freq, note_ms)?;
            let bytes = wav::encode_wav(&samples, SAMPLE_RATE)?;
            std::fs::write(&out, &bytes)
                .with_context(|| format!("failed to write '{}'", out.display()))?;

            println!(
                "Wrote {} notes ({} samples) to {}",
                scale.num_notes(),
                samples.len(),
                out.display()
            );
        }
    }

    Ok(())
}

fn load_dataset(path: &Path) -> Result<ScaleDataset> {
    let file = File::open(path)
        .with_context(|| format!("failed to open dataset '{}'", path.display()))?;
    ScaleDataset::from_reader(file)
        .with_context(|| format!("failed to load dataset '{}'", path.display()))
}

fn print_report(report: &ScaleReport) {
    println!("Name:        {}", report.name);
    if !report.description.is_empty() {
        println!("Description: {}", report.description);
    }
    println!("Octaves:     {}", report.num_octaves);
    println!("Intervals:   {}", report.num_intervals);
    println!();
    println!(
        "{:>4}  {:>10}  {:>12}  {:>10}  {:>12}",
        "note", "interval", "cumulative", "proportion", "frequency"
    );
    for note in &report.notes {
        println!(
            "{:>4}  {:>10.2}  {:>12.2}  {:>10.4}  {:>9.3} Hz",
            note.index, note.interval_cents, note.cumulative_cents, note.proportion, note.frequency
        );
    }
}
