//! Offline rendering of scale degrees to audio samples.
//!
//! The synthesizer is a plain oscillator bank: one waveform, one gain,
//! no filter modeling. Frequencies outside the audible band are rejected
//! rather than clamped, and every rendered note gets a short linear ramp
//! at both edges so concatenated notes stay click free.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::scale::{Scale, ScaleError};

/// Lowest renderable frequency in Hz.
pub const MIN_FREQUENCY: f64 = 20.0;
/// Highest renderable frequency in Hz.
pub const MAX_FREQUENCY: f64 = 20_000.0;

/// Length of the fade applied at each edge of a rendered note.
const EDGE_RAMP_SECONDS: f64 = 0.005;

/// A failure while rendering audio.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SynthError {
    /// A frequency outside the audible band.
    #[error("frequency {0} Hz is outside the {MIN_FREQUENCY}..={MAX_FREQUENCY} Hz range")]
    FrequencyOutOfRange(f64),

    /// A waveform name that matches no known waveform.
    #[error("unknown waveform '{0}', expected sine, square, triangle, or sawtooth")]
    UnknownWaveform(String),

    /// A scale query failed while resolving note frequencies.
    #[error(transparent)]
    Scale(#[from] ScaleError),
}

/// Oscillator shape used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    /// Pure tone.
    #[default]
    Sine,
    /// Odd-harmonic square wave.
    Square,
    /// Odd-harmonic triangle wave, much softer than square.
    Triangle,
    /// Full-harmonic sawtooth wave.
    Sawtooth,
}

impl Waveform {
    /// Sample value for a phase in `[0, 1)`, before gain.
    fn sample(self, phase: f64) -> f64 {
        match self {
            Self::Sine => (std::f64::consts::TAU * phase).sin(),
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Self::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::Sawtooth => "sawtooth",
        };
        f.write_str(name)
    }
}

impl FromStr for Waveform {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Ok(Self::Sine),
            "square" => Ok(Self::Square),
            "triangle" => Ok(Self::Triangle),
            "sawtooth" | "saw" => Ok(Self::Sawtooth),
            other => Err(SynthError::UnknownWaveform(other.to_owned())),
        }
    }
}

/// Renders scale degrees to mono `f32` sample buffers.
pub struct Synthesizer {
    sample_rate: u32,
    waveform: Waveform,
    gain: f64,
}

impl Synthesizer {
    /// Creates a synthesizer with a sine waveform and 0.8 gain.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            waveform: Waveform::default(),
            gain: 0.8,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Current oscillator shape.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Switches the oscillator shape.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Current output gain.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Sets the output gain, clamped into `[0, 1]`.
    pub fn set_gain(&mut self, gain: f64) {
        self.gain = if !(gain >= 0.0) { 0.0 } else { gain.min(1.0) };
    }

    /// Renders one note at `frequency` for `duration`.
    ///
    /// Frequencies outside the 20 Hz to 20 kHz band are rejected. The
    /// returned buffer is faded in and out over the first and last few
    /// milliseconds.
    pub fn render_note(&self, frequency: f64, duration: Duration) -> Result<Vec<f32>, SynthError> {
        if !(frequency >= MIN_FREQUENCY) || !(frequency <= MAX_FREQUENCY) {
            return Err(SynthError::FrequencyOutOfRange(frequency));
        }

        let num_samples = (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        let step = frequency / f64::from(self.sample_rate);

        let mut samples = Vec::with_capacity(num_samples);
        let mut phase = 0.0f64;
        for _ in 0..num_samples {
            samples.push((self.waveform.sample(phase) * self.gain) as f32);
            phase += step;
            phase -= phase.floor();
        }

        apply_edge_ramps(&mut samples, self.sample_rate);
        Ok(samples)
    }

    /// Renders every note of a scale back to back, tonic through the
    /// degree one octave span above it.
    ///
    /// Note frequencies come from [`Scale::note_frequency`] for indices
    /// `0..=num_intervals`, so the buffer holds `num_notes` notes.
    pub fn render_scale(
        &self,
        scale: &Scale,
        base_frequency: f64,
        note_duration: Duration,
    ) -> Result<Vec<f32>, SynthError> {
        debug!(
            "SYNTH: rendering '{}' as {} {} notes at {} Hz base",
            scale.name(),
            scale.num_notes(),
            self.waveform,
            base_frequency
        );

        let samples_per_note =
            (note_duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        let mut samples = Vec::with_capacity(samples_per_note * scale.num_notes());
        for index in 0..=scale.num_intervals() {
            let frequency = scale.note_frequency(index, base_frequency)?;
            samples.extend(self.render_note(frequency, note_duration)?);
        }

        Ok(samples)
    }
}

/// Fades the buffer edges linearly to zero to avoid onset and release
/// clicks. Short buffers ramp over at most half their length.
fn apply_edge_ramps(samples: &mut [f32], sample_rate: u32) {
    let ramp_len = ((EDGE_RAMP_SECONDS * f64::from(sample_rate)) as usize).min(samples.len() / 2);
    if ramp_len == 0 {
        return;
    }

    let len = samples.len();
    for i in 0..ramp_len {
        let scale = i as f32 / ramp_len as f32;
        samples[i] *= scale;
        samples[len - 1 - i] *= scale;
    }
}
