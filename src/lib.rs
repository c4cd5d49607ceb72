//! Musical tuning-system toolkit.
//!
//! This crate models musical scales as cumulative cent offsets from a tonic,
//! loads named scale collections from JSON dataset documents, and renders
//! scale degrees offline to audio samples. The [`Scale`] type validates every
//! construction and mutation against the octave span it declares; the
//! [`ScaleDataset`] type parses the two supported document entry forms
//! (diatonic semitone steps and raw frequencies) into scales retrievable by
//! name in document order.

#![warn(missing_docs)]

pub mod dataset;
pub mod scale;
pub mod synth;

/// Number of cents in one octave (one frequency doubling), by definition of
/// the unit.
pub const CENTS_PER_OCTAVE: f64 = 1200.0;

/// Number of cents in one twelve-tone equal temperament semitone.
pub const CENTS_PER_SEMITONE: f64 = 100.0;

/// Smallest pairwise interval a scale may contain, in cents.
pub const MIN_INTERVAL_CENTS: f64 = 1.0;

pub use dataset::{DatasetError, ScaleDataset};
pub use scale::{Scale, ScaleError};
pub use synth::{SynthError, Synthesizer, Waveform};
