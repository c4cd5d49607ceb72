//! The scale model: a self-validating musical tuning system.
//!
//! A [`Scale`] stores the cumulative cent offset of every degree above the
//! tonic. All constructors and mutations validate the same invariant set:
//! at least one interval, every pairwise gap at least one cent, and the
//! final offset inside the span declared by the octave count. Conversion
//! helpers derive pairwise cents from diatonic semitone steps, raw
//! frequencies, and normalized proportions.

use log::debug;
use thiserror::Error;

use crate::{CENTS_PER_OCTAVE, CENTS_PER_SEMITONE, MIN_INTERVAL_CENTS};

/// Largest admissible diatonic semitone step position.
const MAX_DIATONIC_STEP: u32 = 11;

/// An invariant violation reported by [`Scale`] construction, mutation, or
/// conversion. Every variant carries the offending value and the bound it
/// broke; a failed call never leaves a partially mutated scale behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaleError {
    /// A scale needs at least one interval to mean anything.
    #[error("a scale must contain at least one interval")]
    NoIntervals,

    /// More intervals were supplied than there are cents in the span.
    #[error("{count} intervals cannot fit in {num_octaves} octave(s) at one cent resolution")]
    TooManyIntervals {
        /// Number of intervals supplied.
        count: usize,
        /// Octave span they were supposed to fit in.
        num_octaves: u32,
    },

    /// A pairwise interval was below the one cent minimum.
    #[error("interval {index} is {size} cents, below the {MIN_INTERVAL_CENTS} cent minimum")]
    IntervalTooSmall {
        /// Position of the offending interval.
        index: usize,
        /// Its pairwise width in cents.
        size: f64,
    },

    /// The cumulative cent total ran past the declared octave span.
    #[error("scale spans {total} cents but only {max} cents are available")]
    SpanExceeded {
        /// Cumulative total that broke the bound.
        total: f64,
        /// The span bound in cents.
        max: f64,
    },

    /// An interval index beyond the last interval.
    #[error("interval index {index} is out of bounds for {count} interval(s)")]
    IntervalOutOfBounds {
        /// The requested index.
        index: usize,
        /// Number of intervals in the scale.
        count: usize,
    },

    /// A note index that wraps more octaves than the scale declares.
    #[error("note index {index} lies beyond the {num_octaves} octave span of this scale")]
    NoteOutOfRange {
        /// The requested note index.
        index: usize,
        /// The scale's declared octave count.
        num_octaves: u32,
    },

    /// A width multiplier that would reverse or collapse an interval.
    #[error("percent change must be positive, got {0}")]
    NonPositivePercentChange(f64),

    /// A negative tonic frequency.
    #[error("base frequency must not be negative, got {0}")]
    NegativeBaseFrequency(f64),

    /// A proportion outside the closed unit interval.
    #[error("proportion {index} is {value}, outside [0, 1]")]
    ProportionOutOfRange {
        /// Position of the offending proportion.
        index: usize,
        /// Its value.
        value: f64,
    },

    /// A diatonic step outside the semitone positions of one octave.
    #[error("diatonic step {index} is {step}, outside 0..={MAX_DIATONIC_STEP}")]
    DiatonicStepOutOfRange {
        /// Position of the offending step.
        index: usize,
        /// Its value.
        step: u32,
    },

    /// A conversion input with fewer than two elements.
    #[error("at least two values are needed to derive intervals, got {count}")]
    SequenceTooShort {
        /// Number of elements supplied.
        count: usize,
    },

    /// A frequency that is zero, negative, or not finite.
    #[error("frequency {index} is {value} Hz, but frequencies must be positive")]
    NonPositiveFrequency {
        /// Position of the offending frequency.
        index: usize,
        /// Its value.
        value: f64,
    },

    /// An attempt to remove the only interval left.
    #[error("cannot remove the only remaining interval")]
    LastInterval,
}

/// A musical tuning system spanning a whole number of octaves.
///
/// Degrees are stored as cumulative cent offsets from the tonic, strictly
/// increasing, with the final offset bounded by `num_octaves * 1200`. Two
/// scales are equal when their names and cumulative offsets match; the
/// description and octave count do not participate in equality.
#[derive(Debug, Clone)]
pub struct Scale {
    name: String,
    description: String,
    num_octaves: u32,
    /// Cumulative cents above the tonic, one entry per scale degree.
    intervals: Vec<f64>,
}

impl Scale {
    /// Creates a single-octave scale from pairwise interval sizes in cents.
    ///
    /// Rejects an empty sequence, any interval below one cent, and any
    /// running total past 1200 cents.
    pub fn new(name: impl Into<String>, intervals: &[f64]) -> Result<Self, ScaleError> {
        Self::with_octaves(name, intervals, 1)
    }

    /// Creates a scale spanning `num_octaves` octaves from pairwise interval
    /// sizes in cents.
    pub fn with_octaves(
        name: impl Into<String>,
        intervals: &[f64],
        num_octaves: u32,
    ) -> Result<Self, ScaleError> {
        let cumulative = cumulative_from_pairwise(intervals, num_octaves)?;

        Ok(Self {
            name: name.into(),
            description: String::new(),
            num_octaves,
            intervals: cumulative,
        })
    }

    /// Attaches a free-text description. Descriptions carry no invariants
    /// and do not participate in equality.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Creates the scale dividing one octave into `divisions` equal steps.
    ///
    /// The name is `"Chromatic Scale {divisions} TET"`. Rejects zero and
    /// anything past 1200, the one cent resolution bound.
    pub fn equal_temperament(divisions: u32) -> Result<Self, ScaleError> {
        if divisions == 0 {
            return Err(ScaleError::NoIntervals);
        }
        if f64::from(divisions) > CENTS_PER_OCTAVE {
            return Err(ScaleError::TooManyIntervals {
                count: divisions as usize,
                num_octaves: 1,
            });
        }

        // Direct multiples rather than a running sum keep the final degree
        // exactly on the octave.
        let intervals = (1..=divisions)
            .map(|i| f64::from(i) * CENTS_PER_OCTAVE / f64::from(divisions))
            .collect();

        Ok(Self {
            name: format!("Chromatic Scale {divisions} TET"),
            description: String::new(),
            num_octaves: 1,
            intervals,
        })
    }

    /// Creates a scale from normalized cumulative positions within the span.
    ///
    /// Each proportion must lie in `[0, 1]`; `1.0` is the top of the
    /// declared span. The converted pairwise intervals pass through the same
    /// validation as [`Scale::with_octaves`].
    pub fn from_proportions(
        name: impl Into<String>,
        proportions: &[f64],
        num_octaves: u32,
    ) -> Result<Self, ScaleError> {
        let pairwise = Self::proportions_to_cents(proportions, num_octaves)?;
        Self::with_octaves(name, &pairwise, num_octaves)
    }

    /// Multiplies the pairwise width of the interval at `index` by
    /// `percent_change` (1.5 widens by half, 0.5 halves).
    ///
    /// Every later degree shifts rigidly by the width delta, so all other
    /// pairwise widths are preserved. The call is rejected, with the scale
    /// untouched, when the index is out of bounds, the multiplier is not
    /// positive, the new width would drop below one cent, or the shifted
    /// final degree would leave the octave span.
    pub fn update_interval_size(
        &mut self,
        index: usize,
        percent_change: f64,
    ) -> Result<(), ScaleError> {
        let count = self.intervals.len();
        if index >= count {
            return Err(ScaleError::IntervalOutOfBounds { index, count });
        }
        if !(percent_change > 0.0) {
            return Err(ScaleError::NonPositivePercentChange(percent_change));
        }

        let previous = if index == 0 {
            0.0
        } else {
            self.intervals[index - 1]
        };
        let width = self.intervals[index] - previous;
        let new_width = width * percent_change;
        if !(new_width >= MIN_INTERVAL_CENTS) {
            return Err(ScaleError::IntervalTooSmall {
                index,
                size: new_width,
            });
        }

        let delta = new_width - width;
        let new_total = self.intervals[count - 1] + delta;
        if !(new_total <= self.span_cents()) {
            return Err(ScaleError::SpanExceeded {
                total: new_total,
                max: self.span_cents(),
            });
        }

        for cumulative in &mut self.intervals[index..] {
            *cumulative += delta;
        }
        debug!(
            "SCALE: resized interval {} of '{}' from {} to {} cents",
            index, self.name, width, new_width
        );
        Ok(())
    }

    /// Appends a pairwise interval of `size` cents after the last degree.
    ///
    /// Rejects widths below one cent and totals past the octave span,
    /// leaving the scale untouched.
    pub fn append_interval(&mut self, size: f64) -> Result<(), ScaleError> {
        if !(size >= MIN_INTERVAL_CENTS) {
            return Err(ScaleError::IntervalTooSmall {
                index: self.intervals.len(),
                size,
            });
        }

        let new_total = self.intervals[self.intervals.len() - 1] + size;
        if !(new_total <= self.span_cents()) {
            return Err(ScaleError::SpanExceeded {
                total: new_total,
                max: self.span_cents(),
            });
        }

        self.intervals.push(new_total);
        Ok(())
    }

    /// Removes the last interval. Rejects the call when only one interval
    /// remains; a scale without intervals is meaningless.
    pub fn remove_interval(&mut self) -> Result<(), ScaleError> {
        if self.intervals.len() == 1 {
            return Err(ScaleError::LastInterval);
        }

        self.intervals.pop();
        Ok(())
    }

    /// Computes the frequency of a scale degree relative to a tonic
    /// frequency.
    ///
    /// Index 0 is the tonic and returns `base_frequency` unchanged. For
    /// higher indices the interval lookup wraps modulo the interval count,
    /// and each full wrap doubles the result:
    /// `base * 2^(cents/1200) * 2^octaves_passed`. Indices that wrap more
    /// octaves than the scale declares are rejected, as is a negative
    /// `base_frequency`.
    pub fn note_frequency(
        &self,
        note_index: usize,
        base_frequency: f64,
    ) -> Result<f64, ScaleError> {
        if !(base_frequency >= 0.0) {
            return Err(ScaleError::NegativeBaseFrequency(base_frequency));
        }
        if note_index == 0 {
            return Ok(base_frequency);
        }

        let count = self.intervals.len();
        let octaves_passed = (note_index - 1) / count;
        if octaves_passed > self.num_octaves as usize {
            return Err(ScaleError::NoteOutOfRange {
                index: note_index,
                num_octaves: self.num_octaves,
            });
        }

        let cents = self.intervals[(note_index - 1) % count];
        Ok(base_frequency * (cents / CENTS_PER_OCTAVE).exp2() * 2f64.powi(octaves_passed as i32))
    }

    /// Returns the pairwise width in cents of the interval at `index`.
    pub fn interval(&self, index: usize) -> Result<f64, ScaleError> {
        let count = self.intervals.len();
        if index >= count {
            return Err(ScaleError::IntervalOutOfBounds { index, count });
        }

        let previous = if index == 0 {
            0.0
        } else {
            self.intervals[index - 1]
        };
        Ok(self.intervals[index] - previous)
    }

    /// Number of intervals in the scale.
    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    /// Number of notes in the scale, counting the tonic.
    pub fn num_notes(&self) -> usize {
        self.intervals.len() + 1
    }

    /// Cumulative position of every degree normalized by the full octave
    /// span, each value in `(0, 1]`.
    pub fn proportions(&self) -> Vec<f64> {
        let span = self.span_cents();
        self.intervals.iter().map(|cents| cents / span).collect()
    }

    /// The scale's identifying name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description, empty when none was given.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of octaves the scale spans.
    pub fn num_octaves(&self) -> u32 {
        self.num_octaves
    }

    /// Converts normalized cumulative positions to pairwise cents.
    ///
    /// Each proportion must lie in `[0, 1]` and the sequence must be
    /// non-empty. The first output is the first converted value itself; the
    /// rest are differences against the previous converted value.
    pub fn proportions_to_cents(
        proportions: &[f64],
        num_octaves: u32,
    ) -> Result<Vec<f64>, ScaleError> {
        if proportions.is_empty() {
            return Err(ScaleError::NoIntervals);
        }

        let span = f64::from(num_octaves) * CENTS_PER_OCTAVE;
        let mut pairwise = Vec::with_capacity(proportions.len());
        let mut previous = 0.0;
        for (index, &value) in proportions.iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScaleError::ProportionOutOfRange { index, value });
            }
            let cents = value * span;
            pairwise.push(cents - previous);
            previous = cents;
        }

        Ok(pairwise)
    }

    /// Converts diatonic semitone step positions to pairwise cents.
    ///
    /// The first element is the tonic reference; each later step becomes
    /// `100 * step` cents and is differenced against the previous converted
    /// value, so `[0, 3, 5, 6, 7, 10]` yields `[300, 200, 100, 100, 300]`.
    /// Steps must lie in `0..=11` and the sequence needs at least two
    /// elements.
    pub fn diatonic_to_cents(steps: &[u32]) -> Result<Vec<f64>, ScaleError> {
        if steps.len() < 2 {
            return Err(ScaleError::SequenceTooShort { count: steps.len() });
        }

        for (index, &step) in steps.iter().enumerate() {
            if step > MAX_DIATONIC_STEP {
                return Err(ScaleError::DiatonicStepOutOfRange { index, step });
            }
        }

        let mut pairwise = Vec::with_capacity(steps.len() - 1);
        let mut previous = f64::from(steps[0]) * CENTS_PER_SEMITONE;
        for &step in &steps[1..] {
            let cents = f64::from(step) * CENTS_PER_SEMITONE;
            pairwise.push(cents - previous);
            previous = cents;
        }

        Ok(pairwise)
    }

    /// Converts absolute frequencies to pairwise cents.
    ///
    /// Each frequency is measured against the first as
    /// `1200 * log2(f/f0)` and then differenced against the previous
    /// measurement. The sequence needs at least two entries and every
    /// frequency must be positive.
    pub fn frequencies_to_cents(frequencies: &[f64]) -> Result<Vec<f64>, ScaleError> {
        if frequencies.len() < 2 {
            return Err(ScaleError::SequenceTooShort {
                count: frequencies.len(),
            });
        }

        for (index, &value) in frequencies.iter().enumerate() {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ScaleError::NonPositiveFrequency { index, value });
            }
        }

        let tonic = frequencies[0];
        let mut pairwise = Vec::with_capacity(frequencies.len() - 1);
        let mut previous = 0.0;
        for &frequency in &frequencies[1..] {
            let cents = CENTS_PER_OCTAVE * (frequency / tonic).log2();
            pairwise.push(cents - previous);
            previous = cents;
        }

        Ok(pairwise)
    }

    /// Total cents available across the declared octave span.
    fn span_cents(&self) -> f64 {
        f64::from(self.num_octaves) * CENTS_PER_OCTAVE
    }
}

impl PartialEq for Scale {
    /// Name and cumulative intervals only; description and octave count are
    /// presentation details.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.intervals == other.intervals
    }
}

/// Walks a pairwise interval sequence, validating each step and collecting
/// the cumulative offsets. Shared by every pairwise constructor.
fn cumulative_from_pairwise(intervals: &[f64], num_octaves: u32) -> Result<Vec<f64>, ScaleError> {
    if intervals.is_empty() {
        return Err(ScaleError::NoIntervals);
    }

    let max_count = num_octaves as usize * CENTS_PER_OCTAVE as usize;
    if intervals.len() > max_count {
        return Err(ScaleError::TooManyIntervals {
            count: intervals.len(),
            num_octaves,
        });
    }

    let span = f64::from(num_octaves) * CENTS_PER_OCTAVE;
    let mut cumulative = Vec::with_capacity(intervals.len());
    let mut total = 0.0;
    for (index, &size) in intervals.iter().enumerate() {
        if !(size >= MIN_INTERVAL_CENTS) {
            return Err(ScaleError::IntervalTooSmall { index, size });
        }
        total += size;
        if !(total <= span) {
            return Err(ScaleError::SpanExceeded { total, max: span });
        }
        cumulative.push(total);
    }

    Ok(cumulative)
}
