//! Named scale collections loaded from JSON documents.
//!
//! A dataset document carries a top-level `"scales"` array. Every entry
//! names its scale and encodes the notes in exactly one of two forms: an
//! `"intervals"` array of diatonic semitone steps, or a `"frequencies"`
//! array of measured pitches whose outer values fix the octave span.

use std::collections::HashMap;
use std::io::Read;

use log::debug;
use serde_json::Value;
use thiserror::Error;

use crate::scale::{Scale, ScaleError};

/// A failure while loading or querying a [`ScaleDataset`].
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The document was not valid JSON.
    #[error("failed to parse dataset document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document has no top-level `"scales"` array.
    #[error("dataset document has no \"scales\" array")]
    MissingScales,

    /// An entry without a string `"name"` field.
    #[error("scale entry {index} has no name")]
    MissingName {
        /// Position of the entry in the document.
        index: usize,
    },

    /// An entry carrying both note representations.
    #[error("scale '{name}' has both intervals and frequencies")]
    ConflictingNotes {
        /// Name of the offending entry.
        name: String,
    },

    /// An entry carrying neither note representation.
    #[error("scale '{name}' has no notes")]
    MissingNotes {
        /// Name of the offending entry.
        name: String,
    },

    /// A note field that is not an array of the expected number type.
    #[error("scale '{name}' has a malformed \"{field}\" field")]
    InvalidField {
        /// Name of the offending entry.
        name: String,
        /// The field that failed to convert.
        field: &'static str,
    },

    /// An entry whose notes failed scale validation.
    #[error("scale '{name}' is not a valid scale: {source}")]
    InvalidScale {
        /// Name of the offending entry.
        name: String,
        /// The underlying validation failure.
        source: ScaleError,
    },

    /// A lookup under a name the dataset does not contain.
    #[error("no scale named '{0}' in the dataset")]
    UnknownScale(String),
}

/// An order-preserving collection of named [`Scale`]s parsed from a JSON
/// document.
///
/// Iteration and the [`names`](ScaleDataset::names) list follow document
/// order. A repeated name keeps both positions in the name list but the
/// later entry wins the lookup. When a document fails partway through,
/// entries parsed before the failure stay in the dataset.
#[derive(Debug, Default)]
pub struct ScaleDataset {
    names: Vec<String>,
    scales_by_name: HashMap<String, Scale>,
}

impl ScaleDataset {
    /// Creates an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one JSON document into a fresh dataset.
    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let mut dataset = Self::new();
        dataset.read_from(reader)?;
        Ok(dataset)
    }

    /// Parses one JSON document and appends its scales to this dataset.
    ///
    /// May be called repeatedly to merge documents. On failure the scales
    /// parsed before the offending entry remain.
    pub fn read_from(&mut self, reader: impl Read) -> Result<(), DatasetError> {
        let document: Value = serde_json::from_reader(reader)?;
        self.load_document(&document)
    }

    fn load_document(&mut self, document: &Value) -> Result<(), DatasetError> {
        let entries = document
            .get("scales")
            .and_then(Value::as_array)
            .ok_or(DatasetError::MissingScales)?;

        for (index, entry) in entries.iter().enumerate() {
            let scale = parse_entry(entry, index)?;
            debug!(
                "DATASET: loaded '{}' with {} interval(s) over {} octave(s)",
                scale.name(),
                scale.num_intervals(),
                scale.num_octaves()
            );
            self.names.push(scale.name().to_owned());
            self.scales_by_name.insert(scale.name().to_owned(), scale);
        }

        Ok(())
    }

    /// Looks up a scale by name.
    pub fn get(&self, name: &str) -> Result<&Scale, DatasetError> {
        self.scales_by_name
            .get(name)
            .ok_or_else(|| DatasetError::UnknownScale(name.to_owned()))
    }

    /// Looks up a scale by name for in-place editing.
    pub fn get_mut(&mut self, name: &str) -> Result<&mut Scale, DatasetError> {
        self.scales_by_name
            .get_mut(name)
            .ok_or_else(|| DatasetError::UnknownScale(name.to_owned()))
    }

    /// Scale names in document order, duplicates included.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of loaded entries, counting repeated names once per entry.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the dataset holds no scales.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates the scales in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Scale> {
        self.names
            .iter()
            .filter_map(|name| self.scales_by_name.get(name))
    }
}

fn parse_entry(entry: &Value, index: usize) -> Result<Scale, DatasetError> {
    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .ok_or(DatasetError::MissingName { index })?
        .to_owned();

    // A missing or mistyped description degrades to empty text.
    let description = entry
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let scale = match (entry.get("intervals"), entry.get("frequencies")) {
        (Some(_), Some(_)) => return Err(DatasetError::ConflictingNotes { name }),
        (Some(steps), None) => scale_from_steps(&name, steps)?,
        (None, Some(pitches)) => scale_from_frequencies(&name, pitches)?,
        (None, None) => return Err(DatasetError::MissingNotes { name }),
    };

    Ok(scale.with_description(description))
}

/// Builds a single-octave scale from an array of diatonic semitone steps.
fn scale_from_steps(name: &str, steps: &Value) -> Result<Scale, DatasetError> {
    let malformed = || DatasetError::InvalidField {
        name: name.to_owned(),
        field: "intervals",
    };
    let entries = steps.as_array().ok_or_else(malformed)?;

    let mut positions = Vec::with_capacity(entries.len());
    for value in entries {
        let step = value
            .as_u64()
            .and_then(|step| u32::try_from(step).ok())
            .ok_or_else(malformed)?;
        positions.push(step);
    }

    let invalid = |source| DatasetError::InvalidScale {
        name: name.to_owned(),
        source,
    };
    let cents = Scale::diatonic_to_cents(&positions).map_err(invalid)?;
    Scale::new(name, &cents).map_err(invalid)
}

/// Builds a scale from an array of measured frequencies. The span between
/// the outer frequencies fixes how many octaves the scale is modeled
/// across, never fewer than one.
fn scale_from_frequencies(name: &str, pitches: &Value) -> Result<Scale, DatasetError> {
    let malformed = || DatasetError::InvalidField {
        name: name.to_owned(),
        field: "frequencies",
    };
    let entries = pitches.as_array().ok_or_else(malformed)?;

    let mut frequencies = Vec::with_capacity(entries.len());
    for value in entries {
        frequencies.push(value.as_f64().ok_or_else(malformed)?);
    }

    let invalid = |source| DatasetError::InvalidScale {
        name: name.to_owned(),
        source,
    };
    let cents = Scale::frequencies_to_cents(&frequencies).map_err(invalid)?;

    let span = frequencies[frequencies.len() - 1] / frequencies[0];
    let num_octaves = span.log2().ceil().max(1.0) as u32;
    Scale::with_octaves(name, &cents, num_octaves).map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Pan pipe measurements spanning just under two octaves.
    const PAN_PIPE_FREQUENCIES: [f64; 8] = [
        261.6255653006,
        315.83481057014,
        401.62159853282,
        478.71605466184,
        581.25458464818,
        714.36935367713,
        884.07587347381,
        1042.8816384286,
    ];

    fn dataset_from(document: &Value) -> Result<ScaleDataset, DatasetError> {
        ScaleDataset::from_reader(document.to_string().as_bytes())
    }

    #[test]
    fn test_parse_document_with_both_entry_kinds() {
        let document = json!({
            "scales": [
                {
                    "name": "Blues",
                    "description": "Six note blues scale",
                    "intervals": [0, 3, 5, 6, 7, 10]
                },
                {
                    "name": "Bolivia",
                    "frequencies": PAN_PIPE_FREQUENCIES
                }
            ]
        });
        let dataset = dataset_from(&document).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.names(), ["Blues", "Bolivia"]);

        let blues = dataset.get("Blues").unwrap();
        let expected_cents = Scale::diatonic_to_cents(&[0, 3, 5, 6, 7, 10]).unwrap();
        assert_eq!(blues, &Scale::new("Blues", &expected_cents).unwrap());
        assert_eq!(blues.description(), "Six note blues scale");

        let bolivia = dataset.get("Bolivia").unwrap();
        assert_eq!(bolivia.num_intervals(), 7);
        assert_eq!(bolivia.num_octaves(), 2);
        assert_eq!(bolivia.description(), "");
    }

    #[test]
    fn test_iteration_follows_document_order() {
        let document = json!({
            "scales": [
                { "name": "One", "intervals": [0, 7] },
                { "name": "Two", "intervals": [0, 5] },
                { "name": "Three", "intervals": [0, 2] }
            ]
        });
        let dataset = dataset_from(&document).unwrap();
        let order: Vec<&str> = dataset.iter().map(Scale::name).collect();
        assert_eq!(order, ["One", "Two", "Three"]);
    }

    #[test]
    fn test_description_defaults_on_type_mismatch() {
        let document = json!({
            "scales": [
                { "name": "Odd", "description": 42, "intervals": [0, 4, 7] }
            ]
        });
        let dataset = dataset_from(&document).unwrap();
        assert_eq!(dataset.get("Odd").unwrap().description(), "");
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let result = ScaleDataset::from_reader("{ not json".as_bytes());
        assert!(matches!(result.unwrap_err(), DatasetError::Json(_)));
    }

    #[test]
    fn test_missing_scales_array_is_reported() {
        for document in [json!({}), json!({ "scales": {} }), json!({ "scales": 7 })] {
            assert!(matches!(
                dataset_from(&document).unwrap_err(),
                DatasetError::MissingScales
            ));
        }
    }

    #[test]
    fn test_entry_without_name_is_reported() {
        let document = json!({
            "scales": [
                { "name": "Fine", "intervals": [0, 7] },
                { "intervals": [0, 5] }
            ]
        });
        assert!(matches!(
            dataset_from(&document).unwrap_err(),
            DatasetError::MissingName { index: 1 }
        ));
    }

    #[test]
    fn test_entry_with_both_note_fields_is_reported() {
        let document = json!({
            "scales": [
                { "name": "Greedy", "intervals": [0, 7], "frequencies": [440.0, 660.0] }
            ]
        });
        match dataset_from(&document).unwrap_err() {
            DatasetError::ConflictingNotes { name } => assert_eq!(name, "Greedy"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_entry_with_no_note_fields_is_reported() {
        let document = json!({
            "scales": [ { "name": "Silent" } ]
        });
        match dataset_from(&document).unwrap_err() {
            DatasetError::MissingNotes { name } => assert_eq!(name, "Silent"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_note_arrays_are_reported() {
        let not_an_array = json!({
            "scales": [ { "name": "Bad", "intervals": "0 3 5" } ]
        });
        assert!(matches!(
            dataset_from(&not_an_array).unwrap_err(),
            DatasetError::InvalidField { field: "intervals", .. }
        ));

        let negative_step = json!({
            "scales": [ { "name": "Bad", "intervals": [0, -3, 5] } ]
        });
        assert!(matches!(
            dataset_from(&negative_step).unwrap_err(),
            DatasetError::InvalidField { field: "intervals", .. }
        ));

        let stringy_pitch = json!({
            "scales": [ { "name": "Bad", "frequencies": [440.0, "880"] } ]
        });
        assert!(matches!(
            dataset_from(&stringy_pitch).unwrap_err(),
            DatasetError::InvalidField { field: "frequencies", .. }
        ));
    }

    #[test]
    fn test_invalid_scale_carries_validation_failure() {
        let document = json!({
            "scales": [ { "name": "Wild", "intervals": [0, 5, 12] } ]
        });
        match dataset_from(&document).unwrap_err() {
            DatasetError::InvalidScale { name, source } => {
                assert_eq!(name, "Wild");
                assert_eq!(
                    source,
                    ScaleError::DiatonicStepOutOfRange { index: 2, step: 12 }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_failure_keeps_prior_entries() {
        let document = json!({
            "scales": [
                { "name": "Kept", "intervals": [0, 4, 7] },
                { "name": "Broken", "intervals": [0, 99] },
                { "name": "Never", "intervals": [0, 5] }
            ]
        });
        let mut dataset = ScaleDataset::new();
        let result = dataset.read_from(document.to_string().as_bytes());

        assert!(result.is_err());
        assert_eq!(dataset.names(), ["Kept"]);
        assert!(dataset.get("Kept").is_ok());
        assert!(dataset.get("Never").is_err());
    }

    #[test]
    fn test_duplicate_names_last_write_wins() {
        let document = json!({
            "scales": [
                { "name": "Same", "intervals": [0, 4, 7] },
                { "name": "Same", "intervals": [0, 5, 10] }
            ]
        });
        let dataset = dataset_from(&document).unwrap();

        assert_eq!(dataset.names(), ["Same", "Same"]);
        let scale = dataset.get("Same").unwrap();
        assert_eq!(scale.interval(0).unwrap(), 500.0);
    }

    #[test]
    fn test_lookup_unknown_name_is_reported() {
        let dataset = ScaleDataset::new();
        assert!(matches!(
            dataset.get("Nowhere").unwrap_err(),
            DatasetError::UnknownScale(name) if name == "Nowhere"
        ));
    }

    #[test]
    fn test_get_mut_allows_in_place_edits() {
        let document = json!({
            "scales": [ { "name": "Edit Me", "intervals": [0, 4, 7] } ]
        });
        let mut dataset = dataset_from(&document).unwrap();

        dataset
            .get_mut("Edit Me")
            .unwrap()
            .update_interval_size(0, 0.5)
            .unwrap();

        let scale = dataset.get("Edit Me").unwrap();
        assert_eq!(scale.interval(0).unwrap(), 200.0);
        assert_eq!(scale.interval(1).unwrap(), 300.0);
    }

    #[test]
    fn test_reading_twice_appends() {
        let first = json!({ "scales": [ { "name": "First", "intervals": [0, 7] } ] });
        let second = json!({ "scales": [ { "name": "Second", "intervals": [0, 5] } ] });

        let mut dataset = ScaleDataset::new();
        dataset.read_from(first.to_string().as_bytes()).unwrap();
        dataset.read_from(second.to_string().as_bytes()).unwrap();

        assert_eq!(dataset.names(), ["First", "Second"]);
    }

    #[test]
    fn test_octave_count_from_frequency_span() {
        // Under one octave of span still models a full octave.
        let narrow = json!({
            "scales": [ { "name": "Narrow", "frequencies": [440.0, 550.0, 660.0] } ]
        });
        let dataset = dataset_from(&narrow).unwrap();
        assert_eq!(dataset.get("Narrow").unwrap().num_octaves(), 1);

        // Just past one doubling rounds up to two.
        let wide = json!({
            "scales": [ { "name": "Wide", "frequencies": PAN_PIPE_FREQUENCIES } ]
        });
        let dataset = dataset_from(&wide).unwrap();
        assert_eq!(dataset.get("Wide").unwrap().num_octaves(), 2);
    }

    #[test]
    fn test_empty_scales_array_loads_nothing() {
        let dataset = dataset_from(&json!({ "scales": [] })).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.len(), 0);
    }
}
