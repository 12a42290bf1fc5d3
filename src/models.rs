//! Data models for prediction results.
//!
//! This module contains the core data structures shared by the parser,
//! the aggregator and the report generators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Episode identifier used when a frame name carries no numeric prefix.
pub const UNKNOWN_EPISODE: &str = "unknown";

/// Names of the two subjects a frame is classified for.
///
/// The names double as the boolean field names inside the model's
/// response payload and as prefixes for CSV column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelNames {
    pub subject_a: String,
    pub subject_b: String,
}

impl Default for LabelNames {
    fn default() -> Self {
        Self {
            subject_a: "pat".to_string(),
            subject_b: "mat".to_string(),
        }
    }
}

impl LabelNames {
    pub fn new(subject_a: impl Into<String>, subject_b: impl Into<String>) -> Self {
        Self {
            subject_a: subject_a.into(),
            subject_b: subject_b.into(),
        }
    }

    /// Display form of the first subject (`pat` -> `Pat`).
    pub fn display_a(&self) -> String {
        capitalize(&self.subject_a)
    }

    /// Display form of the second subject.
    pub fn display_b(&self) -> String {
        capitalize(&self.subject_b)
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Boolean rendering used in reports and CSV headers.
pub fn bool_label(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Outcome of the two-subject detection for a single frame.
///
/// Ordering follows the pair: `(false, false) < (false, true) < (true, false) < (true, true)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Classification {
    pub subject_a: bool,
    pub subject_b: bool,
}

impl Classification {
    pub fn new(subject_a: bool, subject_b: bool) -> Self {
        Self {
            subject_a,
            subject_b,
        }
    }

    /// Human-readable form, e.g. `Pat: True, Mat: False`.
    pub fn describe(&self, labels: &LabelNames) -> String {
        format!(
            "{}: {}, {}: {}",
            labels.display_a(),
            bool_label(self.subject_a),
            labels.display_b(),
            bool_label(self.subject_b)
        )
    }

    /// CSV column prefix, e.g. `pat_True_mat_False`.
    pub fn column_prefix(&self, labels: &LabelNames) -> String {
        format!(
            "{}_{}_{}_{}",
            labels.subject_a,
            bool_label(self.subject_a),
            labels.subject_b,
            bool_label(self.subject_b)
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})",
            bool_label(self.subject_a),
            bool_label(self.subject_b)
        )
    }
}

/// A single successfully parsed result line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRecord {
    /// Identifier of the source frame, e.g. `03_SomeTitle-7.jpg`.
    pub frame_id: String,
    /// Episode the frame belongs to, derived from `frame_id`.
    pub episode_id: String,
    pub classification: Classification,
}

impl PredictionRecord {
    /// Build a record, deriving the episode from the frame identifier.
    pub fn new(frame_id: String, classification: Classification) -> Self {
        let episode_id = episode_id_from_frame(&frame_id);
        Self {
            frame_id,
            episode_id,
            classification,
        }
    }
}

/// Extract the episode identifier from a frame identifier.
///
/// The identifier is the leading run of ASCII digits when it is immediately
/// followed by an underscore. Anything else yields [`UNKNOWN_EPISODE`].
pub fn episode_id_from_frame(frame_id: &str) -> String {
    let digits = frame_id.bytes().take_while(u8::is_ascii_digit).count();

    if digits > 0 && frame_id.as_bytes().get(digits) == Some(&b'_') {
        frame_id[..digits].to_string()
    } else {
        UNKNOWN_EPISODE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_ordering() {
        let ff = Classification::new(false, false);
        let ft = Classification::new(false, true);
        let tf = Classification::new(true, false);
        let tt = Classification::new(true, true);

        assert!(ff < ft);
        assert!(ft < tf);
        assert!(tf < tt);
    }

    #[test]
    fn test_episode_id_extraction() {
        assert_eq!(episode_id_from_frame("03_Title.jpg"), "03");
        assert_eq!(episode_id_from_frame("Title.jpg"), UNKNOWN_EPISODE);
        assert_eq!(episode_id_from_frame("003_Title-7.jpg"), "003");
        assert_eq!(episode_id_from_frame("03_SomeTitle/0007.jpg"), "03");
    }

    #[test]
    fn test_episode_id_requires_underscore() {
        assert_eq!(episode_id_from_frame("03-Title.jpg"), UNKNOWN_EPISODE);
        assert_eq!(episode_id_from_frame("0042"), UNKNOWN_EPISODE);
        assert_eq!(episode_id_from_frame("_Title.jpg"), UNKNOWN_EPISODE);
        assert_eq!(episode_id_from_frame(""), UNKNOWN_EPISODE);
    }

    #[test]
    fn test_record_derives_episode() {
        let record = PredictionRecord::new(
            "12_Painting-3.jpg".to_string(),
            Classification::new(true, true),
        );
        assert_eq!(record.episode_id, "12");
    }

    #[test]
    fn test_describe_and_column_prefix() {
        let labels = LabelNames::default();
        let c = Classification::new(true, false);

        assert_eq!(c.describe(&labels), "Pat: True, Mat: False");
        assert_eq!(c.column_prefix(&labels), "pat_True_mat_False");
        assert_eq!(c.to_string(), "(True, False)");
    }

    #[test]
    fn test_custom_label_names() {
        let labels = LabelNames::new("bob", "builder");
        assert_eq!(labels.display_a(), "Bob");
        assert_eq!(
            Classification::new(false, true).column_prefix(&labels),
            "bob_False_builder_True"
        );
    }
}
