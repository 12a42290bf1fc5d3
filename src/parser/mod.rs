//! Batch result line parsing.
//!
//! Each input line is a JSON object pairing the original request with the
//! model's response. The parser walks the nested fields explicitly so every
//! failure names the exact path that was missing or malformed.

use crate::error::ParseError;
use crate::models::{Classification, LabelNames, PredictionRecord};
use serde_json::Value;

/// One step along a nested JSON path.
#[derive(Debug, Clone, Copy)]
enum Segment {
    Key(&'static str),
    Index(usize),
}

/// `request.labels.frame`
const FRAME_PATH: &[Segment] = &[
    Segment::Key("request"),
    Segment::Key("labels"),
    Segment::Key("frame"),
];

/// `response.candidates[0].content.parts[0].text`
const PAYLOAD_PATH: &[Segment] = &[
    Segment::Key("response"),
    Segment::Key("candidates"),
    Segment::Index(0),
    Segment::Key("content"),
    Segment::Key("parts"),
    Segment::Index(0),
    Segment::Key("text"),
];

/// Render the first `len` segments of a path, e.g. `response.candidates[0]`.
fn render_path(path: &[Segment], len: usize) -> String {
    let mut rendered = String::new();
    for segment in &path[..len] {
        match segment {
            Segment::Key(key) => {
                if !rendered.is_empty() {
                    rendered.push('.');
                }
                rendered.push_str(key);
            }
            Segment::Index(index) => rendered.push_str(&format!("[{}]", index)),
        }
    }
    rendered
}

/// Follow `path` from `root`, stopping at the first missing step.
fn lookup<'a>(root: &'a Value, path: &[Segment]) -> Result<&'a Value, ParseError> {
    let mut current = root;

    for (depth, segment) in path.iter().enumerate() {
        let next = match segment {
            Segment::Key(key) => current.get(*key),
            Segment::Index(index) => current.get(*index),
        };

        current = next.ok_or_else(|| ParseError::MissingField {
            path: render_path(path, depth + 1),
        })?;
    }

    Ok(current)
}

/// Follow `path` and require the value there to be a string.
fn lookup_str<'a>(root: &'a Value, path: &[Segment]) -> Result<&'a str, ParseError> {
    lookup(root, path)?
        .as_str()
        .ok_or_else(|| ParseError::WrongType {
            path: render_path(path, path.len()),
            expected: "a string",
        })
}

/// Parser for batch prediction result lines.
#[derive(Debug, Clone, Default)]
pub struct RecordParser {
    labels: LabelNames,
}

impl RecordParser {
    /// Create a parser reading the given subject labels from the payload.
    pub fn new(labels: LabelNames) -> Self {
        Self { labels }
    }

    /// Parse one raw line into a record.
    pub fn parse_line(&self, line: &str) -> Result<PredictionRecord, ParseError> {
        let entry: Value = serde_json::from_str(line).map_err(|e| ParseError::InvalidJson {
            message: e.to_string(),
        })?;

        let frame_id = lookup_str(&entry, FRAME_PATH)?;
        let payload_text = lookup_str(&entry, PAYLOAD_PATH)?;
        let classification = self.parse_payload(payload_text)?;

        Ok(PredictionRecord::new(frame_id.to_string(), classification))
    }

    /// Decode the model's JSON answer into a classification pair.
    pub fn parse_payload(&self, text: &str) -> Result<Classification, ParseError> {
        let payload: Value =
            serde_json::from_str(text).map_err(|e| ParseError::InvalidPayload {
                message: e.to_string(),
            })?;

        let subject_a = read_label(&payload, &self.labels.subject_a)?;
        let subject_b = read_label(&payload, &self.labels.subject_b)?;

        Ok(Classification::new(subject_a, subject_b))
    }
}

fn read_label(payload: &Value, field: &str) -> Result<bool, ParseError> {
    let value = payload.get(field).ok_or_else(|| ParseError::MissingLabel {
        field: field.to_string(),
    })?;

    value.as_bool().ok_or_else(|| ParseError::LabelNotBoolean {
        field: field.to_string(),
    })
}
