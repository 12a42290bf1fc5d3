//! CSV exports.
//!
//! Two tables are produced: a wide per-episode table whose pair columns are
//! the union of every pair seen in the run, and a per-frame table streamed
//! one row per record.

use crate::analysis::{format_percentage, AggregationState};
use crate::error::OutputError;
use crate::models::{bool_label, LabelNames, PredictionRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Quote a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn csv_row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut row = fields
        .into_iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    row.push('\n');
    row
}

/// Render the per-episode table.
///
/// Columns: `episode`, `total_frames`, then `<prefix>_count` and
/// `<prefix>_percentage` for every observed classification pair.
pub fn episode_csv(state: &AggregationState, labels: &LabelNames) -> String {
    let pairs = state.observed_pairs();
    let mut output = String::new();

    let mut header = vec!["episode".to_string(), "total_frames".to_string()];
    for pair in &pairs {
        let prefix = pair.column_prefix(labels);
        header.push(format!("{}_count", prefix));
        header.push(format!("{}_percentage", prefix));
    }
    output.push_str(&csv_row(&header));

    for (episode, counts) in state.per_episode_counts() {
        let total = state.episode_total(episode);
        let mut row = vec![episode.clone(), total.to_string()];

        for pair in &pairs {
            let count = counts.get(pair).copied().unwrap_or(0);
            row.push(count.to_string());
            row.push(format_percentage(count, total));
        }
        output.push_str(&csv_row(&row));
    }

    output
}

/// Write the per-episode table to `path`, replacing any existing file.
pub fn write_episode_csv(
    state: &AggregationState,
    labels: &LabelNames,
    path: &Path,
) -> Result<(), OutputError> {
    let content = episode_csv(state, labels);
    std::fs::write(path, content).map_err(|e| OutputError::write(path, e))?;

    info!(
        "Wrote {} episode rows to {}",
        state.episode_count(),
        path.display()
    );
    Ok(())
}

/// Streaming writer for the per-frame table.
pub struct FrameCsvWriter<W: Write> {
    writer: W,
    path: PathBuf,
    rows: usize,
}

impl FrameCsvWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path` and write the header.
    pub fn create(path: &Path, labels: &LabelNames) -> Result<Self, OutputError> {
        let file = File::create(path).map_err(|e| OutputError::write(path, e))?;
        debug!("Created frame CSV: {}", path.display());
        Self::new(BufWriter::new(file), path, labels)
    }
}

impl<W: Write> FrameCsvWriter<W> {
    /// Wrap a writer and emit the header row.
    pub fn new(mut writer: W, path: &Path, labels: &LabelNames) -> Result<Self, OutputError> {
        let header = csv_row([
            "frame",
            "episode",
            labels.subject_a.as_str(),
            labels.subject_b.as_str(),
        ]);
        writer
            .write_all(header.as_bytes())
            .map_err(|e| OutputError::write(path, e))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
        })
    }

    /// Append one record.
    pub fn write_record(&mut self, record: &PredictionRecord) -> Result<(), OutputError> {
        let row = csv_row([
            record.frame_id.as_str(),
            record.episode_id.as_str(),
            bool_label(record.classification.subject_a),
            bool_label(record.classification.subject_b),
        ]);

        self.writer
            .write_all(row.as_bytes())
            .map_err(|e| OutputError::write(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush buffered rows and return the writer with the number of rows written.
    pub fn finish(mut self) -> Result<(W, usize), OutputError> {
        self.writer
            .flush()
            .map_err(|e| OutputError::write(&self.path, e))?;

        info!("Wrote {} frame rows to {}", self.rows, self.path.display());
        Ok((self.writer, self.rows))
    }
}
