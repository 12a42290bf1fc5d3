//! Analysis of batch prediction results.
//!
//! Lines stream from the reader, are parsed into records, malformed ones are
//! logged and dropped, and the rest are folded into an [`AggregationState`].

pub mod aggregator;

pub use aggregator::*;

use crate::models::PredictionRecord;
use crate::parser::RecordParser;
use crate::reader::ResultReader;
use anyhow::Result;
use indicatif::ProgressBar;
use std::io::BufRead;
use tracing::{debug, warn};

/// Longest prefix of a rejected line echoed in debug logs.
const SNIPPET_CHARS: usize = 120;

/// Line accounting for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Every line pulled from the input, blank or not.
    pub lines_read: usize,
    /// Whitespace-only lines.
    pub blank_lines: usize,
    /// Lines turned into records.
    pub entries_processed: usize,
    /// Lines rejected by the parser.
    pub lines_skipped: usize,
}

/// Result of a complete pass over the input.
#[derive(Debug, Clone, Default)]
pub struct TallyOutcome {
    pub state: AggregationState,
    pub stats: RunStats,
}

/// Stream every line of `reader` through `parser` and aggregate the results.
///
/// `on_record` sees each valid record in input order before it is counted;
/// an error from it aborts the run. Per-line parse failures never do.
pub fn tally<R, F>(
    reader: ResultReader<R>,
    parser: &RecordParser,
    progress: Option<&ProgressBar>,
    mut on_record: F,
) -> Result<TallyOutcome>
where
    R: BufRead,
    F: FnMut(&PredictionRecord) -> Result<()>,
{
    let mut outcome = TallyOutcome::default();

    for line in reader {
        let line = line?;
        outcome.stats.lines_read += 1;

        if let Some(pb) = progress {
            pb.inc(1);
        }

        if line.is_blank() {
            debug!("Line {}: blank, ignoring", line.number);
            outcome.stats.blank_lines += 1;
            continue;
        }

        let parsed = line
            .content
            .as_deref()
            .map_err(Clone::clone)
            .and_then(|text| parser.parse_line(text));

        match parsed {
            Ok(record) => {
                on_record(&record)?;
                outcome.state.record(&record);
                outcome.stats.entries_processed += 1;
            }
            Err(e) => {
                warn!("Skipping line {}: {}", line.number, e);
                if let Ok(text) = &line.content {
                    debug!("Line {} content: {}", line.number, snippet(text));
                }
                outcome.stats.lines_skipped += 1;
            }
        }
    }

    Ok(outcome)
}

fn snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_CHARS {
        let head: String = text.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
