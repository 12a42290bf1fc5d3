//! Summary report generation.
//!
//! This module turns a finished aggregation into a serializable summary
//! and renders it as plain text or JSON.

use crate::analysis::{percentage, AggregationState, PairCounts, RunStats};
use crate::config::ReportConfig;
use crate::models::{Classification, LabelNames};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Count and share of one classification pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationShare {
    pub subject_a: bool,
    pub subject_b: bool,
    pub count: u64,
    /// Percentage of the enclosing total, 0 when that total is 0.
    pub percentage: f64,
}

impl ClassificationShare {
    pub fn classification(&self) -> Classification {
        Classification::new(self.subject_a, self.subject_b)
    }
}

/// Breakdown for a single episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode: String,
    pub total_frames: u64,
    pub breakdown: Vec<ClassificationShare>,
}

/// Metadata about the run that produced a summary.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryMetadata {
    /// Input file the results were read from.
    pub input: String,
    pub generated_at: DateTime<Utc>,
    pub lines_read: usize,
    pub blank_lines: usize,
    pub entries_processed: usize,
    pub lines_skipped: usize,
    pub duration_seconds: f64,
}

/// The complete summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub metadata: SummaryMetadata,
    pub labels: LabelNames,
    pub total_entries: u64,
    pub episodes: Vec<EpisodeSummary>,
    pub overall: Vec<ClassificationShare>,
}

impl Summary {
    /// Build a summary from a finished aggregation.
    pub fn from_state(
        state: &AggregationState,
        stats: &RunStats,
        labels: &LabelNames,
        input: &str,
        duration_seconds: f64,
    ) -> Self {
        let episodes = state
            .per_episode_totals()
            .into_iter()
            .map(|(episode, total)| {
                let breakdown = state
                    .episode_counts(&episode)
                    .map(|counts| shares(counts, total))
                    .unwrap_or_default();
                EpisodeSummary {
                    episode,
                    total_frames: total,
                    breakdown,
                }
            })
            .collect();

        let grand_total = state.grand_total();

        Self {
            metadata: SummaryMetadata {
                input: input.to_string(),
                generated_at: Utc::now(),
                lines_read: stats.lines_read,
                blank_lines: stats.blank_lines,
                entries_processed: stats.entries_processed,
                lines_skipped: stats.lines_skipped,
                duration_seconds,
            },
            labels: labels.clone(),
            total_entries: grand_total,
            episodes,
            overall: shares(&state.overall_counts(), grand_total),
        }
    }
}

fn shares(counts: &PairCounts, total: u64) -> Vec<ClassificationShare> {
    counts
        .iter()
        .map(|(classification, &count)| ClassificationShare {
            subject_a: classification.subject_a,
            subject_b: classification.subject_b,
            count,
            percentage: percentage(count, total),
        })
        .collect()
}

/// Render the human-readable summary.
pub fn generate_text_report(summary: &Summary, options: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\nTotal entries processed: {}\n",
        summary.total_entries
    ));

    if summary.metadata.lines_skipped > 0 {
        output.push_str(&format!(
            "Lines skipped: {}\n",
            summary.metadata.lines_skipped
        ));
    }

    if options.show_episodes {
        output.push_str(&generate_episodes_section(summary));
    }

    if options.show_overall {
        output.push_str(&generate_overall_section(summary));
    }

    output
}

fn generate_episodes_section(summary: &Summary) -> String {
    let mut section = String::new();

    section.push_str("\nPer-episode breakdown:\n");

    for episode in &summary.episodes {
        section.push_str(&format!(
            "\nEpisode {} ({} frames):\n",
            episode.episode, episode.total_frames
        ));
        for share in &episode.breakdown {
            section.push_str(&format!("  {}\n", share_line(share, &summary.labels)));
        }
    }

    section
}

fn generate_overall_section(summary: &Summary) -> String {
    let mut section = String::new();

    section.push_str("\nOverall distribution:\n");
    for share in &summary.overall {
        section.push_str(&share_line(share, &summary.labels));
        section.push('\n');
    }

    section
}

fn share_line(share: &ClassificationShare, labels: &LabelNames) -> String {
    format!(
        "{} - Count: {} ({:.2}%)",
        share.classification().describe(labels),
        share.count,
        share.percentage
    )
}

/// Render the summary as pretty-printed JSON.
pub fn generate_json_report(summary: &Summary) -> Result<String> {
    serde_json::to_string_pretty(summary).map_err(Into::into)
}
