//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// verdict-tally - summarize batch vision-model results per episode
///
/// Reads a JSONL file written by a batch prediction job, where every line
/// pairs a frame request with the model's two-subject JSON verdict, and
/// prints per-episode and overall distributions.
///
/// Examples:
///   verdict-tally predictions.jsonl
///   verdict-tally predictions.jsonl --csv episodes.csv
///   verdict-tally predictions.jsonl --frames-csv frames.csv --format json
///   verdict-tally predictions.jsonl --subject-a bob --subject-b builder
///   verdict-tally --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSONL file with batch prediction results
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Write the per-episode table to this CSV file (overwritten if present)
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Write one CSV row per valid frame to this file (overwritten if present)
    #[arg(long, value_name = "FILE")]
    pub frames_csv: Option<PathBuf>,

    /// Summary format on stdout (text, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Payload field holding the first subject's verdict
    ///
    /// Also used as the first prefix of CSV pair columns. Default: pat
    #[arg(long, value_name = "NAME", env = "VERDICT_TALLY_SUBJECT_A")]
    pub subject_a: Option<String>,

    /// Payload field holding the second subject's verdict
    ///
    /// Default: mat
    #[arg(long, value_name = "NAME", env = "VERDICT_TALLY_SUBJECT_B")]
    pub subject_b: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .verdict-tally.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not draw the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .verdict-tally.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Format of the summary printed on stdout.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.input.is_none() {
            return Err("An input file is required".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        for name in [&self.subject_a, &self.subject_b].into_iter().flatten() {
            crate::config::validate_subject_name(name)?;
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Whether the progress spinner should be drawn.
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}
