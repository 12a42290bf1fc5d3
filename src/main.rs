//! verdict-tally - batch prediction result summarizer
//!
//! Reads the JSONL output of a batch vision-model job, counts the
//! two-subject verdicts per episode, and reports the distribution as
//! text, JSON and CSV.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Fatal error (missing or unreadable input, unwritable output,
//!       invalid arguments or configuration)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod parser;
mod reader;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use parser::RecordParser;
use reader::ResultReader;
use report::{FrameCsvWriter, Summary};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Resolve configuration before logging so the config can raise verbosity
    let (mut config, source) = match resolve_config(&args) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(log_level(&args, &config));

    info!("verdict-tally v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    source.log();

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    match run(&args, &config) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .verdict-tally.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to customize subject labels, report sections, and outputs.");
    Ok(())
}

/// Where the configuration came from, logged once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    BrokenDefault(anyhow::Error),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
            ConfigSource::Defaults => debug!("No config file found, using defaults"),
            ConfigSource::BrokenDefault(e) => {
                warn!("Failed to load config: {:#}. Using defaults.", e)
            }
        }
    }
}

/// Load configuration from an explicit path, the default file, or defaults.
fn resolve_config(args: &Args) -> Result<(Config, ConfigSource)> {
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Defaults)),
        Err(e) => Ok((Config::default(), ConfigSource::BrokenDefault(e))),
    }
}

fn log_level(args: &Args, config: &Config) -> tracing::Level {
    if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    }
}

/// Initialize logging. Logs go to stderr so stdout carries only the report.
///
/// `RUST_LOG` takes precedence over the verbosity flags when set.
fn init_logging(level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} lines read")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Read, aggregate and report. Any error here is fatal for the run.
fn run(args: &Args, config: &Config) -> Result<()> {
    let start_time = Instant::now();

    let input = args
        .input
        .as_deref()
        .context("An input file is required")?;
    let labels = config.labels.names();

    config
        .validate_output_paths(input)
        .map_err(anyhow::Error::msg)?;

    // Open the input before creating any output so a missing input leaves nothing behind
    let reader = ResultReader::open(input)?;
    info!("Reading results from: {}", input.display());

    let mut frames_writer = match config.output.frames_csv {
        Some(ref path) => Some(FrameCsvWriter::create(path, &labels)?),
        None => None,
    };

    let progress = args.show_progress().then(spinner);
    let parser = RecordParser::new(labels.clone());

    let outcome = analysis::tally(reader, &parser, progress.as_ref(), |record| {
        if let Some(writer) = frames_writer.as_mut() {
            writer.write_record(record)?;
        }
        Ok(())
    });

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let outcome = outcome?;

    if let Some(writer) = frames_writer {
        writer.finish()?;
    }

    let duration = start_time.elapsed().as_secs_f64();
    info!(
        "Read {} lines: {} entries processed, {} skipped, {} blank ({:.2}s)",
        outcome.stats.lines_read,
        outcome.stats.entries_processed,
        outcome.stats.lines_skipped,
        outcome.stats.blank_lines,
        duration
    );

    if outcome.state.is_empty() {
        warn!("No valid entries found in {}", input.display());
    }

    let summary = Summary::from_state(
        &outcome.state,
        &outcome.stats,
        &labels,
        &input.display().to_string(),
        duration,
    );

    let rendered = match config.report.format {
        OutputFormat::Text => report::generate_text_report(&summary, &config.report),
        OutputFormat::Json => report::generate_json_report(&summary)?,
    };
    println!("{}", rendered);

    if let Some(ref csv_path) = config.output.csv {
        report::write_episode_csv(&outcome.state, &labels, csv_path)?;
    }

    Ok(())
}
