//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.verdict-tally.toml` files.

use crate::cli::{Args, OutputFormat};
use crate::models::LabelNames;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".verdict-tally.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Subject label names.
    #[serde(default)]
    pub labels: LabelsConfig,

    /// Summary settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Names of the boolean fields in the model's response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_subject_a")]
    pub subject_a: String,

    #[serde(default = "default_subject_b")]
    pub subject_b: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        let names = LabelNames::default();
        Self {
            subject_a: names.subject_a,
            subject_b: names.subject_b,
        }
    }
}

impl LabelsConfig {
    pub fn names(&self) -> LabelNames {
        LabelNames::new(self.subject_a.clone(), self.subject_b.clone())
    }
}

fn default_subject_a() -> String {
    LabelNames::default().subject_a
}

fn default_subject_b() -> String {
    LabelNames::default().subject_b
}

/// Summary rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Print the per-episode breakdown.
    #[serde(default = "default_true")]
    pub show_episodes: bool,

    /// Print the overall distribution.
    #[serde(default = "default_true")]
    pub show_overall: bool,

    /// Summary format on stdout.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            show_episodes: true,
            show_overall: true,
            format: OutputFormat::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Optional file outputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Per-episode CSV destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,

    /// Per-frame CSV destination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_csv: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load the configuration file from `dir`.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref name) = args.subject_a {
            self.labels.subject_a = name.clone();
        }
        if let Some(ref name) = args.subject_b {
            self.labels.subject_b = name.clone();
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }

        if let Some(ref csv) = args.csv {
            self.output.csv = Some(csv.clone());
        }
        if let Some(ref frames_csv) = args.frames_csv {
            self.output.frames_csv = Some(frames_csv.clone());
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings that may have come from a file.
    pub fn validate(&self) -> Result<(), String> {
        validate_subject_name(&self.labels.subject_a)?;
        validate_subject_name(&self.labels.subject_b)?;

        if self.labels.subject_a == self.labels.subject_b {
            return Err(format!(
                "Subject names must differ (both are '{}')",
                self.labels.subject_a
            ));
        }

        Ok(())
    }

    /// Reject output destinations that would overwrite the input or each other.
    ///
    /// Checked on the merged configuration, so paths from the config file
    /// and from the command line are treated alike.
    pub fn validate_output_paths(&self, input: &Path) -> Result<(), String> {
        let outputs = [
            ("--csv", self.output.csv.as_deref()),
            ("--frames-csv", self.output.frames_csv.as_deref()),
        ];

        for (flag, path) in outputs {
            if let Some(path) = path {
                if same_file(path, input) {
                    return Err(format!(
                        "{} output {} is the input file",
                        flag,
                        path.display()
                    ));
                }
            }
        }

        if let (Some(csv), Some(frames_csv)) = (&self.output.csv, &self.output.frames_csv) {
            if same_file(csv, frames_csv) {
                return Err(format!(
                    "--csv and --frames-csv both point to {}",
                    csv.display()
                ));
            }
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

/// Resolve `path` as far as the filesystem allows.
///
/// Existing files are canonicalized; for a file that does not exist yet the
/// parent directory is canonicalized and the file name re-attached.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    match (std::fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// Whether two paths name the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    a == b || resolve_path(a) == resolve_path(b)
}

/// Subject names end up in CSV headers, so keep them to plain tokens.
pub fn validate_subject_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Subject name must not be empty".to_string());
    }

    if name
        .chars()
        .any(|c| c == ',' || c == '"' || c.is_whitespace())
    {
        return Err(format!(
            "Subject name '{}' must not contain commas, quotes or whitespace",
            name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.labels.subject_a, "pat");
        assert_eq!(config.labels.subject_b, "mat");
        assert!(config.report.show_episodes);
        assert!(config.report.show_overall);
        assert_eq!(config.report.format, OutputFormat::Text);
        assert!(config.output.csv.is_none());
    }

    #[test]
    fn test_default_labels_match_label_names() {
        assert_eq!(LabelsConfig::default().names(), LabelNames::default());

        let parsed: LabelsConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.names(), LabelNames::default());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[labels]
subject_a = "bob"
subject_b = "builder"

[report]
show_overall = false
format = "json"

[output]
csv = "episodes.csv"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.labels.names(), LabelNames::new("bob", "builder"));
        assert!(config.report.show_episodes);
        assert!(!config.report.show_overall);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.output.csv, Some(PathBuf::from("episodes.csv")));
        assert!(config.output.frames_csv.is_none());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.output.csv = Some(PathBuf::from("from_config.csv"));

        let mut args = make_args();
        args.subject_b = Some("builder".to_string());
        args.format = Some(OutputFormat::Json);
        args.frames_csv = Some(PathBuf::from("frames.csv"));
        config.merge_with_args(&args);

        assert_eq!(config.labels.subject_a, "pat");
        assert_eq!(config.labels.subject_b, "builder");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.output.csv, Some(PathBuf::from("from_config.csv")));
        assert_eq!(config.output.frames_csv, Some(PathBuf::from("frames.csv")));

        args.csv = Some(PathBuf::from("from_args.csv"));
        config.merge_with_args(&args);
        assert_eq!(config.output.csv, Some(PathBuf::from("from_args.csv")));
    }

    #[test]
    fn test_validate_subject_names() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.labels.subject_b = "pat".to_string();
        assert!(config.validate().is_err());

        config.labels.subject_b = "mat, too".to_string();
        assert!(config.validate().is_err());

        config.labels.subject_b = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_path_clashes() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("results.jsonl");
        std::fs::write(&input, "{}\n").unwrap();

        let mut config = Config::default();
        assert!(config.validate_output_paths(&input).is_ok());

        config.output.frames_csv = Some(input.clone());
        assert!(config.validate_output_paths(&input).is_err());

        // Same file spelled through a `.` component
        config.output.frames_csv = None;
        config.output.csv = Some(dir.path().join(".").join("results.jsonl"));
        assert!(config.validate_output_paths(&input).is_err());

        std::fs::create_dir(dir.path().join("sub")).unwrap();
        config.output.csv = Some(dir.path().join("episodes.csv"));
        config.output.frames_csv = Some(dir.path().join("sub").join("..").join("episodes.csv"));
        assert!(config.validate_output_paths(&input).is_err());

        config.output.frames_csv = Some(dir.path().join("frames.csv"));
        assert!(config.validate_output_paths(&input).is_ok());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[labels]\nsubject_a = \"left\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.labels.subject_a, "left");
        assert_eq!(config.labels.subject_b, "mat");

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[labels\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[labels]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.labels.subject_a, "pat");
    }
}
