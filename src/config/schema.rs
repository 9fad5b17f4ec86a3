//! Configuration schema definitions for gridreport.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── ReportSettings   - Which run to aggregate and how to read it
//! ├── TimingSettings   - Where historical timing baselines live
//! └── OutputSettings   - What gets rendered
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::junit::XmlLayout;

/// Root configuration structure for gridreport.
///
/// # TOML Structure
///
/// ```toml
/// [report]
/// run_root = "results/2024-05-01_10-00-00"
/// platform = "android"
/// flaky_test_attempts = 2
///
/// [timing]
/// store_dir = "~/.gridreport/timing"
/// baseline_key = "app-debug.apk"
///
/// [output]
/// junit_file = "JUnitReport.xml"
/// ```
///
/// # Example
///
/// ```
/// use gridreport::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     [report]
///     run_root = "results/run-1"
/// "#).unwrap();
/// assert_eq!(config.output.junit_file, "JUnitReport.xml");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// The run to aggregate.
    pub report: ReportSettings,

    /// Historical timing store (optional, has defaults).
    #[serde(default)]
    pub timing: TimingSettings,

    /// Rendered outputs (optional, has defaults).
    #[serde(default)]
    pub output: OutputSettings,
}

impl Config {
    /// Expands `~` and environment variables in every configured path.
    pub fn expand_paths(&mut self) -> Result<()> {
        self.report.run_root = expand(&self.report.run_root)?;
        if let Some(chunks) = &self.report.shard_chunks {
            self.report.shard_chunks = Some(expand(chunks)?);
        }
        self.timing.store_dir = expand(&self.timing.store_dir)?;
        Ok(())
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Device platform the run was executed on.
///
/// Android runners write one `<testsuite>` per artifact, iOS runners wrap
/// theirs in `<testsuites>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Android,
    Ios,
}

impl Platform {
    /// The artifact layout this platform produces.
    pub fn layout(&self) -> XmlLayout {
        match self {
            Platform::Android => XmlLayout::OneSuite,
            Platform::Ios => XmlLayout::AllSuites,
        }
    }
}

/// Settings for locating and merging one run.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `platform` | `"android"` |
/// | `flaky_test_attempts` | 0 |
/// | `files_to_download` | `[]` |
/// | `shard_chunks` | None |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportSettings {
    /// Local directory holding the run's artifacts and `matrix_ids.json`.
    pub run_root: PathBuf,

    #[serde(default)]
    pub platform: Platform,

    /// Number of reruns each shard was given.
    ///
    /// When greater than zero, rerun directories are grouped with their base
    /// shard and flaky tests are reported.
    #[serde(default)]
    pub flaky_test_attempts: u32,

    /// Extra artifact file patterns (regular expressions) to collect.
    #[serde(default)]
    pub files_to_download: Vec<String>,

    /// JSON file with the test names assigned to each shard, as an array of
    /// arrays. Enables shard efficiency analysis.
    #[serde(default)]
    pub shard_chunks: Option<PathBuf>,
}

impl ReportSettings {
    /// Reads the configured shard chunks, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is configured but unreadable or not a
    /// JSON array of string arrays.
    pub fn load_shard_chunks(&self) -> Result<Option<Vec<Vec<String>>>> {
        let Some(path) = &self.shard_chunks else {
            return Ok(None);
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read shard chunks: {}", path.display()))?;
        let chunks = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse shard chunks: {}", path.display()))?;

        Ok(Some(chunks))
    }
}

/// Historical timing store settings.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `store_dir` | `"~/.gridreport/timing"` |
/// | `baseline_key` | `"default"` |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingSettings {
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Identifies which baseline this run is compared against, usually the
    /// test artifact name.
    #[serde(default = "default_baseline_key")]
    pub baseline_key: String,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            baseline_key: default_baseline_key(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("~/.gridreport/timing")
}

fn default_baseline_key() -> String {
    "default".to_string()
}

/// Rendered outputs.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `junit_file` | `"JUnitReport.xml"` |
/// | `summary` | `true` |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Merged report file name, written inside the run root.
    #[serde(default = "default_junit_file")]
    pub junit_file: String,

    /// Whether to print the console summary.
    #[serde(default = "default_true")]
    pub summary: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            junit_file: default_junit_file(),
            summary: default_true(),
        }
    }
}

fn default_junit_file() -> String {
    "JUnitReport.xml".to_string()
}

fn default_true() -> bool {
    true
}
