//! Configuration loading and schema definitions for gridreport.
//!
//! Configuration is read from a TOML file (by default `gridreport.toml`).
//! Paths go through `~` and environment variable expansion after parsing.

pub mod schema;

pub use schema::*;

use std::path::Path;

use anyhow::{Context, Result};

/// Loads gridreport configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read (e.g., doesn't exist or permission denied)
/// - The file contains invalid TOML syntax
/// - The configuration doesn't match the expected schema
/// - A configured path references an undefined environment variable
///
/// # Example
///
/// ```no_run
/// use gridreport::config::load_config;
/// use std::path::Path;
///
/// let config = load_config(Path::new("gridreport.toml"))?;
/// println!("Run root: {}", config.report.run_root.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config.expand_paths()?;

    Ok(config)
}

/// Loads gridreport configuration from a TOML string.
///
/// # Example
///
/// ```
/// use gridreport::config::{load_config_str, Platform};
///
/// let config = load_config_str(r#"
///     [report]
///     run_root = "results/run-1"
///     platform = "ios"
/// "#)?;
///
/// assert_eq!(config.report.platform, Platform::Ios);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("Failed to parse config")?;
    config.expand_paths()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junit::XmlLayout;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = load_config_str(
            r#"
            [report]
            run_root = "/results/run-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.report.run_root, PathBuf::from("/results/run-1"));
        assert_eq!(config.report.platform, Platform::Android);
        assert_eq!(config.report.platform.layout(), XmlLayout::OneSuite);
        assert_eq!(config.report.flaky_test_attempts, 0);
        assert!(config.report.files_to_download.is_empty());
        assert!(config.report.shard_chunks.is_none());
        assert_eq!(config.timing.baseline_key, "default");
        assert!(!config.timing.store_dir.starts_with("~"));
        assert_eq!(config.output.junit_file, "JUnitReport.xml");
        assert!(config.output.summary);
    }

    #[test]
    fn test_full_config() {
        let config = load_config_str(
            r#"
            [report]
            run_root = "/results/run-1"
            platform = "ios"
            flaky_test_attempts = 2
            files_to_download = [".*\\.mp4$"]
            shard_chunks = "/results/run-1/shards.json"

            [timing]
            store_dir = "/var/cache/timing"
            baseline_key = "app-release.apk"

            [output]
            junit_file = "merged.xml"
            summary = false
            "#,
        )
        .unwrap();

        assert_eq!(config.report.platform.layout(), XmlLayout::AllSuites);
        assert_eq!(config.report.flaky_test_attempts, 2);
        assert_eq!(config.report.files_to_download, vec![".*\\.mp4$"]);
        assert_eq!(config.timing.store_dir, PathBuf::from("/var/cache/timing"));
        assert_eq!(config.output.junit_file, "merged.xml");
        assert!(!config.output.summary);
    }

    #[test]
    fn test_missing_run_root_is_error() {
        assert!(load_config_str("[output]\nsummary = false\n").is_err());
    }

    #[test]
    fn test_unknown_platform_is_error() {
        let result = load_config_str(
            r#"
            [report]
            run_root = "/results/run-1"
            platform = "windows"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_shard_chunks() {
        let dir = TempDir::new().unwrap();
        let chunks = dir.path().join("shards.json");
        std::fs::write(&chunks, r#"[["T1", "T2"], ["T3"]]"#).unwrap();

        let config = load_config_str(&format!(
            "[report]\nrun_root = \"/results\"\nshard_chunks = \"{}\"\n",
            chunks.display()
        ))
        .unwrap();

        let loaded = config.report.load_shard_chunks().unwrap().unwrap();
        assert_eq!(loaded, vec![vec!["T1", "T2"], vec!["T3"]]);
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gridreport.toml");
        std::fs::write(&path, "[report]\nrun_root = \"/results/run-1\"\n").unwrap();

        assert!(load_config(&path).is_ok());
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
