//! Historical timing baselines.
//!
//! After each run the merged result is stored so the next run can compare
//! shard durations against it. The store is keyed by a baseline key (usually
//! the app or test artifact name), so unrelated suites never share timings.
//!
//! # Storage Layout
//!
//! [`LocalTimingStore`] keeps one JUnit XML file per key:
//!
//! ```text
//! <store_dir>/<sha256(baseline_key)>.xml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::junit::{TestResult, XmlLayout, to_xml_string};

/// Loads and saves the historical baseline for a run configuration.
#[async_trait]
pub trait TimingStore: Send + Sync {
    /// Returns the previous run's merged result, or `None` if there is none.
    async fn load(&self) -> Result<Option<TestResult>>;

    /// Stores `result` as the baseline for the next run.
    async fn save(&self, result: &TestResult) -> Result<()>;
}

/// A timing store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalTimingStore {
    path: PathBuf,
}

impl LocalTimingStore {
    /// Creates a store for `baseline_key` under `store_dir`.
    pub fn new(store_dir: &Path, baseline_key: &str) -> Self {
        Self {
            path: store_dir.join(format!("{}.xml", baseline_digest(baseline_key))),
        }
    }

    /// The file holding this key's baseline.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TimingStore for LocalTimingStore {
    /// A missing or unreadable baseline is treated as absent.
    async fn load(&self) -> Result<Option<TestResult>> {
        tracing::debug!("Loading timing baseline from: {}", self.path.display());

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    "No historical timing data at {}, skipping efficiency analysis",
                    self.path.display()
                );
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!("Failed to read timing baseline, ignoring it: {}", e);
                return Ok(None);
            }
        };

        match XmlLayout::AllSuites.parse_str(&content) {
            Ok(result) => {
                tracing::debug!("Loaded baseline with {} tests", result.total_tests());
                Ok(Some(result))
            }
            Err(e) => {
                tracing::warn!("Failed to parse timing baseline, ignoring it: {}", e);
                Ok(None)
            }
        }
    }

    async fn save(&self, result: &TestResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create timing directory: {}", parent.display()))?;
        }

        let xml = to_xml_string(result).context("Failed to serialize timing baseline")?;
        tokio::fs::write(&self.path, xml)
            .await
            .with_context(|| format!("Failed to write timing baseline: {}", self.path.display()))?;

        tracing::info!("Timing baseline written to: {}", self.path.display());
        Ok(())
    }
}

fn baseline_digest(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}
