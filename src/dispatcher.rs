//! End-to-end report generation for one run.
//!
//! [`ReportDispatcher::generate`] drives the pipeline:
//!
//! ```text
//! locate artifacts ─► group reruns ─► reconcile flaky tests (diagnostic)
//!        │
//!        └─────────► merge ─► renderers ─► timing baseline + efficiency
//! ```
//!
//! Everything runs sequentially on the calling task.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::artifact::ArtifactLocator;
use crate::config::{Config, ReportSettings};
use crate::efficiency::{format_efficiency, shard_efficiency};
use crate::flaky::{FlakyObserver, FlakyReconciler, TracingObserver};
use crate::junit::TestResult;
use crate::matrix::{ExitStatus, RunMatrixMap};
use crate::merge::MergeEngine;
use crate::report::{JUnitReport, MatrixSummaryReport, Renderer};
use crate::rerun::group_reruns;
use crate::timing::{LocalTimingStore, TimingStore};

/// Generates the merged report of a run and maintains its timing baseline.
///
/// # Example
///
/// ```no_run
/// use gridreport::config::load_config;
/// use gridreport::dispatcher::ReportDispatcher;
/// use gridreport::matrix::RunMatrixMap;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = load_config(std::path::Path::new("gridreport.toml"))?;
/// let matrices = RunMatrixMap::load(&config.report.run_root)?;
///
/// let status = ReportDispatcher::from_config(&config).generate(&matrices).await?;
/// std::process::exit(status.code());
/// # }
/// ```
pub struct ReportDispatcher {
    settings: ReportSettings,
    timing: Box<dyn TimingStore>,
    renderers: Vec<Box<dyn Renderer>>,
    observer: Box<dyn FlakyObserver>,
}

impl ReportDispatcher {
    /// Creates a dispatcher with no renderers that logs flaky tests.
    pub fn new(settings: ReportSettings, timing: impl TimingStore + 'static) -> Self {
        Self {
            settings,
            timing: Box::new(timing),
            renderers: Vec::new(),
            observer: Box::new(TracingObserver),
        }
    }

    /// Creates a dispatcher with the local timing store and the renderers
    /// enabled in `config`.
    pub fn from_config(config: &Config) -> Self {
        let timing = LocalTimingStore::new(&config.timing.store_dir, &config.timing.baseline_key);
        let mut dispatcher = Self::new(config.report.clone(), timing).with_renderer(
            JUnitReport::in_run(&config.report.run_root, &config.output.junit_file),
        );
        if config.output.summary {
            dispatcher = dispatcher.with_renderer(MatrixSummaryReport);
        }
        dispatcher
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderers.push(Box::new(renderer));
        self
    }

    pub fn with_observer(mut self, observer: impl FlakyObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Generates every report for the run described by `matrices`.
    ///
    /// Returns the run's exit status; test failures are not errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the run directory is missing, an artifact cannot be
    /// parsed, a renderer fails, or the timing baseline cannot be saved.
    pub async fn generate(&self, matrices: &RunMatrixMap) -> Result<ExitStatus> {
        let parser = self.settings.platform.layout();
        let artifacts = self.locate_results(matrices)?;

        if self.settings.flaky_test_attempts > 0 {
            let groups = group_reruns(&artifacts, true);
            tracing::debug!("Reconciling {} rerun groups", groups.len());
            FlakyReconciler::new(&parser, self.observer.as_ref())
                .reconcile(&groups)
                .context("Failed to reconcile flaky tests")?;
        }

        let mut merged = MergeEngine::new(&parser, matrices)
            .merge(&artifacts)
            .context("Failed to merge test results")?;

        for renderer in &self.renderers {
            tracing::debug!("Rendering {}", renderer.name());
            renderer
                .render(matrices, &merged)
                .await
                .with_context(|| format!("Failed to render {} report", renderer.name()))?;
        }

        if !merged.is_empty() {
            self.update_baseline(&mut merged).await?;
        }

        Ok(matrices.exit_status())
    }

    fn locate_results(&self, matrices: &RunMatrixMap) -> Result<Vec<PathBuf>> {
        let root = matrices.run_path();
        let artifacts = ArtifactLocator::new(&self.settings.files_to_download[..])?
            .locate(root)
            .with_context(|| format!("Failed to locate artifacts under {}", root.display()))?;

        let results = ArtifactLocator::results_only();
        let (xml, other): (Vec<_>, Vec<_>) = artifacts.into_iter().partition(|path| {
            path.file_name()
                .is_some_and(|name| results.matches(&name.to_string_lossy()))
        });

        tracing::info!(
            "Found {} test result files and {} other artifacts",
            xml.len(),
            other.len()
        );
        Ok(xml)
    }

    async fn update_baseline(&self, merged: &mut TestResult) -> Result<()> {
        let baseline = self.timing.load().await?;
        merged.merge_test_times(baseline.as_ref());

        if let Some(old) = &baseline
            && let Some(chunks) = self.settings.load_shard_chunks()?
        {
            let list = shard_efficiency(old, merged, &chunks);
            tracing::info!("{}", format_efficiency(&list));
        }

        self.timing.save(merged).await
    }
}
