//! Merged JUnit XML report.
//!
//! The merged result is written back as a single `<testsuites>` document so
//! CI systems that understand JUnit (Jenkins, GitLab CI, GitHub Actions) can
//! show one report for the whole grid. Every test case carries a `webLink`
//! attribute pointing at the matrix that produced it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::Renderer;
use crate::junit::{TestResult, to_xml_string};
use crate::matrix::RunMatrixMap;

/// Writes the merged result as JUnit XML.
///
/// Parent directories are created automatically. An existing file at the
/// output path is overwritten.
///
/// # Example
///
/// ```
/// use gridreport::report::JUnitReport;
/// use std::path::Path;
///
/// let report = JUnitReport::in_run(Path::new("results/run-1"), "JUnitReport.xml");
/// assert_eq!(report.output_path(), Path::new("results/run-1/JUnitReport.xml"));
/// ```
pub struct JUnitReport {
    output_path: PathBuf,
}

impl JUnitReport {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    /// A report named `file_name` inside the run directory.
    pub fn in_run(run_root: &Path, file_name: &str) -> Self {
        Self::new(run_root.join(file_name))
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

#[async_trait]
impl Renderer for JUnitReport {
    fn name(&self) -> &'static str {
        "junit"
    }

    async fn render(&self, _matrices: &RunMatrixMap, result: &TestResult) -> Result<()> {
        let xml = to_xml_string(result).context("Failed to generate JUnit XML")?;

        if let Some(parent) = self.output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
        }

        tokio::fs::write(&self.output_path, xml)
            .await
            .with_context(|| format!("Failed to write JUnit XML: {}", self.output_path.display()))?;

        tracing::info!("JUnit XML written to: {}", self.output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junit::{TestCase, TestOutcome, TestSuite, XmlLayout};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_render_writes_merged_report() {
        let dir = TempDir::new().unwrap();
        let report = JUnitReport::in_run(&dir.path().join("run-1"), "JUnitReport.xml");

        let mut result = TestResult::new(vec![
            TestSuite::new("com.example.LoginTest")
                .with_case(TestCase::new("testLogin").with_time(1.0))
                .with_case(
                    TestCase::new("testLogout")
                        .with_outcome(TestOutcome::Failed)
                        .with_message("expected <true>"),
                ),
        ]);
        result.set_web_link("https://console.example.test/0");

        report.render(&RunMatrixMap::default(), &result).await.unwrap();

        let written = std::fs::read_to_string(report.output_path()).unwrap();
        assert!(written.contains("webLink=\"https://console.example.test/0\""));

        let reparsed = XmlLayout::AllSuites.parse_str(&written).unwrap();
        assert_eq!(reparsed.total_tests(), 2);
        assert_eq!(reparsed.total_failures(), 1);
    }

    #[tokio::test]
    async fn test_render_empty_result() {
        let dir = TempDir::new().unwrap();
        let report = JUnitReport::in_run(dir.path(), "JUnitReport.xml");

        report
            .render(&RunMatrixMap::default(), &TestResult::default())
            .await
            .unwrap();

        let written = std::fs::read_to_string(report.output_path()).unwrap();
        assert!(written.contains("<testsuites"));
    }
}
