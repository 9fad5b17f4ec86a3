//! Console summary of matrices and merged test counts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Renderer;
use crate::junit::TestResult;
use crate::matrix::{MatrixOutcome, RunMatrixMap};

/// Counts shown by [`MatrixSummaryReport`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatrixSummary {
    pub matrices: usize,
    pub successful: usize,
    pub failed: usize,
    pub inconclusive: usize,
    pub billable_minutes: u64,
    pub finished_at: Option<DateTime<Utc>>,
    pub tests: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
    pub duration_secs: f64,
}

impl MatrixSummary {
    pub fn new(matrices: &RunMatrixMap, result: &TestResult) -> Self {
        let mut summary = Self {
            matrices: matrices.len(),
            tests: result.total_tests(),
            failures: result.total_failures(),
            errors: result.total_errors(),
            skipped: result.total_skipped(),
            duration_secs: result.total_time(),
            ..Default::default()
        };

        for (_, matrix) in matrices.matrices() {
            match matrix.outcome {
                MatrixOutcome::Success => summary.successful += 1,
                MatrixOutcome::Failure => summary.failed += 1,
                _ => summary.inconclusive += 1,
            }
            summary.billable_minutes +=
                matrix.billable_virtual_minutes + matrix.billable_physical_minutes;
            summary.finished_at = summary.finished_at.max(matrix.timestamp);
        }

        summary
    }
}

/// Prints matrix outcomes and merged test counts to stdout.
pub struct MatrixSummaryReport;

#[async_trait]
impl Renderer for MatrixSummaryReport {
    fn name(&self) -> &'static str {
        "matrix summary"
    }

    async fn render(&self, matrices: &RunMatrixMap, result: &TestResult) -> Result<()> {
        let summary = MatrixSummary::new(matrices, result);

        println!();
        println!("Matrices:");
        println!("  Total:        {}", summary.matrices);
        println!("  Successful:   {}", console::style(summary.successful).green());
        println!("  Failed:       {}", console::style(summary.failed).red());
        if summary.inconclusive > 0 {
            println!("  Inconclusive: {}", console::style(summary.inconclusive).yellow());
        }
        println!("  Billable:     {} min", summary.billable_minutes);
        if let Some(finished) = summary.finished_at {
            println!("  Finished:     {}", finished.to_rfc3339());
        }

        println!();
        println!("Test Results:");
        println!("  Total:   {}", summary.tests);
        println!(
            "  Passed:  {}",
            console::style(summary.tests - summary.failures - summary.errors - summary.skipped)
                .green()
        );
        println!("  Failed:  {}", console::style(summary.failures).red());
        if summary.errors > 0 {
            println!("  Errors:  {}", console::style(summary.errors).red().bold());
        }
        println!("  Skipped: {}", console::style(summary.skipped).yellow());
        println!("  Duration: {:.1}s", summary.duration_secs);

        println!();
        if matrices.all_successful() {
            println!("{}", console::style("All matrices passed!").green().bold());
        } else if summary.tests == 0 {
            println!("{}", console::style("No test results were collected.").red().bold());
        } else {
            println!("{}", console::style("Some matrices failed.").red().bold());
        }

        Ok(())
    }
}
