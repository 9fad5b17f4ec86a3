//! Rendering of the merged result.
//!
//! Renderers receive the run's matrix map and the merged result after
//! aggregation finishes. They run one after another in the order given to
//! the dispatcher.

pub mod junit;
pub mod summary;

use anyhow::Result;
use async_trait::async_trait;

use crate::junit::TestResult;
use crate::matrix::RunMatrixMap;

pub use junit::JUnitReport;
pub use summary::MatrixSummaryReport;

/// Produces one report from a finished run.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Renders the report.
    async fn render(&self, matrices: &RunMatrixMap, result: &TestResult) -> Result<()>;
}
