//! Folding per-artifact results into one merged result.
//!
//! Every located artifact is parsed, its cases are stamped with the web link
//! of the matrix that produced it, and the tree is folded into an
//! accumulator with [`TestResult::merge`]. Artifacts are folded strictly in
//! the order given (the locator's order), since accumulated durations depend
//! on it.

use std::path::{Path, PathBuf};

use crate::artifact::ArtifactPath;
use crate::junit::{JunitError, ResultParser, TestResult};
use crate::matrix::RunMatrixMap;

/// Merges the artifacts of one run.
pub struct MergeEngine<'a, P: ?Sized> {
    parser: &'a P,
    matrices: &'a RunMatrixMap,
}

impl<'a, P> MergeEngine<'a, P>
where
    P: ResultParser + ?Sized,
{
    pub fn new(parser: &'a P, matrices: &'a RunMatrixMap) -> Self {
        Self { parser, matrices }
    }

    /// Parses, annotates and folds `artifacts` in order.
    ///
    /// An empty slice yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns the first parse failure. A partially merged result would
    /// misreport outcomes, so nothing is returned in that case.
    pub fn merge(&self, artifacts: &[PathBuf]) -> Result<TestResult, JunitError> {
        if artifacts.is_empty() {
            tracing::warn!(
                "No test result artifacts found under {}",
                self.matrices.run_path().display()
            );
        }

        artifacts
            .iter()
            .try_fold(TestResult::default(), |merged, artifact| {
                let annotated = self.annotate(artifact)?;
                Ok(merged.merge(annotated))
            })
    }

    fn annotate(&self, artifact: &Path) -> Result<TestResult, JunitError> {
        let mut parsed = self.parser.parse(artifact)?;
        let web_link = self.resolve_web_link(artifact).unwrap_or_default();
        parsed.set_web_link(&web_link);
        Ok(parsed)
    }

    /// Resolves the web link of the matrix an artifact belongs to.
    ///
    /// The artifact is decoded relative to the parent of the run directory,
    /// so its object and shard segments form the `<run>/<matrix>` suffix the
    /// stored storage paths end with. Misses are logged, never fatal.
    pub fn resolve_web_link(&self, artifact: &Path) -> Option<String> {
        let run_path = self.matrices.run_path();
        let base = run_path.parent().unwrap_or(run_path);

        let decoded = match ArtifactPath::decode(base, artifact) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Cannot resolve web link: {}", e);
                return None;
            }
        };

        let matrix_path = decoded.matrix_path();
        match self.matrices.find_by_path_suffix(&matrix_path) {
            Some(matrix) => Some(matrix.web_link.clone()),
            None => {
                tracing::warn!("Matrix path not found in matrix map: {}", matrix_path);
                None
            }
        }
    }
}
