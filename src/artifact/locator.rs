//! Discovery of result artifacts under a run directory.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use super::ArtifactError;

/// File name pattern for per-device JUnit results.
pub const TEST_RESULT_PATTERN: &str = r".*test_result_\d+\.xml$";

/// Finds artifact files by file-name pattern.
///
/// The result pattern ([`TEST_RESULT_PATTERN`]) is always included; extra
/// patterns (such as configured `files_to_download`) are added on top.
/// Directories are visited in file-name order, so the returned order is
/// stable for a given tree.
///
/// ```no_run
/// use gridreport::artifact::ArtifactLocator;
/// use std::path::Path;
///
/// let locator = ArtifactLocator::results_only();
/// for path in locator.locate(Path::new("results/2024-05-01_10-00-00"))? {
///     println!("{}", path.display());
/// }
/// # Ok::<(), gridreport::artifact::ArtifactError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    patterns: Vec<Regex>,
}

impl ArtifactLocator {
    /// Creates a locator matching result files plus `extra` patterns.
    ///
    /// Extra patterns must match the whole file name.
    ///
    /// # Errors
    ///
    /// [`ArtifactError::InvalidPattern`] if any extra pattern fails to compile.
    pub fn new<S: AsRef<str>>(extra: &[S]) -> Result<Self, ArtifactError> {
        let mut patterns = vec![result_regex()];
        for pattern in extra {
            let pattern = pattern.as_ref();
            let anchored = format!("^(?:{})$", pattern);
            let compiled = Regex::new(&anchored).map_err(|source| ArtifactError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            patterns.push(compiled);
        }
        Ok(Self { patterns })
    }

    /// Creates a locator matching only `test_result_<n>.xml` files.
    pub fn results_only() -> Self {
        Self {
            patterns: vec![result_regex()],
        }
    }

    /// Returns `true` if `file_name` matches any pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(file_name))
    }

    /// Recursively lists regular files under `root` whose name matches.
    ///
    /// # Errors
    ///
    /// - [`ArtifactError::MissingRunRoot`] if `root` does not exist or is not
    ///   a readable directory
    /// - [`ArtifactError::Walk`] if traversal fails below the root
    pub fn locate(&self, root: &Path) -> Result<Vec<PathBuf>, ArtifactError> {
        std::fs::read_dir(root).map_err(|source| ArtifactError::MissingRunRoot {
            path: root.to_path_buf(),
            source,
        })?;

        let mut found = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.matches(&entry.file_name().to_string_lossy()) {
                found.push(entry.into_path());
            }
        }

        tracing::debug!(
            "Located {} artifacts under {}",
            found.len(),
            root.display()
        );

        Ok(found)
    }
}

fn result_regex() -> Regex {
    Regex::new(TEST_RESULT_PATTERN).expect("result pattern is a valid regex")
}
