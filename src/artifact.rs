//! Result artifacts on disk.
//!
//! A run directory encodes its structure in path segments:
//!
//! ```text
//! <results>/<run>/<shard>/<device>/test_result_<n>.xml
//! ```
//!
//! [`ArtifactLocator`] finds the files and [`ArtifactPath`] names their
//! segments.

pub mod locator;
pub mod path;

use std::path::PathBuf;

pub use locator::{ArtifactLocator, TEST_RESULT_PATTERN};
pub use path::ArtifactPath;

/// Errors raised while finding or decoding artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The path has fewer than three segments below the root.
    ///
    /// Fatal only to the single decode; callers isolate it per artifact.
    #[error("Malformed artifact path {}: expected <object>/<shard>/<device> below the root", path.display())]
    MalformedPath { path: PathBuf },

    /// The run directory is missing or unreadable.
    #[error("Run root {} is missing or unreadable: {source}", path.display())]
    MissingRunRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A caller-supplied file pattern is not a valid regex.
    #[error("Invalid artifact pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    /// Traversal failed below the run root.
    #[error("Failed to walk run directory: {0}")]
    Walk(#[from] walkdir::Error),
}
