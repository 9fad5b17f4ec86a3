//! JUnit result trees: model, parsing and writing.
//!
//! Everything downstream of artifact discovery works on [`TestResult`]
//! trees. Parsing is selected per platform through [`XmlLayout`]; writing
//! always produces a `<testsuites>` document.

pub mod model;
pub mod parser;
pub mod writer;

use std::path::{Path, PathBuf};

pub use model::{TestCase, TestOutcome, TestResult, TestSuite};
pub use parser::{ResultParser, XmlLayout};
pub use writer::to_xml_string;

/// Errors raised while reading or writing JUnit XML.
#[derive(Debug, thiserror::Error)]
pub enum JunitError {
    /// The artifact could not be read from disk.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The root element does not match the expected layout.
    #[error("Expected <{expected}> root element, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    /// A numeric attribute could not be parsed.
    #[error("Invalid numeric value: {0:?}")]
    InvalidNumber(String),

    /// Writing the XML output failed.
    #[error("Failed to write XML: {0}")]
    Write(#[from] std::io::Error),

    /// Serialized output was not valid UTF-8.
    #[error("Invalid UTF-8 in XML output: {0}")]
    Encoding(String),

    /// Another error, annotated with the file it came from.
    #[error("{}: {source}", path.display())]
    InFile {
        path: PathBuf,
        source: Box<JunitError>,
    },
}

impl JunitError {
    /// Attaches the artifact path, unless the error already carries one.
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            JunitError::Io { .. } | JunitError::InFile { .. } => self,
            other => JunitError::InFile {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }
}
