//! gridreport: result aggregation for sharded device-test grids.
//!
//! A test run fans out into many matrices, each split into shards that run
//! on one or more devices and may be rerun. Every shard leaves JUnit XML
//! artifacts in a run directory. This crate turns that directory into one
//! merged report.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Artifact**: Decode artifact paths and locate result files
//! - **Rerun / Flaky**: Group rerun shards and report flaky tests
//! - **Merge**: Fold per-artifact results into one tree
//! - **Efficiency**: Compare shard durations against the previous run
//! - **Report**: Render the merged result (JUnit XML, console)
//! - **Dispatcher**: Run the whole pipeline for one run
//!
//! # Example
//!
//! ```no_run
//! use gridreport::config::load_config;
//! use gridreport::dispatcher::ReportDispatcher;
//! use gridreport::matrix::RunMatrixMap;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config(std::path::Path::new("gridreport.toml"))?;
//!     let matrices = RunMatrixMap::load(&config.report.run_root)?;
//!     let status = ReportDispatcher::from_config(&config).generate(&matrices).await?;
//!     std::process::exit(status.code());
//! }
//! ```

pub mod artifact;
pub mod config;
pub mod dispatcher;
pub mod efficiency;
pub mod flaky;
pub mod junit;
pub mod matrix;
pub mod merge;
pub mod report;
pub mod rerun;
pub mod timing;

// Re-export commonly used types
pub use config::{Config, load_config};
pub use dispatcher::ReportDispatcher;
pub use junit::{ResultParser, TestCase, TestOutcome, TestResult, TestSuite, XmlLayout};
pub use matrix::{ExitStatus, RunMatrixMap};
pub use report::Renderer;
