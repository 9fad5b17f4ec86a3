//! Shard efficiency: how long each shard was expected to take, based on the
//! historical baseline, against how long it actually took.

use std::collections::HashMap;
use std::fmt;

use crate::junit::TestResult;

/// Expected vs. actual duration of one shard, in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ShardEfficiency {
    pub shard: String,
    pub expected_time: f64,
    pub final_time: f64,
    pub time_diff: f64,
}

impl fmt::Display for ShardEfficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Expected: {}s, Actual: {}s, Diff: {}s",
            self.shard,
            self.expected_time.round() as i64,
            self.final_time.round() as i64,
            self.time_diff.round() as i64
        )
    }
}

/// Flattens a result into test name → duration. Later cases overwrite
/// earlier ones with the same name.
pub fn junit_map(result: &TestResult) -> HashMap<&str, f64> {
    result.cases().map(|c| (c.name.as_str(), c.time)).collect()
}

/// Computes one [`ShardEfficiency`] per shard chunk, in chunk order.
///
/// Names missing from either result contribute zero.
///
/// ```
/// use gridreport::efficiency::shard_efficiency;
/// use gridreport::junit::{TestCase, TestResult, TestSuite};
///
/// let old = TestResult::new(vec![TestSuite::new("s")
///     .with_case(TestCase::new("T1").with_time(10.0))
///     .with_case(TestCase::new("T2").with_time(5.0))]);
/// let new = TestResult::new(vec![TestSuite::new("s")
///     .with_case(TestCase::new("T1").with_time(12.0))
///     .with_case(TestCase::new("T2").with_time(5.0))]);
/// let chunks = vec![vec!["T1".to_string(), "T2".to_string()]];
///
/// let list = shard_efficiency(&old, &new, &chunks);
/// assert_eq!(list[0].shard, "Shard 0");
/// assert_eq!(list[0].expected_time, 15.0);
/// assert_eq!(list[0].final_time, 17.0);
/// assert_eq!(list[0].time_diff, 2.0);
/// ```
pub fn shard_efficiency<S: AsRef<str>>(
    old: &TestResult,
    new: &TestResult,
    chunks: &[Vec<S>],
) -> Vec<ShardEfficiency> {
    let old_map = junit_map(old);
    let new_map = junit_map(new);

    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| {
            let (expected_time, final_time) =
                chunk.iter().fold((0.0, 0.0), |(expected, actual), name| {
                    let name = name.as_ref();
                    (
                        expected + old_map.get(name).copied().unwrap_or(0.0),
                        actual + new_map.get(name).copied().unwrap_or(0.0),
                    )
                });
            ShardEfficiency {
                shard: format!("Shard {}", index),
                expected_time,
                final_time,
                time_diff: final_time - expected_time,
            }
        })
        .collect()
}

/// Renders the operator-facing summary, one line per shard.
pub fn format_efficiency(list: &[ShardEfficiency]) -> String {
    let mut out = String::from("Actual shard times:\n");
    for entry in list {
        out.push_str("  ");
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}
