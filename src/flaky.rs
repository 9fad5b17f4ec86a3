//! Flaky rerun reconciliation.
//!
//! For every rerun group, each test name collects one success flag per
//! observation across all members of the group. A test passed if any
//! observation succeeded and is flaky if the observations disagree.
//!
//! The verdicts are diagnostic: they are handed to a [`FlakyObserver`] and
//! returned to the caller, but never change the merged result or the exit
//! status.

use std::collections::HashMap;

use crate::junit::{JunitError, ResultParser};
use crate::rerun::RerunGroup;

/// Reconciled outcome of one test name within a rerun group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestVerdict {
    pub name: String,
    /// Success flags in observation order.
    pub outcomes: Vec<bool>,
}

impl TestVerdict {
    /// `true` if any observation succeeded.
    pub fn passed_at_least_once(&self) -> bool {
        self.outcomes.iter().any(|&passed| passed)
    }

    /// `true` if the observations are not all identical.
    pub fn is_flaky(&self) -> bool {
        self.outcomes.iter().any(|&o| o) && self.outcomes.iter().any(|&o| !o)
    }
}

/// Verdicts for every test seen in one rerun group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVerdicts {
    pub shard_key: String,
    /// In first-seen order.
    pub verdicts: Vec<TestVerdict>,
}

impl GroupVerdicts {
    pub fn flaky(&self) -> impl Iterator<Item = &TestVerdict> {
        self.verdicts.iter().filter(|v| v.is_flaky())
    }

    pub fn verdict(&self, name: &str) -> Option<&TestVerdict> {
        self.verdicts.iter().find(|v| v.name == name)
    }
}

/// Receives reconciled groups as they are produced.
pub trait FlakyObserver {
    fn on_group(&self, group: &GroupVerdicts);
}

/// Observer that writes verdicts to the log.
pub struct TracingObserver;

impl FlakyObserver for TracingObserver {
    fn on_group(&self, group: &GroupVerdicts) {
        let passed = group
            .verdicts
            .iter()
            .filter(|v| v.passed_at_least_once())
            .count();
        tracing::info!(
            "Rerun group {}: {} tests, {} passed at least once, {} flaky",
            group.shard_key,
            group.verdicts.len(),
            passed,
            group.flaky().count()
        );
        for verdict in group.flaky() {
            tracing::warn!(
                "Flaky test in {}: {} (outcomes: {:?})",
                group.shard_key,
                verdict.name,
                verdict.outcomes
            );
        }
    }
}

/// Observer that discards every group.
pub struct NullObserver;

impl FlakyObserver for NullObserver {
    fn on_group(&self, _group: &GroupVerdicts) {}
}

/// Folds per-test outcomes across the members of each rerun group.
pub struct FlakyReconciler<'a, P: ?Sized, O: ?Sized> {
    parser: &'a P,
    observer: &'a O,
}

impl<'a, P, O> FlakyReconciler<'a, P, O>
where
    P: ResultParser + ?Sized,
    O: FlakyObserver + ?Sized,
{
    pub fn new(parser: &'a P, observer: &'a O) -> Self {
        Self { parser, observer }
    }

    /// Reconciles every group in order.
    ///
    /// # Errors
    ///
    /// Returns the first parse failure; a corrupt artifact aborts
    /// reconciliation.
    pub fn reconcile(&self, groups: &[RerunGroup]) -> Result<Vec<GroupVerdicts>, JunitError> {
        let mut reconciled = Vec::with_capacity(groups.len());
        for group in groups {
            let verdicts = self.reconcile_group(group)?;
            self.observer.on_group(&verdicts);
            reconciled.push(verdicts);
        }
        Ok(reconciled)
    }

    fn reconcile_group(&self, group: &RerunGroup) -> Result<GroupVerdicts, JunitError> {
        let mut verdicts: Vec<TestVerdict> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for path in &group.paths {
            let parsed = self.parser.parse(path)?;
            for case in parsed.cases() {
                let passed = case.successful();
                match index.get(&case.name) {
                    Some(&i) => verdicts[i].outcomes.push(passed),
                    None => {
                        index.insert(case.name.clone(), verdicts.len());
                        verdicts.push(TestVerdict {
                            name: case.name.clone(),
                            outcomes: vec![passed],
                        });
                    }
                }
            }
        }

        Ok(GroupVerdicts {
            shard_key: group.shard_key.clone(),
            verdicts,
        })
    }
}
