//! In-memory JUnit result tree.
//!
//! A [`TestResult`] is what one artifact file parses into, and also what many
//! of them merge into. Suites and cases are identified by exact,
//! case-sensitive name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The outcome status of a single test case.
///
/// | Outcome | Description | Counts as success? |
/// |---------|-------------|--------------------|
/// | Passed | Assertions succeeded | Yes |
/// | Failed | An assertion failed | No |
/// | Skipped | Not executed | Yes |
/// | Error | Crashed or setup failed | No |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    #[default]
    Passed,
    Failed,
    Skipped,
    Error,
}

impl TestOutcome {
    /// Returns `true` if this outcome does not fail a run.
    ///
    /// ```
    /// use gridreport::junit::TestOutcome;
    ///
    /// assert!(TestOutcome::Passed.is_success());
    /// assert!(TestOutcome::Skipped.is_success());
    /// assert!(!TestOutcome::Failed.is_success());
    /// assert!(!TestOutcome::Error.is_success());
    /// ```
    pub fn is_success(&self) -> bool {
        matches!(self, TestOutcome::Passed | TestOutcome::Skipped)
    }
}

/// A single `<testcase>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    /// Test name, the identity used for merging.
    pub name: String,

    /// The `classname` attribute, empty if absent.
    pub classname: String,

    /// Duration in seconds.
    pub time: f64,

    pub outcome: TestOutcome,

    /// Failure or error message, if any.
    pub message: Option<String>,

    /// Link to the device/matrix page that produced this case.
    pub web_link: String,

    /// Number of observations folded into this case.
    pub attempts: u32,
}

impl TestCase {
    /// Creates a passed case with zero duration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classname: String::new(),
            time: 0.0,
            outcome: TestOutcome::Passed,
            message: None,
            web_link: String::new(),
            attempts: 1,
        }
    }

    /// Sets the classname.
    pub fn with_classname(mut self, classname: impl Into<String>) -> Self {
        self.classname = classname.into();
        self
    }

    /// Sets the duration in seconds.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// Sets the outcome.
    pub fn with_outcome(mut self, outcome: TestOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Sets the failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns `true` if the case neither failed nor errored.
    pub fn successful(&self) -> bool {
        self.outcome.is_success()
    }

    /// Folds a later observation of the same case into this one.
    ///
    /// Time and attempt counts accumulate; everything else is taken from
    /// `later`.
    fn absorb(&mut self, later: TestCase) {
        self.time += later.time;
        self.attempts += later.attempts;
        self.outcome = later.outcome;
        self.message = later.message;
        self.classname = later.classname;
        self.web_link = later.web_link;
    }
}

/// A single `<testsuite>`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,
    pub timestamp: Option<String>,
    pub hostname: Option<String>,
    pub testcases: Vec<TestCase>,
}

impl TestSuite {
    /// Creates an empty suite.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Appends a test case.
    pub fn with_case(mut self, case: TestCase) -> Self {
        self.testcases.push(case);
        self
    }

    pub fn tests(&self) -> usize {
        self.testcases.len()
    }

    pub fn failures(&self) -> usize {
        self.count(TestOutcome::Failed)
    }

    pub fn errors(&self) -> usize {
        self.count(TestOutcome::Error)
    }

    pub fn skipped(&self) -> usize {
        self.count(TestOutcome::Skipped)
    }

    /// Total duration of all cases in seconds.
    pub fn time(&self) -> f64 {
        self.testcases.iter().map(|c| c.time).sum()
    }

    fn count(&self, outcome: TestOutcome) -> usize {
        self.testcases
            .iter()
            .filter(|c| c.outcome == outcome)
            .count()
    }

    fn merge(&mut self, other: TestSuite) {
        if self.timestamp.is_none() {
            self.timestamp = other.timestamp;
        }
        if self.hostname.is_none() {
            self.hostname = other.hostname;
        }

        for case in other.testcases {
            match self.testcases.iter_mut().find(|c| c.name == case.name) {
                Some(existing) => existing.absorb(case),
                None => self.testcases.push(case),
            }
        }
    }
}

/// A parsed or merged JUnit document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub testsuites: Vec<TestSuite>,
}

impl TestResult {
    /// Creates a result from the given suites.
    pub fn new(testsuites: Vec<TestSuite>) -> Self {
        Self { testsuites }
    }

    /// Returns `true` if there are no suites.
    pub fn is_empty(&self) -> bool {
        self.testsuites.is_empty()
    }

    /// Iterates over every case in suite order.
    pub fn cases(&self) -> impl Iterator<Item = &TestCase> {
        self.testsuites.iter().flat_map(|s| s.testcases.iter())
    }

    /// Iterates mutably over every case in suite order.
    pub fn cases_mut(&mut self) -> impl Iterator<Item = &mut TestCase> {
        self.testsuites.iter_mut().flat_map(|s| s.testcases.iter_mut())
    }

    pub fn total_tests(&self) -> usize {
        self.testsuites.iter().map(TestSuite::tests).sum()
    }

    pub fn total_failures(&self) -> usize {
        self.testsuites.iter().map(TestSuite::failures).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.testsuites.iter().map(TestSuite::errors).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.testsuites.iter().map(TestSuite::skipped).sum()
    }

    pub fn total_time(&self) -> f64 {
        self.testsuites.iter().map(TestSuite::time).sum()
    }

    /// Sets the web link on every case.
    pub fn set_web_link(&mut self, web_link: &str) {
        for case in self.cases_mut() {
            case.web_link = web_link.to_string();
        }
    }

    /// Merges `later` into `self` and returns the combined tree.
    ///
    /// Suites are matched by name and unmatched suites appended. Matched
    /// suites merge their cases the same way, with the later observation
    /// adding its time and attempts and replacing the outcome. Identity
    /// matching is order-independent; accumulated times are not, so callers
    /// must fold in a stable order.
    ///
    /// ```
    /// use gridreport::junit::{TestCase, TestResult, TestSuite};
    ///
    /// let a = TestResult::new(vec![TestSuite::new("s").with_case(TestCase::new("t").with_time(1.0))]);
    /// let b = TestResult::new(vec![TestSuite::new("s").with_case(TestCase::new("t").with_time(2.0))]);
    /// let merged = a.merge(b);
    ///
    /// assert_eq!(merged.testsuites.len(), 1);
    /// assert_eq!(merged.testsuites[0].testcases[0].time, 3.0);
    /// assert_eq!(merged.testsuites[0].testcases[0].attempts, 2);
    /// ```
    pub fn merge(mut self, later: TestResult) -> TestResult {
        for suite in later.testsuites {
            match self.testsuites.iter_mut().find(|s| s.name == suite.name) {
                Some(existing) => existing.merge(suite),
                None => self.testsuites.push(suite),
            }
        }
        self
    }

    /// Copies historical times into cases that recorded no time in this run.
    ///
    /// Only cases with a zero time whose suite and name exist in `old` with a
    /// positive time are touched. Cases missing from `old` are left alone and
    /// suites only present in `old` are not carried over.
    pub fn merge_test_times(&mut self, old: Option<&TestResult>) {
        let Some(old) = old else {
            return;
        };

        let old_times: HashMap<(&str, &str), f64> = old
            .testsuites
            .iter()
            .flat_map(|s| {
                s.testcases
                    .iter()
                    .map(move |c| ((s.name.as_str(), c.name.as_str()), c.time))
            })
            .collect();

        for suite in &mut self.testsuites {
            for case in &mut suite.testcases {
                if case.time > 0.0 {
                    continue;
                }
                if let Some(&time) = old_times.get(&(suite.name.as_str(), case.name.as_str()))
                    && time > 0.0
                {
                    case.time = time;
                }
            }
        }
    }
}
