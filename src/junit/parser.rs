//! JUnit XML parsing.
//!
//! Test grids emit results in two layouts. Android shards write one
//! `<testsuite>` root per file; iOS shards write a `<testsuites>` root that
//! may hold several suites. [`XmlLayout`] selects which root is expected and
//! implements [`ResultParser`] for either.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};

use super::JunitError;
use super::model::{TestCase, TestOutcome, TestResult, TestSuite};

/// Turns one artifact file into a result tree.
pub trait ResultParser {
    fn parse(&self, path: &Path) -> Result<TestResult, JunitError>;
}

/// Expected document layout of a result artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XmlLayout {
    /// A single `<testsuite>` root element.
    #[default]
    OneSuite,

    /// A `<testsuites>` root holding any number of suites.
    AllSuites,
}

impl XmlLayout {
    fn root_element(&self) -> &'static str {
        match self {
            XmlLayout::OneSuite => "testsuite",
            XmlLayout::AllSuites => "testsuites",
        }
    }

    /// Parses JUnit XML content in this layout.
    pub fn parse_str(&self, content: &str) -> Result<TestResult, JunitError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut saw_root = false;
        let mut suites: Vec<TestSuite> = Vec::new();
        let mut suite: Option<TestSuite> = None;
        let mut case: Option<TestCase> = None;
        // Set while inside <failure>/<error> so body text can fill in a missing message.
        let mut in_failure = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = element_name(&e);
                    if !saw_root {
                        self.check_root(&name)?;
                        saw_root = true;
                    }
                    match name.as_str() {
                        "testsuite" => suite = Some(read_suite(&e)?),
                        "testcase" => case = Some(read_case(&e)?),
                        "failure" | "error" | "skipped" => {
                            if let Some(case) = case.as_mut() {
                                apply_status(case, &name, &e)?;
                                in_failure = name != "skipped";
                            }
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => {
                    let name = element_name(&e);
                    if !saw_root {
                        self.check_root(&name)?;
                        saw_root = true;
                    }
                    match name.as_str() {
                        "testsuite" => suites.push(read_suite(&e)?),
                        "testcase" => {
                            let parsed = read_case(&e)?;
                            if let Some(suite) = suite.as_mut() {
                                suite.testcases.push(parsed);
                            }
                        }
                        "failure" | "error" | "skipped" => {
                            if let Some(case) = case.as_mut() {
                                apply_status(case, &name, &e)?;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(t) if in_failure => {
                    if let Some(case) = case.as_mut()
                        && case.message.is_none()
                    {
                        case.message = Some(t.unescape()?.into_owned());
                    }
                }
                Event::CData(t) if in_failure => {
                    if let Some(case) = case.as_mut()
                        && case.message.is_none()
                    {
                        case.message = Some(String::from_utf8_lossy(&t.into_inner()).into_owned());
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"testsuite" => {
                        if let Some(done) = suite.take() {
                            suites.push(done);
                        }
                    }
                    b"testcase" => {
                        if let (Some(done), Some(suite)) = (case.take(), suite.as_mut()) {
                            suite.testcases.push(done);
                        }
                    }
                    b"failure" | b"error" => in_failure = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(JunitError::UnexpectedRoot {
                expected: self.root_element(),
                found: String::new(),
            });
        }

        Ok(TestResult::new(suites))
    }

    fn check_root(&self, name: &str) -> Result<(), JunitError> {
        if name == self.root_element() {
            Ok(())
        } else {
            Err(JunitError::UnexpectedRoot {
                expected: self.root_element(),
                found: name.to_string(),
            })
        }
    }
}

impl ResultParser for XmlLayout {
    fn parse(&self, path: &Path) -> Result<TestResult, JunitError> {
        let content = std::fs::read_to_string(path).map_err(|source| JunitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(&content).map_err(|e| e.in_file(path))
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, JunitError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn read_suite(e: &BytesStart<'_>) -> Result<TestSuite, JunitError> {
    let mut suite = TestSuite::new(attribute(e, "name")?.unwrap_or_default());
    suite.timestamp = attribute(e, "timestamp")?;
    suite.hostname = attribute(e, "hostname")?;
    Ok(suite)
}

fn read_case(e: &BytesStart<'_>) -> Result<TestCase, JunitError> {
    let name = attribute(e, "name")?.unwrap_or_default();
    let classname = attribute(e, "classname")?.unwrap_or_default();
    let time = match attribute(e, "time")? {
        Some(raw) => parse_time(&raw)?,
        None => 0.0,
    };
    let mut case = TestCase::new(name).with_classname(classname).with_time(time);
    case.web_link = attribute(e, "webLink")?.unwrap_or_default();
    Ok(case)
}

/// Parses a `time` attribute. Some runners emit thousands separators.
fn parse_time(raw: &str) -> Result<f64, JunitError> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return Ok(0.0);
    }
    let time: f64 = cleaned
        .parse()
        .map_err(|_| JunitError::InvalidNumber(raw.to_string()))?;
    if time.is_finite() && time >= 0.0 {
        Ok(time)
    } else {
        Err(JunitError::InvalidNumber(raw.to_string()))
    }
}

fn apply_status(case: &mut TestCase, element: &str, e: &BytesStart<'_>) -> Result<(), JunitError> {
    // A failure/error seen once wins over a later <skipped>.
    case.outcome = match (element, case.outcome) {
        ("failure", _) => TestOutcome::Failed,
        ("error", TestOutcome::Failed) => TestOutcome::Failed,
        ("error", _) => TestOutcome::Error,
        ("skipped", TestOutcome::Passed) => TestOutcome::Skipped,
        (_, current) => current,
    };
    if case.message.is_none() {
        case.message = attribute(e, "message")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_SUITE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="com.example.LoginTest" tests="4" failures="1" errors="0" skipped="1" time="3.5" timestamp="2024-05-01T10:00:00" hostname="localhost">
  <testcase name="testLogin" classname="com.example.LoginTest" time="1.25"/>
  <testcase name="testLogout" classname="com.example.LoginTest" time="2.0">
    <failure message="expected true">java.lang.AssertionError: expected true
    at com.example.LoginTest.testLogout(LoginTest.java:42)</failure>
  </testcase>
  <testcase name="testIgnored" classname="com.example.LoginTest" time="0">
    <skipped/>
  </testcase>
  <testcase name="testCrash" classname="com.example.LoginTest" time="0.25">
    <error><![CDATA[Process crashed]]></error>
  </testcase>
</testsuite>
"#;

    const ALL_SUITES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
  <testsuite name="EarlGreyExampleTests" tests="2">
    <testcase name="testPresence" classname="EarlGreyExampleTests" time="1,000.5"/>
    <testcase name="testTap" classname="EarlGreyExampleTests" time="0.5"/>
  </testsuite>
  <testsuite name="EarlGreyExampleSwiftTests" tests="1">
    <testcase name="testLayout" classname="EarlGreyExampleSwiftTests" time="0.1"/>
  </testsuite>
  <testsuite name="Empty"/>
</testsuites>
"#;

    #[test]
    fn test_parse_one_suite() {
        let result = XmlLayout::OneSuite.parse_str(ONE_SUITE).unwrap();

        assert_eq!(result.testsuites.len(), 1);
        let suite = &result.testsuites[0];
        assert_eq!(suite.name, "com.example.LoginTest");
        assert_eq!(suite.timestamp.as_deref(), Some("2024-05-01T10:00:00"));
        assert_eq!(suite.hostname.as_deref(), Some("localhost"));
        assert_eq!(suite.tests(), 4);

        let outcomes: Vec<_> = suite.testcases.iter().map(|c| c.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                TestOutcome::Passed,
                TestOutcome::Failed,
                TestOutcome::Skipped,
                TestOutcome::Error
            ]
        );
        assert_eq!(suite.testcases[0].time, 1.25);
        assert_eq!(suite.testcases[1].message.as_deref(), Some("expected true"));
        assert_eq!(suite.testcases[3].message.as_deref(), Some("Process crashed"));
    }

    #[test]
    fn test_parse_all_suites() {
        let result = XmlLayout::AllSuites.parse_str(ALL_SUITES).unwrap();

        let names: Vec<_> = result.testsuites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["EarlGreyExampleTests", "EarlGreyExampleSwiftTests", "Empty"]
        );
        assert_eq!(result.total_tests(), 3);
        assert_eq!(result.testsuites[0].testcases[0].time, 1000.5);
    }

    #[test]
    fn test_layout_rejects_wrong_root() {
        let err = XmlLayout::OneSuite.parse_str(ALL_SUITES).unwrap_err();
        assert!(matches!(
            err,
            JunitError::UnexpectedRoot { expected: "testsuite", .. }
        ));

        let err = XmlLayout::AllSuites.parse_str(ONE_SUITE).unwrap_err();
        assert!(matches!(
            err,
            JunitError::UnexpectedRoot { expected: "testsuites", .. }
        ));
    }

    #[test]
    fn test_parse_empty_document_is_error() {
        assert!(XmlLayout::OneSuite.parse_str("").is_err());
    }

    #[test]
    fn test_parse_rejects_negative_time() {
        let xml = r#"<testsuite name="s"><testcase name="t" time="-1"/></testsuite>"#;
        assert!(matches!(
            XmlLayout::OneSuite.parse_str(xml),
            Err(JunitError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_parse_file_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test_result_0.xml");
        std::fs::write(&path, "<testsuite name=\"s\"><testcase name=\"t\" time=\"x\"/></testsuite>")
            .unwrap();

        let err = XmlLayout::OneSuite.parse(&path).unwrap_err();
        assert!(err.to_string().contains("test_result_0.xml"));
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let err = XmlLayout::OneSuite
            .parse(Path::new("/nonexistent/test_result_0.xml"))
            .unwrap_err();
        assert!(matches!(err, JunitError::Io { .. }));
    }
}
