//! JUnit XML generation for merged results.
//!
//! Output always uses the `<testsuites>` root so it can be read back with
//! [`XmlLayout::AllSuites`](super::XmlLayout::AllSuites). Times are written
//! at full precision, since the same document serves as the timing baseline:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <testsuites tests="2" failures="1" errors="0" skipped="0" time="1.5">
//!   <testsuite name="com.example.LoginTest" tests="2" failures="1" errors="0" skipped="0" time="1.5">
//!     <testcase name="testLogin" classname="com.example.LoginTest" time="0.5" webLink="https://..."/>
//!     <testcase name="testLogout" classname="com.example.LoginTest" time="1" webLink="https://...">
//!       <failure message="expected true"/>
//!     </testcase>
//!   </testsuite>
//! </testsuites>
//! ```

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use super::JunitError;
use super::model::{TestCase, TestOutcome, TestResult, TestSuite};

/// Serializes a result tree to a JUnit XML string.
pub fn to_xml_string(result: &TestResult) -> Result<String, JunitError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut testsuites = BytesStart::new("testsuites");
    testsuites.push_attribute(("tests", result.total_tests().to_string().as_str()));
    testsuites.push_attribute(("failures", result.total_failures().to_string().as_str()));
    testsuites.push_attribute(("errors", result.total_errors().to_string().as_str()));
    testsuites.push_attribute(("skipped", result.total_skipped().to_string().as_str()));
    testsuites.push_attribute(("time", format_time(result.total_time()).as_str()));
    writer.write_event(Event::Start(testsuites))?;

    for suite in &result.testsuites {
        write_suite(&mut writer, suite)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner()).map_err(|e| JunitError::Encoding(e.to_string()))?;
    Ok(xml)
}

fn write_suite<W: std::io::Write>(
    writer: &mut Writer<W>,
    suite: &TestSuite,
) -> Result<(), JunitError> {
    let mut start = BytesStart::new("testsuite");
    start.push_attribute(("name", suite.name.as_str()));
    start.push_attribute(("tests", suite.tests().to_string().as_str()));
    start.push_attribute(("failures", suite.failures().to_string().as_str()));
    start.push_attribute(("errors", suite.errors().to_string().as_str()));
    start.push_attribute(("skipped", suite.skipped().to_string().as_str()));
    start.push_attribute(("time", format_time(suite.time()).as_str()));
    if let Some(timestamp) = &suite.timestamp {
        start.push_attribute(("timestamp", timestamp.as_str()));
    }
    if let Some(hostname) = &suite.hostname {
        start.push_attribute(("hostname", hostname.as_str()));
    }

    if suite.testcases.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for case in &suite.testcases {
        write_case(writer, case)?;
    }
    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

fn write_case<W: std::io::Write>(writer: &mut Writer<W>, case: &TestCase) -> Result<(), JunitError> {
    let mut testcase = BytesStart::new("testcase");
    testcase.push_attribute(("name", case.name.as_str()));
    testcase.push_attribute(("classname", case.classname.as_str()));
    testcase.push_attribute(("time", format_time(case.time).as_str()));
    if !case.web_link.is_empty() {
        testcase.push_attribute(("webLink", case.web_link.as_str()));
    }

    let status = match case.outcome {
        TestOutcome::Passed => None,
        TestOutcome::Failed => Some("failure"),
        TestOutcome::Error => Some("error"),
        TestOutcome::Skipped => Some("skipped"),
    };

    let Some(status) = status else {
        writer.write_event(Event::Empty(testcase))?;
        return Ok(());
    };

    writer.write_event(Event::Start(testcase))?;
    let mut element = BytesStart::new(status);
    if let Some(message) = &case.message {
        element.push_attribute(("message", strip_invalid_chars(message).as_str()));
    }
    writer.write_event(Event::Empty(element))?;
    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Shortest representation that reads back to the same value.
fn format_time(secs: f64) -> String {
    secs.to_string()
}

/// Drops characters XML 1.0 cannot carry. Escaping is done by the writer.
fn strip_invalid_chars(s: &str) -> String {
    s.chars()
        .filter(|c| matches!(c, '\t' | '\n' | '\r' | ' '..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::junit::XmlLayout;

    fn sample() -> TestResult {
        TestResult::new(vec![
            TestSuite::new("com.example.LoginTest")
                .with_case(
                    TestCase::new("testLogin")
                        .with_classname("com.example.LoginTest")
                        .with_time(0.5),
                )
                .with_case(
                    TestCase::new("testLogout")
                        .with_classname("com.example.LoginTest")
                        .with_time(1.0)
                        .with_outcome(TestOutcome::Failed)
                        .with_message("expected <true> & got \"false\""),
                ),
            TestSuite::new("Empty"),
        ])
    }

    #[test]
    fn test_written_xml_reads_back() {
        let mut result = sample();
        result.set_web_link("https://console.example.test/matrices/1");

        let xml = to_xml_string(&result).unwrap();
        let parsed = XmlLayout::AllSuites.parse_str(&xml).unwrap();

        assert_eq!(parsed.testsuites.len(), 2);
        let logout = &parsed.testsuites[0].testcases[1];
        assert_eq!(logout.outcome, TestOutcome::Failed);
        assert_eq!(logout.message.as_deref(), Some("expected <true> & got \"false\""));
        assert_eq!(logout.time, 1.0);
    }

    #[test]
    fn test_counts_in_root_attributes() {
        let xml = to_xml_string(&sample()).unwrap();
        assert!(xml.contains(r#"<testsuites tests="2" failures="1" errors="0" skipped="0" time="1.5">"#));
        assert!(!xml.contains("webLink"));
    }

    #[test]
    fn test_sub_millisecond_times_survive_a_round_trip() {
        let result = TestResult::new(vec![
            TestSuite::new("s")
                .with_case(TestCase::new("fast").with_time(0.0004))
                .with_case(TestCase::new("precise").with_time(1.23456789)),
        ]);

        let xml = to_xml_string(&result).unwrap();
        let parsed = XmlLayout::AllSuites.parse_str(&xml).unwrap();

        let times: Vec<f64> = parsed.cases().map(|c| c.time).collect();
        assert_eq!(times, vec![0.0004, 1.23456789]);
    }

    #[test]
    fn test_strip_invalid_chars() {
        assert_eq!(strip_invalid_chars("a\u{0}b\u{1b}c"), "abc");
        assert_eq!(strip_invalid_chars("tab\tok"), "tab\tok");
    }
}
