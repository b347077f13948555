//! Unit tests for session bootstrap.

use std::fs;

use rstest::rstest;
use tempfile::tempdir;

use super::*;

#[test]
fn empty_configuration_when_no_source_given() {
    let configuration = load_configuration(None, None).expect("load empty");
    assert!(configuration.values().is_empty());
}

#[test]
fn inline_configuration_wins_over_nothing() {
    let configuration =
        load_configuration(Some(r#"{"target": "http://example.com"}"#), None).expect("load inline");
    assert_eq!(configuration.target(), Some("http://example.com"));
}

#[test]
fn file_configuration_is_read_and_parsed() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("scan.json");
    fs::write(&path, r#"{"report_dir": "/tmp/reports"}"#).expect("write config");

    let configuration = load_configuration(None, Some(&path)).expect("load file");
    assert_eq!(configuration.report_dir(), Some("/tmp/reports"));
}

#[test]
fn missing_configuration_file_is_a_read_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("absent.json");

    let error = load_configuration(None, Some(&path)).expect_err("missing file");
    assert!(matches!(error, BootstrapError::ReadConfiguration { .. }));
    assert!(error.finish_message().is_none());
}

#[rstest]
#[case("not json")]
#[case("[1, 2]")]
fn malformed_configuration_is_a_parse_error(#[case] text: &str) {
    let error = load_configuration(Some(text), None).expect_err("malformed");
    assert!(matches!(error, BootstrapError::ParseConfiguration { .. }));
}

#[test]
fn session_id_prefers_the_given_value() {
    assert_eq!(session_id(Some(String::from("scan-7"))), "scan-7");
}

#[test]
fn generated_session_ids_are_unique() {
    assert_ne!(session_id(None), session_id(None));
}

#[test]
fn work_directory_is_created_under_the_root() {
    let root = tempdir().expect("tempdir");
    let path = prepare_work_directory(Some(root.path().to_path_buf()), "session-9")
        .expect("create work dir");
    assert_eq!(path, root.path().join("session-9"));
    assert!(path.is_dir());
}

#[test]
fn report_directory_is_created_when_configured() {
    let root = tempdir().expect("tempdir");
    let report_dir = root.path().join("reports");
    let configuration = Configuration::parse(&format!(
        r#"{{"report_dir": "{}"}}"#,
        report_dir.display()
    ))
    .expect("parse");

    prepare_report_directory(&configuration).expect("create report dir");
    assert!(report_dir.is_dir());
}

#[test]
fn existing_report_directory_is_accepted() {
    let root = tempdir().expect("tempdir");
    let configuration = Configuration::parse(&format!(
        r#"{{"report_dir": "{}"}}"#,
        root.path().display()
    ))
    .expect("parse");

    prepare_report_directory(&configuration).expect("existing dir is fine");
}

#[test]
fn report_directory_under_missing_parent_fails() {
    let root = tempdir().expect("tempdir");
    let nested = root.path().join("absent").join("reports");
    let configuration =
        Configuration::parse(&format!(r#"{{"report_dir": "{}"}}"#, nested.display()))
            .expect("parse");

    let error = prepare_report_directory(&configuration).expect_err("missing parent");
    assert!(matches!(error, BootstrapError::CreateReportDirectory { .. }));
    assert_eq!(
        error.finish_message(),
        Some("Failed to create report directory")
    );
}

#[test]
fn unconfigured_report_directory_is_skipped() {
    prepare_report_directory(&Configuration::new()).expect("nothing to create");
}
