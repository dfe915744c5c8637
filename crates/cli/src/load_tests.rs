// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const HEADER: &str = "group,enabled,variants,csv_file,budget\n";

fn csv(rows: &str) -> String {
    format!("{HEADER}{rows}")
}

#[test]
fn parses_a_basic_row() {
    let batch = parse_batch(&csv("summer-sale,TRUE,desktop,ads.csv,500\n"), "in.csv").unwrap();

    assert_eq!(batch.input_file, "in.csv");
    assert_eq!(batch.items.len(), 1);
    let item = &batch.items[0];
    assert_eq!(item.group, "summer-sale");
    assert!(item.enabled);
    assert_eq!(item.source_ref.as_deref(), Some("ads.csv"));
    assert_eq!(item.settings["budget"], "500");
    assert_eq!(item.subtasks.len(), 1);
    assert_eq!(item.subtasks[0].tag, "desktop");
    assert_eq!(item.subtasks[0].workflow, "create_campaign");
}

#[test]
fn quoted_variants_field_expands_in_order() {
    let batch = parse_batch(&csv("g,true,\"desktop, ios, android\",,\n"), "in.csv").unwrap();

    let tags: Vec<&str> = batch.items[0].subtasks.iter().map(|s| s.tag.as_str()).collect();
    assert_eq!(tags, vec!["desktop", "ios", "android"]);
}

#[test]
fn android_requires_ios() {
    let batch = parse_batch(&csv("g,true,\"ios, android\",,\n"), "in.csv").unwrap();

    let android = batch.items[0].subtask("android").unwrap();
    assert_eq!(android.requires.as_deref(), Some("ios"));
    assert!(batch.items[0].subtask("ios").unwrap().requires.is_none());
}

#[test]
fn all_mobile_collapses_to_one_combined_ios_subtask() {
    let batch = parse_batch(&csv("g,true,\"all mobile\",,\n"), "in.csv").unwrap();

    let item = &batch.items[0];
    assert_eq!(item.subtasks.len(), 1);
    let ios = item.subtask("ios").unwrap();
    assert_eq!(ios.params["combined_mobile"], true);
    assert!(item.subtask("android").is_none());
}

#[test]
fn all_mobile_supersedes_separate_ios_and_android() {
    let batch =
        parse_batch(&csv("g,true,\"desktop, ios, android, all mobile\",,\n"), "in.csv").unwrap();

    let tags: Vec<&str> = batch.items[0].subtasks.iter().map(|s| s.tag.as_str()).collect();
    assert_eq!(tags, vec!["desktop", "ios"]);
    assert_eq!(batch.items[0].subtask("ios").unwrap().params["combined_mobile"], true);
}

#[parameterized(
    upper = { "TRUE", true },
    lower = { "false", false },
    numeric_on = { "1", true },
    numeric_off = { "0", false },
    yes = { "yes", true },
    no = { "No", false },
)]
fn enabled_flag_variants(value: &str, expected: bool) {
    let batch = parse_batch(&csv(&format!("g,{value},desktop,,\n")), "in.csv").unwrap();
    assert_eq!(batch.items[0].enabled, expected);
}

#[test]
fn disabled_rows_are_kept_but_flagged() {
    let content = csv("a,true,desktop,,\nb,false,desktop,,\n");
    let batch = parse_batch(&content, "in.csv").unwrap();

    assert_eq!(batch.items.len(), 2);
    assert_eq!(batch.enabled_count(), 1);
    assert_eq!(batch.disabled_count(), 1);
}

#[test]
fn extra_columns_land_in_settings_but_known_ones_do_not() {
    let content = "group,enabled,variants,csv_file,objective,locale\n\
                   g,true,desktop,ads.csv,traffic,en-US\n";
    let batch = parse_batch(content, "in.csv").unwrap();

    let settings = &batch.items[0].settings;
    assert_eq!(settings["objective"], "traffic");
    assert_eq!(settings["locale"], "en-US");
    assert!(settings.get("group").is_none());
    assert!(settings.get("csv_file").is_none());
}

#[test]
fn missing_settings_stay_null() {
    let batch = parse_batch("group,enabled,variants\ng,true,desktop\n", "in.csv").unwrap();
    assert!(batch.items[0].settings.is_null());
    assert!(batch.items[0].source_ref.is_none());
}

#[test]
fn header_only_yields_empty_batch() {
    let batch = parse_batch(HEADER, "in.csv").unwrap();
    assert!(batch.items.is_empty());
}

#[test]
fn empty_input_is_rejected() {
    assert!(matches!(parse_batch("", "in.csv"), Err(LoadError::EmptyInput)));
    assert!(matches!(parse_batch("\n  \n", "in.csv"), Err(LoadError::EmptyInput)));
}

#[parameterized(
    group = { "enabled,variants\ntrue,desktop\n", "group" },
    enabled = { "group,variants\ng,desktop\n", "enabled" },
    variants = { "group,enabled\ng,true\n", "variants" },
)]
fn missing_required_column(content: &str, column: &str) {
    match parse_batch(content, "in.csv") {
        Err(LoadError::MissingColumn(name)) => assert_eq!(name, column),
        other => panic!("expected MissingColumn, got {other:?}"),
    }
}

#[test]
fn unknown_variant_is_rejected_with_row_number() {
    let content = csv("a,true,desktop,,\nb,true,blackberry,,\n");
    match parse_batch(&content, "in.csv") {
        Err(LoadError::Row { row, message }) => {
            assert_eq!(row, 2);
            assert!(message.contains("blackberry"), "message: {message}");
        }
        other => panic!("expected Row error, got {other:?}"),
    }
}

#[test]
fn empty_variants_are_rejected() {
    match parse_batch(&csv("g,true,,,\n"), "in.csv") {
        Err(LoadError::Row { row, message }) => {
            assert_eq!(row, 1);
            assert!(message.contains("no variants"), "message: {message}");
        }
        other => panic!("expected Row error, got {other:?}"),
    }
}

#[test]
fn duplicate_group_is_rejected() {
    let content = csv("g,true,desktop,,\ng,true,ios,,\n");
    match parse_batch(&content, "in.csv") {
        Err(LoadError::Row { row, message }) => {
            assert_eq!(row, 2);
            assert!(message.contains("duplicate"), "message: {message}");
        }
        other => panic!("expected Row error, got {other:?}"),
    }
}

#[test]
fn invalid_enabled_value_is_rejected() {
    match parse_batch(&csv("g,maybe,desktop,,\n"), "in.csv") {
        Err(LoadError::Row { message, .. }) => {
            assert!(message.contains("maybe"), "message: {message}");
        }
        other => panic!("expected Row error, got {other:?}"),
    }
}

#[test]
fn blank_lines_between_rows_are_skipped() {
    let content = format!("{HEADER}\na,true,desktop,,\n\nb,true,ios,,\n\n");
    let batch = parse_batch(&content, "in.csv").unwrap();
    assert_eq!(batch.items.len(), 2);
}

#[parameterized(
    plain = { "a,b,c", &["a", "b", "c"] },
    quoted_comma = { "a,\"b, c\",d", &["a", "b, c", "d"] },
    escaped_quote = { "\"say \"\"hi\"\"\",x", &["say \"hi\"", "x"] },
    trailing_empty = { "a,b,", &["a", "b", ""] },
    single = { "a", &["a"] },
)]
fn csv_line_splitting(line: &str, expected: &[&str]) {
    assert_eq!(split_csv_line(line), expected);
}

#[test]
fn load_batch_reports_missing_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("nope.csv");
    match load_batch(&missing) {
        Err(LoadError::Io { path, .. }) => assert!(path.contains("nope.csv")),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn load_batch_reads_from_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("batch.csv");
    std::fs::write(&path, csv("g,true,desktop,,\n")).unwrap();

    let batch = load_batch(&path).unwrap();
    assert_eq!(batch.items.len(), 1);
    assert!(batch.input_file.ends_with("batch.csv"));
}
