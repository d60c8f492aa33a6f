//! Integration tests for the end-to-end compilation pipeline.
//!
//! These tests verify the full flow from selected fields and filter tokens
//! to SQL, and that the emitted SQL parses for its dialect.

use profql::compile::{compile_query, CompileError, CompileOptions, QueryRequest};
use profql::config::Settings;
use profql::dataset::{ParamsContext, Project};
use profql::search::{Operator, SearchFilter};
use profql::sql::Dialect;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;

fn params() -> ParamsContext {
    ParamsContext::new(11, vec![Project::new(5, "ios"), Project::new(6, "android")])
}

fn assert_parses_duckdb(sql: &str) {
    if let Err(e) = Parser::parse_sql(&DuckDbDialect {}, sql) {
        panic!("DuckDB SQL should parse: {e}\n{sql}");
    }
}

// ============================================================================
// Basic Compilation Tests
// ============================================================================

#[test]
fn test_transaction_breakdown() {
    let request = QueryRequest::new(
        ["transaction", "project", "p50()", "p95()", "count()", "last_seen()"],
        params(),
    )
    .filter(SearchFilter::new("platform.name", Operator::Eq, "cocoa"))
    .filter(SearchFilter::new("project", Operator::Eq, "ios"));

    let output = compile_query(&request, &CompileOptions::default()).unwrap();
    insta::assert_snapshot!(output.sql, @r"
    SELECT
      `transaction_name` AS `transaction`,
      transform(`project_id`, [5, 6], ['ios', 'android'], '') AS `project`,
      quantile(0.5)(`duration_ns`) AS `p50`,
      quantile(0.95)(`duration_ns`) AS `p95`,
      count() AS `count`,
      max(`received`) AS `last_seen`
    FROM `profiles`
    WHERE `organization_id` = 11 AND `project_id` IN (5, 6) AND `platform` = 'cocoa' AND `project_id` = 5
    GROUP BY `transaction_name`, transform(`project_id`, [5, 6], ['ios', 'android'], '')
    ");

    let names: Vec<_> = output.meta.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["transaction", "project", "p50", "p95", "count", "last_seen"]
    );
}

#[test]
fn test_duckdb_output_parses() {
    let request = QueryRequest::new(
        [
            "device.model",
            "project.name",
            "percentile(profile.duration, 0.9) AS p90",
            "count_unique(trace)",
            "p100()",
        ],
        params(),
    )
    .filter(SearchFilter::new("profile.duration", Operator::Gt, "20ms"))
    .filter(SearchFilter::new("device.model", Operator::Eq, "iPhone*"));

    let options = CompileOptions::default().with_dialect(Dialect::DuckDb);
    let output = compile_query(&request, &options).unwrap();

    assert!(output.sql.contains("quantile_cont(\"duration_ns\", 0.9) AS \"p90\""));
    assert!(output.sql.contains("max(\"duration_ns\") AS \"p100\""));
    assert!(output.sql.contains("\"device_model\" LIKE 'iPhone%'"));
    assert_parses_duckdb(&output.sql);
}

#[test]
fn test_meta_serializes() {
    let request = QueryRequest::new(["os.name", "avg(profile.duration)"], params());
    let output = compile_query(&request, &CompileOptions::default()).unwrap();
    let json = serde_json::to_string(&output.meta).unwrap();
    assert_eq!(
        json,
        r#"[{"name":"os.name","type":"string"},{"name":"avg_profile_duration","type":"nanosecond"}]"#
    );
}

// ============================================================================
// Request Deserialization
// ============================================================================

#[test]
fn test_request_from_json() {
    let request: QueryRequest = serde_json::from_str(
        r#"{
            "selected_columns": ["count()"],
            "filters": [{"key": "project", "operator": "in", "value": ["ios"]}],
            "params": {"organization_id": 11, "projects": [{"id": 5, "slug": "ios"}]}
        }"#,
    )
    .unwrap();

    let output = compile_query(&request, &CompileOptions::default()).unwrap();
    assert_eq!(
        output.sql,
        "SELECT\n  count() AS `count`\nFROM `profiles`\nWHERE `organization_id` = 11 AND `project_id` IN (5) AND `project_id` = 5"
    );
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_errors_surface_unchanged() {
    let cases = [
        ("nope", "Unknown field: nope"),
        ("nope()", "nope is not a valid function"),
        ("avg(device.arch)", "device.arch is not a numeric column"),
        (
            "count_unique()",
            "count_unique: expected 1 argument(s) but got 0 argument(s)",
        ),
    ];
    for (field, message) in cases {
        let request = QueryRequest::new([field], params());
        let err = compile_query(&request, &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::Query(_)), "{field}");
        assert_eq!(err.to_string(), message, "{field}");
    }
}

#[test]
fn test_grouping_conflict() {
    let request = QueryRequest::new(["profile.duration", "avg(profile.duration)"], params());
    let err = compile_query(&request, &CompileOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CompileError::GroupingConflict { ref column, ref functions }
            if column == "profile.duration" && functions == "avg_profile_duration"
    ));
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_compile_with_settings() {
    let settings = Settings::from_toml(
        r#"
[compiler]
dialect = "duckdb"
entity = "profiles_local"
qualify_columns = true
"#,
    )
    .unwrap();
    let options = CompileOptions::from_settings(&settings).unwrap();

    let request = QueryRequest::new(["count()"], ParamsContext::default());
    let output = compile_query(&request, &options).unwrap();
    assert_eq!(output.dialect, Dialect::DuckDb);
    assert_eq!(
        output.sql,
        "SELECT\n  count() AS \"count\"\nFROM \"profiles_local\""
    );
    assert_parses_duckdb(&output.sql);
}
