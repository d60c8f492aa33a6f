//! Integration tests for filter resolution.
//!
//! These tests verify alias filters and value coercion through the dataset
//! config, rendered as SQL.

use profql::dataset::{ParamsContext, ProfilesDatasetConfig, Project, QueryError};
use profql::search::{Operator, SearchFilter};
use profql::sql::Dialect;

fn params() -> ParamsContext {
    ParamsContext::new(
        1,
        vec![
            Project::new(4, "ios"),
            Project::new(2, "android"),
            Project::new(8, "backend"),
        ],
    )
}

fn render(filter: SearchFilter) -> Result<String, QueryError> {
    let params = params();
    let config = ProfilesDatasetConfig::new(&params);
    config
        .resolve_filter(&filter)
        .map(|expr| expr.to_sql(Dialect::ClickHouse))
}

// ============================================================================
// Project aliases
// ============================================================================

#[test]
fn test_project_slugs() {
    assert_eq!(
        render(SearchFilter::new("project", Operator::Eq, "android")).unwrap(),
        "`project_id` = 2"
    );
    assert_eq!(
        render(SearchFilter::new("project.name", Operator::In, vec!["ios", "backend"])).unwrap(),
        "`project_id` IN (4, 8)"
    );
    assert_eq!(
        render(SearchFilter::new("project", Operator::Ne, "ios")).unwrap(),
        "`project_id` != 4"
    );
}

#[test]
fn test_project_slug_out_of_scope() {
    let err = render(SearchFilter::new("project", Operator::In, vec!["web", "ios"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid query. Project(s) web do not exist or are not actively selected."
    );

    let err = render(SearchFilter::new("project", Operator::In, vec!["web", "cli"])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid query. Project(s) cli and web do not exist or are not actively selected."
    );
}

#[test]
fn test_project_select_alias() {
    let params = params();
    let config = ProfilesDatasetConfig::new(&params);
    let expr = config.resolve_field("project.name").unwrap();
    assert_eq!(
        expr.to_sql(Dialect::ClickHouse),
        "transform(`project_id`, [2, 4, 8], ['android', 'ios', 'backend'], '') AS `project.name`"
    );
}

// ============================================================================
// Column filters
// ============================================================================

#[test]
fn test_duration_units() {
    assert_eq!(
        render(SearchFilter::new("profile.duration", Operator::Gte, "1.5s")).unwrap(),
        "`duration_ns` >= 1500000000"
    );
    assert_eq!(
        render(SearchFilter::new("profile.duration", Operator::Lt, "2us")).unwrap(),
        "`duration_ns` < 2000"
    );
}

#[test]
fn test_string_filters() {
    assert_eq!(
        render(SearchFilter::new("os.name", Operator::Eq, "iOS")).unwrap(),
        "`device_os_name` = 'iOS'"
    );
    assert_eq!(
        render(SearchFilter::new("transaction", Operator::Eq, "/api/*/users")).unwrap(),
        "`transaction_name` LIKE '/api/%/users'"
    );
    assert_eq!(
        render(SearchFilter::new("release", Operator::NotIn, vec!["1.0", "1.1"])).unwrap(),
        "`version_name` NOT IN ('1.0', '1.1')"
    );
}

#[test]
fn test_string_escaping() {
    assert_eq!(
        render(SearchFilter::new("device.model", Operator::Eq, "O'Brien")).unwrap(),
        "`device_model` = 'O\\'Brien'"
    );
}

#[test]
fn test_wildcard_escapes_like_metacharacters() {
    assert_eq!(
        render(SearchFilter::new("transaction", Operator::Eq, "100%_done*")).unwrap(),
        "`transaction_name` LIKE '100\\\\%\\\\_done%'"
    );
    assert_eq!(
        render(SearchFilter::new("device.model", Operator::Ne, "a\\b*")).unwrap(),
        "`device_model` NOT LIKE 'a\\\\\\\\b%'"
    );
}

#[test]
fn test_wildcard_pattern_duckdb() {
    let params = params();
    let config = ProfilesDatasetConfig::new(&params);
    let expr = config
        .resolve_filter(&SearchFilter::new("transaction", Operator::Eq, "50%*"))
        .unwrap();
    assert_eq!(
        expr.to_sql(Dialect::DuckDb),
        "\"transaction_name\" LIKE '50\\%%' ESCAPE '\\'"
    );
}

#[test]
fn test_wildcard_in_list_rejected() {
    for op in [Operator::In, Operator::NotIn] {
        let err = render(SearchFilter::new("transaction", op, vec!["/api/*", "/home"])).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidSearchQuery(
                "Wildcards are not supported in a list of values on transaction".into()
            )
        );
    }
}

#[test]
fn test_timestamp_is_string_literal() {
    assert_eq!(
        render(SearchFilter::new("timestamp", Operator::Gt, "2024-01-01T00:00:00")).unwrap(),
        "`received` > '2024-01-01T00:00:00'"
    );
}

#[test]
fn test_invalid_values() {
    assert!(matches!(
        render(SearchFilter::new("organization.id", Operator::Eq, "1.5")),
        Err(QueryError::InvalidSearchQuery(_))
    ));
    assert!(matches!(
        render(SearchFilter::new("profile.duration", Operator::Gt, "10 lightyears")),
        Err(QueryError::InvalidSearchQuery(_))
    ));
    assert_eq!(
        render(SearchFilter::new("nope", Operator::Eq, "x")).unwrap_err(),
        QueryError::UnknownField("nope".into())
    );
}

#[test]
fn test_duration_overflow_rejected() {
    let huge = format!("{}w", "9".repeat(300));
    for op in [Operator::Gt, Operator::Eq, Operator::In] {
        let err = render(SearchFilter::new("profile.duration", op, huge.as_str())).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidSearchQuery(format!(
                "Invalid value for profile.duration: {huge} is not a duration"
            ))
        );
    }
}

#[test]
fn test_select_resolution_paths() {
    let params = params();
    let config = ProfilesDatasetConfig::new(&params);
    let sql = |field: &str| config.resolve_field(field).map(|e| e.to_sql(Dialect::ClickHouse));

    assert_eq!(
        sql("project").unwrap(),
        "transform(`project_id`, [2, 4, 8], ['android', 'ios', 'backend'], '') AS `project`"
    );
    assert_eq!(sql("os.name").unwrap(), "`device_os_name` AS `os.name`");
    assert_eq!(sql("count()").unwrap(), "count() AS `count`");
    assert_eq!(sql("nope").unwrap_err(), QueryError::UnknownField("nope".into()));
    assert_eq!(sql("nope()").unwrap_err(), QueryError::UnknownFunction("nope".into()));
}
