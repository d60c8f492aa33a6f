//! Integration tests for function resolution.
//!
//! These tests verify the documented behavior of every profiles function,
//! including the quirks existing dashboards rely on.

use profql::dataset::{
    ColumnType, DurationUnit, Kind, ParamsContext, ProfilesDatasetConfig, QueryError,
    ResolvedFunction,
};
use profql::expr::{col, func, parametric, ExprExt, Literal};
use profql::search::FunctionCall;
use profql::sql::Dialect;

fn resolve(text: &str) -> Result<ResolvedFunction, QueryError> {
    let params = ParamsContext::default();
    let config = ProfilesDatasetConfig::new(&params);
    let call = FunctionCall::parse(text).expect("call-shaped input");
    config.resolve_function(&call)
}

// ============================================================================
// Percentiles
// ============================================================================

#[test]
fn test_percentile_one_is_max() {
    let percentile = resolve("percentile(profile.duration, 1.0) AS slowest").unwrap();
    let max = resolve("max(profile.duration) AS slowest").unwrap();

    assert_eq!(percentile.expr, max.expr);
    assert_eq!(percentile.expr, func("max", vec![col("duration_ns")]).alias("slowest"));
    assert_eq!(percentile.result_type, max.result_type);
}

#[test]
fn test_p99_uses_p95_fraction() {
    let p99 = resolve("p99()").unwrap();
    let p95 = resolve("p95()").unwrap();

    let expected = parametric("quantile", vec![Literal::Float(0.95)], vec![col("duration_ns")]);
    assert_eq!(p99.expr, expected.clone().alias("p99"));
    assert_eq!(p95.expr, expected.alias("p95"));
}

#[test]
fn test_shorthand_fractions() {
    for (name, fraction) in [("p50", 0.5), ("p75", 0.75), ("p95", 0.95)] {
        let resolved = resolve(&format!("{name}(profile.duration)")).unwrap();
        assert_eq!(
            resolved.expr,
            parametric("quantile", vec![Literal::Float(fraction)], vec![col("duration_ns")])
                .alias(&format!("{name}_profile_duration")),
        );
    }
}

#[test]
fn test_percentile_out_of_range() {
    let err = resolve("percentile(profile.duration, 1.5)").unwrap_err();
    assert_eq!(
        err,
        QueryError::InvalidFunctionArgument("1.5 must be less than or equal to 1".into())
    );
}

#[test]
fn test_percentile_renders_per_dialect() {
    let resolved = resolve("percentile(profile.duration, 0.9)").unwrap();
    assert_eq!(
        resolved.expr.to_sql(Dialect::ClickHouse),
        "quantile(0.9)(`duration_ns`) AS `percentile_profile_duration_0_9`"
    );
    assert_eq!(
        resolved.expr.to_sql(Dialect::DuckDb),
        "quantile_cont(\"duration_ns\", 0.9) AS \"percentile_profile_duration_0_9\""
    );
}

// ============================================================================
// Counting
// ============================================================================

#[test]
fn test_count_is_integer() {
    let resolved = resolve("count()").unwrap();
    assert_eq!(resolved.result_type, ColumnType::Kind(Kind::Integer));
    assert!(!resolved.forces_grouping);
}

#[test]
fn test_count_unique_requires_column() {
    assert_eq!(
        resolve("count_unique()").unwrap_err(),
        QueryError::MissingRequiredArgument {
            function: "count_unique".into(),
            expected: 1,
            actual: 0,
        }
    );
}

#[test]
fn test_count_unique_rejects_unknown_column() {
    assert_eq!(
        resolve("count_unique(not_a_real_column)").unwrap_err(),
        QueryError::InvalidFunctionArgument("not_a_real_column is not a valid column".into())
    );
}

#[test]
fn test_count_unique_renders_uniq() {
    let resolved = resolve("count_unique(trace)").unwrap();
    assert_eq!(
        resolved.expr.to_sql(Dialect::ClickHouse),
        "uniq(`trace_id`) AS `count_unique_trace`"
    );
    assert_eq!(
        resolved.expr.to_sql(Dialect::DuckDb),
        "approx_count_distinct(\"trace_id\") AS \"count_unique_trace\""
    );
}

// ============================================================================
// Numeric aggregates
// ============================================================================

#[test]
fn test_avg_rejects_string_column() {
    assert_eq!(
        resolve("avg(device.arch)").unwrap_err(),
        QueryError::InvalidFunctionArgument("device.arch is not a numeric column".into())
    );
}

#[test]
fn test_min_reports_nanoseconds() {
    let resolved = resolve("min(profile.duration)").unwrap();
    assert_eq!(
        resolved.result_type,
        ColumnType::Unit(DurationUnit::Nanosecond)
    );
    assert_eq!(resolved.result_type.to_string(), "nanosecond");
}

#[test]
fn test_sum_of_integer_column() {
    let resolved = resolve("sum(project.id)").unwrap();
    assert_eq!(resolved.result_type, ColumnType::Kind(Kind::Integer));
    assert!(!resolved.forces_grouping);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_resolution_is_deterministic() {
    for text in [
        "p75()",
        "percentile(profile.duration, 0.3)",
        "count_unique(os.name)",
        "latest_event()",
        "last_seen() AS seen",
    ] {
        assert_eq!(resolve(text).unwrap(), resolve(text).unwrap(), "{text}");
    }
}
