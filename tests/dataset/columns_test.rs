//! Integration tests for the profiles column registry.
//!
//! These tests verify alias lookups through the public dataset API.

use profql::dataset::{
    ColumnRegistry, ColumnType, DurationUnit, Kind, ParamsContext, ProfilesDatasetConfig,
    QueryError,
};

#[test]
fn test_every_alias_resolves() {
    let registry = ColumnRegistry::profiles();
    assert_eq!(registry.len(), 20);

    let params = ParamsContext::default();
    let config = ProfilesDatasetConfig::new(&params);

    for column in registry.iter() {
        assert_eq!(registry.resolve_column(column.alias).unwrap(), column.column);
        assert_eq!(registry.resolve_kind(column.alias), Some(column.kind));
        assert_eq!(
            config.resolve_column_type(column.alias),
            Some(column.unit_or_kind()),
            "{}",
            column.alias
        );
    }
}

#[test]
fn test_known_mappings() {
    let registry = ColumnRegistry::profiles();
    let cases = [
        ("organization.id", "organization_id"),
        ("trace.transaction", "transaction_id"),
        ("id", "profile_id"),
        ("timestamp", "received"),
        ("os.build", "device_os_build_number"),
        ("platform.name", "platform"),
        ("trace", "trace_id"),
        ("transaction", "transaction_name"),
        ("release", "version_name"),
    ];
    for (alias, column) in cases {
        assert_eq!(registry.resolve_column(alias).unwrap(), column, "{alias}");
    }
}

#[test]
fn test_unregistered_alias() {
    let params = ParamsContext::default();
    let config = ProfilesDatasetConfig::new(&params);

    assert_eq!(
        config.resolve_column("not_a_real_column"),
        Err(QueryError::UnknownField("not_a_real_column".into()))
    );
    assert_eq!(config.resolve_column_type("not_a_real_column"), None);
}

#[test]
fn test_column_types() {
    let params = ParamsContext::default();
    let config = ProfilesDatasetConfig::new(&params);

    assert_eq!(
        config.resolve_column_type("profile.duration"),
        Some(ColumnType::Unit(DurationUnit::Nanosecond))
    );
    assert_eq!(
        config.resolve_column_type("timestamp"),
        Some(ColumnType::Kind(Kind::Date))
    );
    assert_eq!(
        config.resolve_column_type("project.id"),
        Some(ColumnType::Kind(Kind::Integer))
    );
    assert_eq!(
        config.resolve_column_type("os.name"),
        Some(ColumnType::Kind(Kind::String))
    );
}

#[test]
fn test_column_type_serializes_as_name() {
    assert_eq!(
        serde_json::to_string(&ColumnType::Unit(DurationUnit::Nanosecond)).unwrap(),
        r#""nanosecond""#
    );
    assert_eq!(
        serde_json::to_string(&ColumnType::Kind(Kind::Integer)).unwrap(),
        r#""integer""#
    );
}
