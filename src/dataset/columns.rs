//! The profiles column registry.
//!
//! Maps the field names query authors see to the physical columns of the
//! profiles entity. Built once and shared read-only.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::error::{QueryError, QueryResult};
use super::types::{ColumnType, DurationUnit, Kind, Unit};
use crate::sql::expr::{col, entity_col, Expr};

/// A column exposed to query authors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// The external name to expose.
    pub alias: &'static str,
    /// The physical name in the backend.
    pub column: &'static str,
    pub kind: Kind,
    /// Some kinds carry a unit.
    pub unit: Option<Unit>,
}

impl Column {
    const fn new(alias: &'static str, column: &'static str, kind: Kind) -> Self {
        Self {
            alias,
            column,
            kind,
            unit: None,
        }
    }

    const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// The unit if the column declares one, otherwise the kind.
    pub fn unit_or_kind(&self) -> ColumnType {
        match self.unit {
            Some(unit) => ColumnType::Unit(unit),
            None => ColumnType::Kind(self.kind),
        }
    }
}

const PROFILE_COLUMNS: &[Column] = &[
    Column::new("organization.id", "organization_id", Kind::Integer),
    Column::new("project.id", "project_id", Kind::Integer),
    Column::new("trace.transaction", "transaction_id", Kind::String),
    Column::new("id", "profile_id", Kind::String),
    Column::new("timestamp", "received", Kind::Date),
    Column::new("device.arch", "architecture", Kind::String),
    Column::new("device.classification", "device_classification", Kind::String),
    Column::new("device.locale", "device_locale", Kind::String),
    Column::new("device.manufacturer", "device_manufacturer", Kind::String),
    Column::new("device.model", "device_model", Kind::String),
    Column::new("os.build", "device_os_build_number", Kind::String),
    Column::new("os.name", "device_os_name", Kind::String),
    Column::new("os.version", "device_os_version", Kind::String),
    Column::new("profile.duration", "duration_ns", Kind::Duration)
        .with_unit(DurationUnit::Nanosecond),
    Column::new("environment", "environment", Kind::String),
    Column::new("platform.name", "platform", Kind::String),
    Column::new("trace", "trace_id", Kind::String),
    Column::new("transaction", "transaction_name", Kind::String),
    // Legacy profiles also carry `version_code`; only `version_name` is exposed.
    Column::new("release", "version_name", Kind::String),
    // The query builder refers to `project_id` internally.
    Column::new("project_id", "project_id", Kind::Integer),
];

/// Alias → column lookup table.
#[derive(Debug)]
pub struct ColumnRegistry {
    columns: Vec<Column>,
    by_alias: HashMap<&'static str, usize>,
}

impl ColumnRegistry {
    /// Build a registry. Aliases must be unique; a repeated alias keeps its
    /// first definition.
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut registry = Self {
            columns: Vec::new(),
            by_alias: HashMap::new(),
        };
        for column in columns {
            if registry.by_alias.contains_key(column.alias) {
                tracing::warn!(alias = column.alias, "duplicate column alias ignored");
                continue;
            }
            registry
                .by_alias
                .insert(column.alias, registry.columns.len());
            registry.columns.push(column);
        }
        registry
    }

    /// The process-wide profiles registry.
    pub fn profiles() -> &'static ColumnRegistry {
        static REGISTRY: OnceLock<ColumnRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| ColumnRegistry::new(PROFILE_COLUMNS.iter().copied()))
    }

    pub fn get(&self, alias: &str) -> Option<&Column> {
        self.by_alias.get(alias).map(|&i| &self.columns[i])
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    /// Columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Physical column name for an alias.
    pub fn resolve_column(&self, alias: &str) -> QueryResult<&'static str> {
        self.get(alias)
            .map(|c| c.column)
            .ok_or_else(|| QueryError::UnknownField(alias.to_string()))
    }

    /// Kind of a column, `None` when the alias is unknown.
    pub fn resolve_kind(&self, alias: &str) -> Option<Kind> {
        self.get(alias).map(|c| c.kind)
    }

    /// Unit of a column if it has one, else its kind; `None` when unknown.
    pub fn resolve_unit_or_kind(&self, alias: &str) -> Option<ColumnType> {
        self.get(alias).map(Column::unit_or_kind)
    }

    /// Column reference for an alias, qualified with `entity` when given.
    pub fn column_expr(&self, alias: &str, entity: Option<&str>) -> QueryResult<Expr> {
        let name = self.resolve_column(alias)?;
        Ok(match entity {
            Some(entity) => entity_col(entity, name),
            None => col(name),
        })
    }
}
