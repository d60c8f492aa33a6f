//! Column kinds and units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Date,
    Duration,
    Integer,
    Number,
    String,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Date => "date",
            Kind::Duration => "duration",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
        }
    }

    /// Kinds accepted where a numeric column is required.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Kind::Integer | Kind::Duration | Kind::Number)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-duration units, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
}

/// The only units available right now are duration based.
pub type Unit = DurationUnit;

impl DurationUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Nanosecond => "nanosecond",
            DurationUnit::Microsecond => "microsecond",
            DurationUnit::Millisecond => "millisecond",
            DurationUnit::Second => "second",
            DurationUnit::Minute => "minute",
            DurationUnit::Hour => "hour",
            DurationUnit::Day => "day",
            DurationUnit::Week => "week",
        }
    }

    /// Length of one unit in nanoseconds.
    pub fn nanoseconds(&self) -> f64 {
        match self {
            DurationUnit::Nanosecond => 1.0,
            DurationUnit::Microsecond => 1e3,
            DurationUnit::Millisecond => 1e6,
            DurationUnit::Second => 1e9,
            DurationUnit::Minute => 60e9,
            DurationUnit::Hour => 3_600e9,
            DurationUnit::Day => 86_400e9,
            DurationUnit::Week => 604_800e9,
        }
    }

    /// Parse the suffix used in search values, e.g. the `ms` of `250ms`.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ns" => Some(DurationUnit::Nanosecond),
            "us" => Some(DurationUnit::Microsecond),
            "ms" => Some(DurationUnit::Millisecond),
            "s" => Some(DurationUnit::Second),
            "m" | "min" => Some(DurationUnit::Minute),
            "h" | "hr" => Some(DurationUnit::Hour),
            "d" => Some(DurationUnit::Day),
            "w" | "wk" => Some(DurationUnit::Week),
            _ => None,
        }
    }

    /// Convert `value` expressed in `self` into `target` units.
    pub fn convert(&self, value: f64, target: DurationUnit) -> f64 {
        value * self.nanoseconds() / target.nanoseconds()
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory type reported for a column or function result.
///
/// A unit takes priority over the bare kind, so display layers can pick the
/// right scale (`"nanosecond"` rather than `"duration"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnType {
    Kind(Kind),
    Unit(Unit),
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Kind(kind) => kind.as_str(),
            ColumnType::Unit(unit) => unit.as_str(),
        }
    }
}

impl From<Kind> for ColumnType {
    fn from(kind: Kind) -> Self {
        ColumnType::Kind(kind)
    }
}

impl From<Unit> for ColumnType {
    fn from(unit: Unit) -> Self {
        ColumnType::Unit(unit)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
