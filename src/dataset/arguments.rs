//! Function argument validators.
//!
//! Each argument slot of a function carries a validator that normalizes the
//! raw text from the query before the function's builder runs.

use super::columns::ColumnRegistry;
use super::error::{QueryError, QueryResult};

/// A validated argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A registered column alias. Builders map it to the physical column.
    Column(String),
    Number(f64),
    /// An absent optional argument, or a placeholder that was discarded.
    Null,
}

/// How an argument is checked and normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValidator {
    /// Any registered column.
    Column,
    /// A registered column of an integer, duration or number kind.
    NumericColumn,
    /// A number within `[low, high]`.
    NumberRange { low: f64, high: f64 },
    /// Accepted and discarded; keeps legacy call signatures valid.
    NullColumn,
    /// Substitutes `default` when the argument is absent, then validates it
    /// with `inner` like any other value.
    Defaulted {
        inner: Box<ArgumentValidator>,
        default: &'static str,
    },
}

impl ArgumentValidator {
    /// Validate a raw argument, `None` meaning the caller did not supply it.
    pub fn validate(&self, raw: Option<&str>, columns: &ColumnRegistry) -> QueryResult<ArgValue> {
        match self {
            ArgumentValidator::Defaulted { inner, default } => {
                inner.validate(Some(raw.unwrap_or(default)), columns)
            }
            ArgumentValidator::NullColumn => Ok(ArgValue::Null),
            _ => match raw {
                Some(raw) => self.validate_present(raw, columns),
                None => Ok(ArgValue::Null),
            },
        }
    }

    fn validate_present(&self, raw: &str, columns: &ColumnRegistry) -> QueryResult<ArgValue> {
        match self {
            ArgumentValidator::Column => {
                if columns.contains(raw) {
                    Ok(ArgValue::Column(raw.to_string()))
                } else {
                    Err(invalid(format!("{raw} is not a valid column")))
                }
            }
            ArgumentValidator::NumericColumn => match columns.get(raw) {
                None => Err(invalid(format!("{raw} is not a valid column"))),
                Some(column) if column.kind.is_numeric() => Ok(ArgValue::Column(raw.to_string())),
                Some(_) => Err(invalid(format!("{raw} is not a numeric column"))),
            },
            ArgumentValidator::NumberRange { low, high } => {
                let value: f64 = match raw.trim().parse() {
                    Ok(v) if f64::is_finite(v) => v,
                    _ => return Err(invalid(format!("{raw} is not a number"))),
                };
                if value < *low {
                    return Err(invalid(format!(
                        "{value} must be greater than or equal to {low}"
                    )));
                }
                if value > *high {
                    return Err(invalid(format!("{value} must be less than or equal to {high}")));
                }
                Ok(ArgValue::Number(value))
            }
            ArgumentValidator::NullColumn => Ok(ArgValue::Null),
            ArgumentValidator::Defaulted { inner, .. } => inner.validate_present(raw, columns),
        }
    }
}

fn invalid(message: String) -> QueryError {
    QueryError::InvalidFunctionArgument(message)
}

/// A named argument slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: &'static str,
    pub validator: ArgumentValidator,
}

impl Argument {
    pub fn column(name: &'static str) -> Self {
        Self {
            name,
            validator: ArgumentValidator::Column,
        }
    }

    pub fn numeric_column(name: &'static str) -> Self {
        Self {
            name,
            validator: ArgumentValidator::NumericColumn,
        }
    }

    pub fn number_range(name: &'static str, low: f64, high: f64) -> Self {
        Self {
            name,
            validator: ArgumentValidator::NumberRange { low, high },
        }
    }

    pub fn null_column(name: &'static str) -> Self {
        Self {
            name,
            validator: ArgumentValidator::NullColumn,
        }
    }

    /// Use `default` when this argument is omitted.
    pub fn with_default(self, default: &'static str) -> Self {
        Self {
            name: self.name,
            validator: ArgumentValidator::Defaulted {
                inner: Box::new(self.validator),
                default,
            },
        }
    }

    pub fn validate(&self, raw: Option<&str>, columns: &ColumnRegistry) -> QueryResult<ArgValue> {
        self.validator.validate(raw, columns)
    }
}

/// Validated arguments of one call, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedArgs {
    values: Vec<(&'static str, ArgValue)>,
}

impl ResolvedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, value: ArgValue) {
        self.values.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| value)
    }

    /// The column alias bound to `name`, if any.
    pub fn column(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ArgValue::Column(alias)) => Some(alias),
            _ => None,
        }
    }

    /// The number bound to `name`, if any.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(ArgValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    /// Every column alias referenced by the call.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(|(_, value)| match value {
            ArgValue::Column(alias) => Some(alias.as_str()),
            _ => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ArgValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
