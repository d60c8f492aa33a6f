//! The profiles dataset: columns, functions and aliases exposed to query
//! authors, and their compilation into backend expressions.

pub mod aliases;
pub mod arguments;
pub mod columns;
pub mod config;
pub mod error;
pub mod functions;
pub mod types;

pub use aliases::{ParamsContext, Project};
pub use arguments::{ArgValue, Argument, ArgumentValidator, ResolvedArgs};
pub use columns::{Column, ColumnRegistry};
pub use config::{ProfilesDatasetConfig, ResolvedField};
pub use error::{QueryError, QueryResult};
pub use functions::{BuildContext, FunctionRegistry, FunctionSpec, ResolvedFunction};
pub use types::{ColumnType, DurationUnit, Kind, Unit};
