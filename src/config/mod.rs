//! Configuration module for profql.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{expand_env_vars, CompilerSettings, Settings, SettingsError};
