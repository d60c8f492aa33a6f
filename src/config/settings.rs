//! TOML-based configuration for profql.
//!
//! Supports a config file (profql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! dialect = "duckdb"
//! entity = "${PROFILES_ENTITY}"
//! qualify_columns = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Compiler configuration.
    pub compiler: CompilerSettings,
}

/// Compiler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Target dialect (clickhouse, duckdb).
    pub dialect: String,

    /// Entity the queries run against (supports ${ENV_VAR} expansion).
    pub entity: String,

    /// Qualify column references with the entity name.
    pub qualify_columns: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            dialect: "clickhouse".to_string(),
            entity: "profiles".to_string(),
            qualify_columns: false,
        }
    }
}

impl CompilerSettings {
    /// Get the dialect.
    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        self.dialect
            .parse()
            .map_err(|_| SettingsError::UnsupportedDialect(self.dialect.clone()))
    }

    /// Get the entity name with environment variables expanded.
    pub fn resolved_entity(&self) -> Result<String, SettingsError> {
        let entity = expand_env_vars(&self.entity)?;
        if entity.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "compiler.entity must not be empty".to_string(),
            ));
        }
        Ok(entity)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse settings from TOML text and check them.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `PROFQL_CONFIG`
    /// 2. `./profql.toml`
    /// 3. `~/.config/profql/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("PROFQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("profql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("profql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        tracing::debug!("no config file found, using defaults");
        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        self.compiler.dialect()?;
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                var_name.push(ch);
            }
            if !closed {
                return Err(SettingsError::InvalidConfig(format!(
                    "unterminated variable reference in {s:?}"
                )));
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
            } else {
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}
