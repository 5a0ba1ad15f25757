//! Engine configuration
//!
//! Loaded from TOML; every field has a default so a partial file (or none at
//! all) is valid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub security: SecurityConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Database owner; bypasses every privilege check (default: DBA)
    pub database_owner: String,
    /// Enforce privileges (default: true). When false every check passes.
    pub sql_authorization: bool,
    /// Functions installed in `SYSFUN`; executable by everyone, never grantable
    pub builtin_functions: Vec<String>,
    /// `SYSCS_UTIL` routines that may be granted, as `SYSCS_UTIL.NAME`
    pub grantable_system_routines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Maximum nesting of trigger firings (default: 16)
    pub max_trigger_depth: usize,
    /// Maximum nesting of views, triggers and routine calls (default: 64)
    pub max_nesting_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        let builtin = [
            "ABS", "ACOS", "ASIN", "ATAN", "COS", "SIN", "TAN", "COT", "DEGREES", "RADIANS",
            "EXP", "LN", "LOG", "LOG10", "CEIL", "FLOOR", "SIGN", "PI", "RAND", "RANDOM", "SQRT",
        ];
        let grantable = [
            "SYSCS_UTIL.SYSCS_EXPORT_TABLE",
            "SYSCS_UTIL.SYSCS_IMPORT_TABLE",
            "SYSCS_UTIL.SYSCS_COMPRESS_TABLE",
            "SYSCS_UTIL.SYSCS_CHECK_TABLE",
            "SYSCS_UTIL.SYSCS_BACKUP_DATABASE",
            "SYSCS_UTIL.SYSCS_CHECKPOINT_DATABASE",
            "SYSCS_UTIL.SYSCS_SET_RUNTIMESTATISTICS",
            "SYSCS_UTIL.SYSCS_GET_RUNTIMESTATISTICS",
        ];
        SecurityConfig {
            database_owner: "DBA".to_string(),
            sql_authorization: true,
            builtin_functions: builtin.iter().map(|s| s.to_string()).collect(),
            grantable_system_routines: grantable.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig { max_trigger_depth: 16, max_nesting_depth: 64 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".to_string() }
    }
}

impl SecurityConfig {
    pub fn is_builtin_function(&self, name: &str) -> bool {
        self.builtin_functions.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    pub fn is_grantable_system_routine(&self, qualified_name: &str) -> bool {
        self.grantable_system_routines.iter().any(|r| r.eq_ignore_ascii_case(qualified_name))
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.security.database_owner, "DBA");
        assert!(config.security.sql_authorization);
        assert!(config.security.is_builtin_function("sqrt"));
        assert_eq!(config.execution.max_trigger_depth, 16);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [security]
            database_owner = "ADMIN"

            [execution]
            max_trigger_depth = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.security.database_owner, "ADMIN");
        assert!(config.security.sql_authorization);
        assert_eq!(config.execution.max_trigger_depth, 4);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[security]\nsql_authorization = false\n[logging]\nlevel = \"debug\"").unwrap();
        let config = EngineConfig::load_from(file.path()).unwrap();
        assert!(!config.security.sql_authorization);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_file_is_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("[execution]\nmax_trigger_depth = \"deep\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::load_from("/nonexistent/sqlauthz.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
