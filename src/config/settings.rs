//! TOML-based configuration for Lattice.
//!
//! Supports a config file (lattice.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! dialect = "postgres"
//!
//! [type_mapping]
//! infinity_conversions = true
//! legacy_timestamp_behavior = false
//! session_time_zone = "+02:00"
//!
//! [connections.local]
//! driver = "sqlite"
//! connection_string = "${LATTICE_DB:-:memory:}"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;

use super::connection::Driver;
use crate::extract::{Connection, SqliteConnection};
use crate::mapping::{resolve_timezone, switches, MappingOptions};
use crate::sql::compiler::Compiler;
use crate::sql::dialect::Dialect;

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

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Unrecognized time zone: {0}")]
    InvalidTimeZone(String),

    #[error("Failed to open connection: {0}")]
    Connect(#[from] crate::error::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerSettings,

    pub type_mapping: TypeMappingSettings,

    /// Named database connections.
    pub connections: BTreeMap<String, ConnectionSettings>,
}

/// Compiler configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Target dialect (postgres, sqlserver, mysql, sqlite, ansi).
    pub dialect: Dialect,
}

/// Type-mapping switches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TypeMappingSettings {
    /// Map host temporal bounds to provider infinity values and back.
    pub infinity_conversions: bool,

    /// Offset-preserving timestamp writes with session-offset reads.
    pub legacy_timestamp_behavior: bool,

    /// Session time zone used by legacy timestamp mode (e.g. "+02:00",
    /// "Etc/GMT-2", "<+02>-02"). UTC when absent.
    pub session_time_zone: Option<String>,
}

impl Default for TypeMappingSettings {
    fn default() -> Self {
        Self {
            infinity_conversions: true,
            legacy_timestamp_behavior: false,
            session_time_zone: None,
        }
    }
}

impl TypeMappingSettings {
    /// The configured session offset, if any.
    pub fn session_offset(&self) -> Result<Option<FixedOffset>, SettingsError> {
        match &self.session_time_zone {
            None => Ok(None),
            Some(zone) => {
                let zone = expand_env_vars(zone)?;
                resolve_timezone(&zone)
                    .map(Some)
                    .ok_or(SettingsError::InvalidTimeZone(zone))
            }
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database driver (sqlite, postgres, sqlserver, mysql).
    pub driver: String,

    /// Connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Default schema for this connection.
    #[serde(default)]
    pub default_schema: Option<String>,
}

impl ConnectionSettings {
    /// Get the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Driver::from_str(&self.driver)
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.connection_string)
    }

    /// Schema extraction and table creation default to.
    pub fn schema(&self) -> Result<String, SettingsError> {
        match &self.default_schema {
            Some(schema) => Ok(schema.clone()),
            None => Ok(self.driver_type()?.default_schema().to_string()),
        }
    }

    /// Open a live connection. Only SQLite is linked in.
    pub fn connect(&self) -> Result<Box<dyn Connection>, SettingsError> {
        match self.driver_type()? {
            Driver::Sqlite => {
                let target = self.resolved_connection_string()?;
                tracing::debug!(target = %target, "opening sqlite connection");
                Ok(Box::new(SqliteConnection::open_target(&target)?))
            }
            other => Err(SettingsError::UnsupportedDriver(format!(
                "{} (no client linked)",
                other.as_str()
            ))),
        }
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
        Self::parse(&content)
    }

    /// Parse settings from TOML text.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `LATTICE_CONFIG`
    /// 2. `./lattice.toml`
    /// 3. `~/.config/lattice/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("LATTICE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("lattice.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lattice").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Get a connection by name.
    pub fn get_connection(&self, name: &str) -> Result<&ConnectionSettings, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))
    }

    /// Get the default connection ("default" if it exists, else the first by name).
    pub fn default_connection(&self) -> Option<(&str, &ConnectionSettings)> {
        if let Some(conn) = self.connections.get("default") {
            return Some(("default", conn));
        }
        self.connections.iter().next().map(|(k, v)| (k.as_str(), v))
    }

    /// Mapping context for these settings. Does not touch the process-wide
    /// switches.
    pub fn mapping_options(&self) -> Result<MappingOptions, SettingsError> {
        let mut options = MappingOptions::default()
            .with_infinity_aliasing(self.type_mapping.infinity_conversions)
            .with_legacy_timestamps(self.type_mapping.legacy_timestamp_behavior);
        if let Some(offset) = self.type_mapping.session_offset()? {
            options = options.with_session_offset(offset);
        }
        Ok(options)
    }

    /// Push the type-mapping flags into the process-wide switches.
    pub fn apply_switches(&self) {
        switches::set_infinity_conversions(self.type_mapping.infinity_conversions);
        switches::set_legacy_timestamp_behavior(self.type_mapping.legacy_timestamp_behavior);
        tracing::debug!(
            infinity = self.type_mapping.infinity_conversions,
            legacy_timestamps = self.type_mapping.legacy_timestamp_behavior,
            "applied type mapping switches"
        );
    }

    /// A compiler for the configured dialect and mapping options.
    pub fn compiler(&self) -> Result<Compiler, SettingsError> {
        Ok(Compiler::new(self.compiler.dialect).with_options(self.mapping_options()?))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}`, `${VAR:-default}` and `$VAR` syntax. A `$` not
/// followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }
        if chars.peek() == Some(&'{') {
            chars.next();
            let mut body = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                body.push(ch);
            }
            if !closed {
                return Err(SettingsError::MissingEnvVar(body));
            }
            let (name, fallback) = match body.split_once(":-") {
                Some((name, fallback)) => (name, Some(fallback)),
                None => (body.as_str(), None),
            };
            // `:-` also replaces a variable that is set but empty
            match (env::var(name), fallback) {
                (Ok(value), None) => result.push_str(&value),
                (Ok(value), Some(_)) if !value.is_empty() => result.push_str(&value),
                (_, Some(fallback)) => result.push_str(fallback),
                (Err(_), None) => return Err(SettingsError::MissingEnvVar(name.to_string())),
            }
        } else {
            // $VAR ends at the first character that cannot be in a name
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_braces() {
        env::set_var("LATTICE_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("${LATTICE_TEST_VAR}").unwrap(), "hello");
        assert_eq!(
            expand_env_vars("prefix_${LATTICE_TEST_VAR}_suffix").unwrap(),
            "prefix_hello_suffix"
        );
        env::remove_var("LATTICE_TEST_VAR");
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        env::set_var("LATTICE_TEST_VAR2", "world");
        assert_eq!(expand_env_vars("$LATTICE_TEST_VAR2").unwrap(), "world");
        assert_eq!(expand_env_vars("$LATTICE_TEST_VAR2!").unwrap(), "world!");
        assert_eq!(expand_env_vars("cost: $").unwrap(), "cost: $");
        env::remove_var("LATTICE_TEST_VAR2");
    }

    #[test]
    fn test_expand_env_vars_default() {
        assert_eq!(
            expand_env_vars("${LATTICE_UNSET_12345:-:memory:}").unwrap(),
            ":memory:"
        );
        env::set_var("LATTICE_TEST_VAR3", "hr.db");
        assert_eq!(expand_env_vars("${LATTICE_TEST_VAR3:-x}").unwrap(), "hr.db");
        env::remove_var("LATTICE_TEST_VAR3");
    }

    #[test]
    fn test_expand_env_vars_empty_value() {
        env::set_var("LATTICE_TEST_EMPTY", "");
        assert_eq!(expand_env_vars("[${LATTICE_TEST_EMPTY}]").unwrap(), "[]");
        assert_eq!(
            expand_env_vars("${LATTICE_TEST_EMPTY:-fallback}").unwrap(),
            "fallback"
        );
        env::remove_var("LATTICE_TEST_EMPTY");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        assert!(matches!(
            expand_env_vars("${LATTICE_NONEXISTENT_12345}"),
            Err(SettingsError::MissingEnvVar(_))
        ));
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[compiler]
dialect = "sqlserver"

[type_mapping]
infinity_conversions = false
legacy_timestamp_behavior = true
session_time_zone = "<+02>-02"

[connections.local]
driver = "sqlite"
connection_string = ":memory:"

[connections.warehouse]
driver = "postgres"
connection_string = "host=localhost dbname=hr"
default_schema = "hr"
"#;

        let settings = Settings::parse(toml).unwrap();
        assert_eq!(settings.compiler.dialect, Dialect::SqlServer);
        assert!(!settings.type_mapping.infinity_conversions);
        assert_eq!(settings.connections.len(), 2);

        let options = settings.mapping_options().unwrap();
        assert!(!options.infinity_aliasing);
        assert!(options.legacy_timestamps);
        assert_eq!(options.session_offset.local_minus_utc(), 2 * 3600);

        let warehouse = settings.get_connection("warehouse").unwrap();
        assert_eq!(warehouse.driver_type().unwrap(), Driver::Postgres);
        assert_eq!(warehouse.schema().unwrap(), "hr");
        assert!(settings.get_connection("missing").is_err());
        assert_eq!(settings.default_connection().unwrap().0, "local");
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.compiler.dialect, Dialect::Postgres);
        assert!(settings.type_mapping.infinity_conversions);
        assert!(!settings.type_mapping.legacy_timestamp_behavior);
        assert_eq!(settings.mapping_options().unwrap(), MappingOptions::default());
    }

    #[test]
    fn test_invalid_time_zone() {
        let settings = Settings::parse("[type_mapping]\nsession_time_zone = \"Mars/Olympus\"").unwrap();
        assert!(matches!(
            settings.mapping_options(),
            Err(SettingsError::InvalidTimeZone(_))
        ));
    }

    #[test]
    fn test_connect_sqlite() {
        let settings = Settings::parse(
            "[connections.local]\ndriver = \"sqlite\"\nconnection_string = \":memory:\"",
        )
        .unwrap();
        let mut conn = settings.get_connection("local").unwrap().connect().unwrap();
        assert_eq!(conn.dialect(), Dialect::Sqlite);
        let rows = conn.query("SELECT 1 AS one", &[]).unwrap();
        assert_eq!(rows.len(), 1);

        let pg = ConnectionSettings {
            driver: "postgres".into(),
            connection_string: "host=localhost".into(),
            default_schema: None,
        };
        assert!(matches!(pg.connect(), Err(SettingsError::UnsupportedDriver(_))));
        assert!(matches!(
            Settings::parse("[compiler]\ndialect = \"oracle\""),
            Err(SettingsError::ParseError(_))
        ));
    }
}
