//! Database drivers a connection setting can name.

use super::settings::SettingsError;
use crate::sql::dialect::Dialect;

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// SQLite (file or in-memory)
    Sqlite,
    /// PostgreSQL
    Postgres,
    /// Microsoft SQL Server
    SqlServer,
    /// MySQL / MariaDB
    MySql,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, SettingsError> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Driver::Postgres),
            "mssql" | "sqlserver" | "sql_server" => Ok(Driver::SqlServer),
            "mysql" | "mariadb" => Ok(Driver::MySql),
            other => Err(SettingsError::UnsupportedDriver(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Postgres => "postgres",
            Driver::SqlServer => "mssql",
            Driver::MySql => "mysql",
        }
    }

    /// Dialect the compiler should target for this driver.
    pub fn dialect(&self) -> Dialect {
        match self {
            Driver::Sqlite => Dialect::Sqlite,
            Driver::Postgres => Dialect::Postgres,
            Driver::SqlServer => Dialect::SqlServer,
            Driver::MySql => Dialect::MySql,
        }
    }

    /// Schema unqualified names resolve to.
    pub fn default_schema(&self) -> &'static str {
        match self {
            Driver::Sqlite => "main",
            Driver::Postgres => "public",
            Driver::SqlServer => "dbo",
            Driver::MySql => "",
        }
    }

    /// Get the default port for this driver.
    pub fn default_port(&self) -> u16 {
        match self {
            Driver::Sqlite => 0, // Not applicable
            Driver::Postgres => 5432,
            Driver::SqlServer => 1433,
            Driver::MySql => 3306,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_from_str() {
        assert_eq!(Driver::from_str("SQLite").unwrap(), Driver::Sqlite);
        assert_eq!(Driver::from_str("postgresql").unwrap(), Driver::Postgres);
        assert_eq!(Driver::from_str("sqlserver").unwrap(), Driver::SqlServer);
        assert_eq!(Driver::from_str("mariadb").unwrap(), Driver::MySql);
        assert!(Driver::from_str("oracle").is_err());
    }

    #[test]
    fn test_driver_dialect() {
        assert_eq!(Driver::SqlServer.dialect(), Dialect::SqlServer);
        assert_eq!(Driver::Sqlite.default_schema(), "main");
        assert_eq!(Driver::Postgres.default_port(), 5432);
    }
}
