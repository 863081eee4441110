//! Provider-independent scalar types.
//!
//! `ValueType` describes a column, parameter, or cast target without
//! committing to any provider's spelling. Dialects turn it into native
//! type names through `SqlDialect::emit_data_type`; extractors turn native
//! names back into a `ValueType` with [`ValueType::parse`].
//!
//! # Examples
//!
//! ```ignore
//! use lattice::sql::types::{Length, ValueType};
//!
//! let name = ValueType::VarChar(Length::Fixed(100));
//! assert_eq!(name.length(), Some(Length::Fixed(100)));
//!
//! assert_eq!(ValueType::parse("numeric(10,2)"), Some(ValueType::Decimal(10, 2)));
//! assert_eq!(ValueType::parse("nvarchar(max)"), Some(ValueType::VarChar(Length::Max)));
//! ```

use std::fmt;

/// Declared length of a string or binary type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    Fixed(u32),
    /// Provider maximum (`MAX`, `TEXT`-like storage).
    Max,
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Fixed(n) => write!(f, "{}", n),
            Length::Max => write!(f, "MAX"),
        }
    }
}

/// Provider-independent scalar type. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Fixed-precision decimal: precision (total digits), scale (fraction digits).
    Decimal(u8, u8),
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    Char(u32),
    VarChar(Length),
    /// Unbounded character data.
    Text,
    Binary(u32),
    VarBinary(Length),
    /// Timestamp without time zone.
    DateTime,
    /// Timestamp carrying a UTC offset.
    DateTimeOffset,
    Date,
    Time,
    /// Duration.
    Interval,
    Guid,
    Json,
}

impl ValueType {
    /// Declared length for character and binary types.
    pub fn length(&self) -> Option<Length> {
        match self {
            ValueType::Char(n) | ValueType::Binary(n) => Some(Length::Fixed(*n)),
            ValueType::VarChar(len) | ValueType::VarBinary(len) => Some(*len),
            ValueType::Text => Some(Length::Max),
            _ => None,
        }
    }

    /// Precision for decimal types.
    pub fn precision(&self) -> Option<u8> {
        match self {
            ValueType::Decimal(p, _) => Some(*p),
            _ => None,
        }
    }

    /// Scale for decimal types.
    pub fn scale(&self) -> Option<u8> {
        match self {
            ValueType::Decimal(_, s) => Some(*s),
            _ => None,
        }
    }

    /// Parse a provider type name.
    ///
    /// Accepts the spellings the supported providers report back from their
    /// catalogs (`int4`, `bigint`, `numeric(10,2)`, `nvarchar(max)`,
    /// `datetime2`, `timestamptz`, `bytea`, `uniqueidentifier`, ...).
    /// Returns `None` for names with no portable equivalent.
    pub fn parse(s: &str) -> Option<Self> {
        let s = normalize(s);

        if let Some(inner) = extract_parens(&s, "decimal").or_else(|| extract_parens(&s, "numeric")) {
            return parse_decimal_params(&inner);
        }

        if let Some(inner) = extract_parens(&s, "varchar")
            .or_else(|| extract_parens(&s, "character varying"))
            .or_else(|| extract_parens(&s, "nvarchar"))
        {
            return parse_length(&inner).map(ValueType::VarChar);
        }

        if let Some(inner) = extract_parens(&s, "char")
            .or_else(|| extract_parens(&s, "character"))
            .or_else(|| extract_parens(&s, "nchar"))
        {
            return parse_fixed(&inner).map(ValueType::Char);
        }

        if let Some(inner) = extract_parens(&s, "varbinary") {
            return parse_length(&inner).map(ValueType::VarBinary);
        }

        if let Some(inner) = extract_parens(&s, "binary") {
            return parse_fixed(&inner).map(ValueType::Binary);
        }

        // Precision suffixes that do not change the portable type
        for (prefix, ty) in [
            ("datetime2", ValueType::DateTime),
            ("datetimeoffset", ValueType::DateTimeOffset),
            ("datetime", ValueType::DateTime),
            ("timestamp", ValueType::DateTime),
            ("timestamptz", ValueType::DateTimeOffset),
            ("time", ValueType::Time),
            ("float", ValueType::Double),
        ] {
            if extract_parens(&s, prefix).is_some() {
                return Some(ty);
            }
        }
        if s == "tinyint(1)" {
            return Some(ValueType::Boolean);
        }

        match s.as_str() {
            "bool" | "boolean" | "bit" => Some(ValueType::Boolean),

            "tinyint" | "int1" => Some(ValueType::Int8),
            "smallint" | "int2" => Some(ValueType::Int16),
            "int" | "integer" | "int4" | "mediumint" => Some(ValueType::Int32),
            "bigint" | "int8" => Some(ValueType::Int64),

            "real" | "float4" => Some(ValueType::Float),
            "double" | "float8" | "double precision" | "float" => Some(ValueType::Double),

            "decimal" | "numeric" => Some(ValueType::Decimal(18, 2)),

            "text" | "ntext" | "clob" | "longtext" | "mediumtext" => Some(ValueType::Text),
            "varchar" | "nvarchar" | "character varying" => Some(ValueType::VarChar(Length::Max)),
            "char" | "character" | "nchar" | "bpchar" => Some(ValueType::Char(1)),

            "binary" => Some(ValueType::Binary(1)),
            "varbinary" | "blob" | "longblob" | "bytea" | "image" => {
                Some(ValueType::VarBinary(Length::Max))
            }

            "date" => Some(ValueType::Date),
            "time" | "time without time zone" => Some(ValueType::Time),
            "timestamp" | "datetime" | "datetime2" | "timestamp without time zone" => {
                Some(ValueType::DateTime)
            }
            "timestamptz" | "timestamp with time zone" | "datetimeoffset" => {
                Some(ValueType::DateTimeOffset)
            }
            "interval" => Some(ValueType::Interval),

            "uuid" | "guid" | "uniqueidentifier" => Some(ValueType::Guid),
            "json" | "jsonb" => Some(ValueType::Json),

            _ => None,
        }
    }

    /// Returns true for integer, floating point, and decimal types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueType::Int8
                | ValueType::Int16
                | ValueType::Int32
                | ValueType::Int64
                | ValueType::Float
                | ValueType::Double
                | ValueType::Decimal(_, _)
        )
    }

    /// Returns true for integer types.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueType::Int8 | ValueType::Int16 | ValueType::Int32 | ValueType::Int64
        )
    }

    /// Returns true for character types.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            ValueType::Char(_) | ValueType::VarChar(_) | ValueType::Text
        )
    }

    /// Returns true for binary types.
    pub fn is_binary(&self) -> bool {
        matches!(self, ValueType::Binary(_) | ValueType::VarBinary(_))
    }

    /// Returns true for date, time, timestamp, and interval types.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ValueType::Date
                | ValueType::Time
                | ValueType::DateTime
                | ValueType::DateTimeOffset
                | ValueType::Interval
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Boolean => write!(f, "BOOLEAN"),
            ValueType::Int8 => write!(f, "TINYINT"),
            ValueType::Int16 => write!(f, "SMALLINT"),
            ValueType::Int32 => write!(f, "INTEGER"),
            ValueType::Int64 => write!(f, "BIGINT"),
            ValueType::Decimal(p, s) => write!(f, "DECIMAL({}, {})", p, s),
            ValueType::Float => write!(f, "REAL"),
            ValueType::Double => write!(f, "DOUBLE PRECISION"),
            ValueType::Char(n) => write!(f, "CHAR({})", n),
            ValueType::VarChar(len) => write!(f, "VARCHAR({})", len),
            ValueType::Text => write!(f, "TEXT"),
            ValueType::Binary(n) => write!(f, "BINARY({})", n),
            ValueType::VarBinary(len) => write!(f, "VARBINARY({})", len),
            ValueType::DateTime => write!(f, "TIMESTAMP"),
            ValueType::DateTimeOffset => write!(f, "TIMESTAMP WITH TIME ZONE"),
            ValueType::Date => write!(f, "DATE"),
            ValueType::Time => write!(f, "TIME"),
            ValueType::Interval => write!(f, "INTERVAL"),
            ValueType::Guid => write!(f, "UUID"),
            ValueType::Json => write!(f, "JSON"),
        }
    }
}

/// Lowercase, trim, and collapse runs of whitespace.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Extract content inside parentheses for a given type prefix.
/// e.g., extract_parens("decimal(10,2)", "decimal") returns Some("10,2")
fn extract_parens(s: &str, prefix: &str) -> Option<String> {
    let rest = s.strip_prefix(prefix)?.trim();
    if !rest.starts_with('(') || !rest.ends_with(')') {
        return None;
    }
    Some(rest[1..rest.len() - 1].to_string())
}

/// Parse decimal parameters "precision,scale" or "precision".
fn parse_decimal_params(inner: &str) -> Option<ValueType> {
    let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
    match parts.as_slice() {
        [p] => Some(ValueType::Decimal(p.parse().ok()?, 0)),
        [p, s] => {
            let precision: u8 = p.parse().ok()?;
            let scale: u8 = s.parse().ok()?;
            if scale > precision {
                return None;
            }
            Some(ValueType::Decimal(precision, scale))
        }
        _ => None,
    }
}

fn parse_fixed(inner: &str) -> Option<u32> {
    inner.trim().parse().ok()
}

fn parse_length(inner: &str) -> Option<Length> {
    let inner = inner.trim();
    if inner.eq_ignore_ascii_case("max") {
        return Some(Length::Max);
    }
    inner.parse().ok().map(Length::Fixed)
}
