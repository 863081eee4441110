//! Crate-wide error taxonomy.
//!
//! Every failure is reported synchronously at the call that caused it.
//! Model construction errors are programmer errors and never retriable;
//! only provider-classified timeouts are distinguished so callers can pick
//! a retry policy of their own.

use thiserror::Error;

/// Result type for lattice operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the model, compiler, type mapping, and extraction layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Mutation attempted on a frozen model node.
    #[error("{entity} is frozen and cannot be modified")]
    ModelLocked { entity: String },

    /// A cross-reference does not resolve, or removal would orphan a dependent.
    #[error("referential integrity violation on {entity}: {detail}")]
    ReferentialIntegrityViolation { entity: String, detail: String },

    /// Name already used in its container.
    #[error("{kind} '{name}' already exists in {container}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        container: String,
    },

    /// Constraint added twice, or a second primary key.
    #[error("constraint '{name}' conflicts with an existing constraint on {table}")]
    DuplicateConstraint { name: String, table: String },

    /// Lookup miss on a named entity.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Structurally invalid model definition (empty key, bad sequence bounds, ...).
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// An index column must name exactly one of a column or an expression.
    #[error("index column must reference exactly one of a column or an expression")]
    InvalidIndexColumn,

    /// Column reference resolves to no source of the enclosing statement.
    #[error("column '{column}' does not resolve to any source of {statement}")]
    UnboundColumnReference { column: String, statement: String },

    /// Structurally invalid statement or expression (wrong arity, empty insert, ...).
    #[error("invalid statement: {0}")]
    InvalidStatement(String),

    /// The dialect cannot render a construct.
    #[error("{feature} is not supported by the {dialect} dialect")]
    UnsupportedFeature { feature: String, dialect: String },

    /// Host value does not fit the target type.
    #[error("value {value} is out of range for {target}")]
    ValueOutOfRange { value: String, target: String },

    /// Wire value could not be decoded into the requested host type.
    #[error("unrecognized native value {value} for {target}")]
    UnrecognizedNativeValue { value: String, target: String },

    /// Host value kind does not match the declared type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Provider reported a server-side statement timeout.
    #[error("operation timed out: {0}")]
    OperationTimeout(String),

    /// Any other provider error.
    #[error("database error: {0}")]
    Database(String),

    /// SQLite driver error.
    #[error("sqlite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

impl Error {
    pub(crate) fn locked(entity: impl Into<String>) -> Self {
        Error::ModelLocked {
            entity: entity.into(),
        }
    }

    pub(crate) fn integrity(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Error::ReferentialIntegrityViolation {
            entity: entity.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn duplicate(
        kind: &'static str,
        name: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Error::DuplicateName {
            kind,
            name: name.into(),
            container: container.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn unsupported(feature: impl Into<String>, dialect: impl Into<String>) -> Self {
        Error::UnsupportedFeature {
            feature: feature.into(),
            dialect: dialect.into(),
        }
    }

    pub(crate) fn out_of_range(value: impl ToString, target: impl ToString) -> Self {
        Error::ValueOutOfRange {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    pub(crate) fn unrecognized(value: impl ToString, target: impl ToString) -> Self {
        Error::UnrecognizedNativeValue {
            value: value.to_string(),
            target: target.to_string(),
        }
    }

    /// True when the provider classified this as a server-side timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::OperationTimeout(_))
    }

    /// Whether retrying the same call could succeed.
    ///
    /// The core never retries; this only tells callers which errors are
    /// transient. Timeouts are the single transient class.
    pub fn is_retriable(&self) -> bool {
        self.is_timeout()
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        crate::extract::classify_sqlite_error(err)
    }
}
