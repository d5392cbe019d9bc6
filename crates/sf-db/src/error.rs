//! Error types for sf-db

use sf_core::CoreError;
use std::fmt;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Transaction management error (D003)
    #[error("[D003] Transaction failed: {0}")]
    TransactionError(String),

    /// Invalid bookkeeping table name (D004)
    #[error("[D004] Invalid table name '{0}': expected an identifier or schema.identifier")]
    InvalidTableName(String),

    /// Unexpected value read back from the database (D005)
    #[error("[D005] Unexpected database value: {0}")]
    UnexpectedValue(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}

/// Stage of applying a migration at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStep {
    Begin,
    /// 1-based statement index
    Statement(usize),
    Commit,
}

impl fmt::Display for ApplyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyStep::Begin => write!(f, "BEGIN"),
            ApplyStep::Statement(n) => write!(f, "statement {n}"),
            ApplyStep::Commit => write!(f, "COMMIT"),
        }
    }
}

/// Migration run errors. Every variant is fatal to the run.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Discovery, parse, or duplicate-id failure before anything ran (M001)
    #[error("[M001] Migration discovery failed: {0}")]
    Discovery(#[from] CoreError),

    /// The database could not be opened (M002)
    #[error("[M002] Cannot open database '{path}': {source}")]
    Connection { path: String, source: DbError },

    /// The applied-state store could not be bootstrapped or queried (M003)
    #[error("[M003] Applied-state store failed: {0}")]
    Store(#[source] DbError),

    /// A migration failed and was rolled back; later migrations were not attempted (M004)
    #[error("[M004] Migration {id} failed at {step}: {source}")]
    Apply {
        id: String,
        step: ApplyStep,
        source: DbError,
    },

    /// A migration committed but could not be recorded (M005)
    #[error(
        "[M005] Migration {id} was committed but could not be recorded as applied: {source}. \
         The schema is ahead of the applied-state store; insert the record manually before rerunning"
    )]
    Bookkeeping { id: String, source: DbError },

    /// The store lists an id with no matching migration file (M006)
    #[error("[M006] Unknown migration in database: {id}")]
    UnknownMigration { id: String },

    /// A pending migration sorts before an applied one under the reject policy (M007)
    #[error("[M007] Migration {id} is pending but sorts before already-applied migration {latest}")]
    OutOfOrder { id: String, latest: String },
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
