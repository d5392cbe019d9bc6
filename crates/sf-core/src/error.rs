//! Error types for sf-core

use crate::parser::ParseError;
use thiserror::Error;

/// Core error type for Schemaflow
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config {path}: {message}")]
    ConfigParseError { path: String, message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: A migration directory could not be opened or listed
    #[error("[E004] Cannot read migration directory '{path}': {source}")]
    MigrationDirUnreadable {
        path: String,
        source: std::io::Error,
    },

    /// E005: A migration file could not be opened or read
    #[error("[E005] Error while opening {path}: {source}")]
    MigrationReadError {
        path: String,
        source: std::io::Error,
    },

    /// E006: A migration file is malformed
    #[error("[E006] Error while parsing {path}: {source}")]
    MigrationParseError {
        path: String,
        #[source]
        source: ParseError,
    },

    /// E007: Two migration files share an id
    #[error("[E007] Duplicate migration id '{id}' in {path1} and {path2}")]
    DuplicateMigrationId {
        id: String,
        path1: String,
        path2: String,
    },

    /// E008: IO error with file path context
    #[error("[E008] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
