//! Migration record produced by the parser and consumed by the executor.

use crate::migration_id::MigrationId;
use std::path::PathBuf;

/// A parsed migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Identifier derived from the file name
    pub id: MigrationId,

    /// Statements of the `Up` section, in execution order
    pub up_statements: Vec<String>,

    /// Statements of the `Down` section. Parsed for listing only; never executed.
    pub down_statements: Vec<String>,

    /// Whether the `Up` section runs inside a transaction.
    ///
    /// `false` when the section is annotated `-- +migrate Up notransaction`.
    pub transactional: bool,

    /// File the migration was read from, when discovered on disk
    pub path: Option<PathBuf>,
}

impl Migration {
    /// Create a transactional migration with the given up statements.
    pub fn new(id: MigrationId, up_statements: Vec<String>) -> Self {
        Self {
            id,
            up_statements,
            down_statements: Vec::new(),
            transactional: true,
            path: None,
        }
    }

    /// Display location for diagnostics: the file path if known, else the id.
    pub fn location(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => self.id.to_string(),
        }
    }
}
