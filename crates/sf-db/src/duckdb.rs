//! DuckDB session implementation

use crate::error::{DbError, DbResult};
use crate::row_helpers::get_column_as_string;
use crate::session::Session;
use duckdb::Connection;
use sf_core::config::MEMORY_DB_PATH;
use std::path::Path;

/// DuckDB session.
///
/// Single-threaded; no `Mutex` needed because a migration run is sequential.
#[derive(Debug)]
pub struct DuckDbSession {
    conn: Connection,
}

impl DuckDbSession {
    /// Create a new in-memory DuckDB session
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open (or create) a DuckDB file, creating missing parent directories
    pub fn from_path(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DbError::ConnectionError(format!("{e}: cannot create {}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self { conn })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == MEMORY_DB_PATH {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }
}

impl Session for DuckDbSession {
    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn execute(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.conn
            .execute(sql, duckdb::params_from_iter(params.iter()))
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    fn query_rows(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Vec<Option<String>>>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbError::ExecutionError(format!("prepare failed: {e}: {sql}")))?;

        // DuckDB panics on `column_count()` before execution, so read it
        // from each row instead.
        let rows = stmt
            .query_map(duckdb::params_from_iter(params.iter()), |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count)
                    .map(|i| get_column_as_string(row, i))
                    .collect::<Vec<_>>())
            })
            .map_err(|e| DbError::ExecutionError(format!("query failed: {e}: {sql}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::ExecutionError(format!("row error: {e}")))?;
        Ok(rows)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
