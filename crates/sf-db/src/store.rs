//! Applied-state store.
//!
//! Records which migrations have been applied as rows of a bookkeeping table
//! inside the target database. A record is written only after the
//! migration's statements have committed, so a row exists if and only if the
//! migration fully applied.

use crate::error::{DbError, DbResult};
use crate::session::{with_transaction, Session};
use chrono::NaiveDateTime;
use serde::Serialize;
use sf_core::config::is_valid_table_name;
use sf_core::MigrationId;

/// Format of `applied_at` as written to and read from the store.
pub const APPLIED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A migration recorded as applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedRecord {
    pub id: MigrationId,
    /// UTC, second precision
    pub applied_at: NaiveDateTime,
}

/// Persisted record of applied migrations.
pub trait AppliedStore {
    /// Create the backing table if absent. Idempotent.
    fn bootstrap(&self) -> DbResult<()>;

    /// Whether [`bootstrap`](Self::bootstrap) has already created the table.
    fn is_bootstrapped(&self) -> DbResult<bool>;

    /// All applied records, in migration order.
    fn applied_records(&self) -> DbResult<Vec<AppliedRecord>>;

    /// Whether `id` has been applied.
    fn is_applied(&self, id: &MigrationId) -> DbResult<bool>;

    /// Record `id` as applied. Call only after its statements committed.
    fn mark_applied(&self, id: &MigrationId, applied_at: NaiveDateTime) -> DbResult<()>;
}

/// [`AppliedStore`] backed by a table reachable through a [`Session`].
pub struct SqlAppliedStore<'a, S: Session + ?Sized> {
    session: &'a S,
    schema: Option<String>,
    table: String,
}

impl<'a, S: Session + ?Sized> SqlAppliedStore<'a, S> {
    /// Create a store over `table`, which may be schema-qualified.
    pub fn new(session: &'a S, table: &str) -> DbResult<Self> {
        if !is_valid_table_name(table) {
            return Err(DbError::InvalidTableName(table.to_string()));
        }
        let (schema, name) = match table.split_once('.') {
            Some((schema, name)) => (Some(schema.to_string()), name.to_string()),
            None => (None, table.to_string()),
        };
        Ok(Self {
            session,
            schema,
            table: name,
        })
    }

    /// Fully qualified table name as used in SQL.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.table),
            None => self.table.clone(),
        }
    }
}

fn parse_applied_at(raw: &str) -> DbResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, APPLIED_AT_FORMAT)
        .map_err(|e| DbError::UnexpectedValue(format!("applied_at '{raw}': {e}")))
}

/// Read a single `COUNT(*)` value from a query result.
fn first_count(rows: &[Vec<Option<String>>]) -> DbResult<i64> {
    let raw = rows
        .first()
        .and_then(|row| row.first())
        .cloned()
        .flatten()
        .unwrap_or_default();
    raw.parse::<i64>()
        .map_err(|e| DbError::UnexpectedValue(format!("count '{raw}': {e}")))
}

impl<S: Session + ?Sized> AppliedStore for SqlAppliedStore<'_, S> {
    fn bootstrap(&self) -> DbResult<()> {
        let create_table = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 id         VARCHAR PRIMARY KEY,
                 applied_at TIMESTAMP NOT NULL
             )",
            self.qualified_name()
        );
        with_transaction(self.session, |session| {
            if let Some(schema) = &self.schema {
                session.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))?;
            }
            session.execute_batch(&create_table)
        })
    }

    fn is_bootstrapped(&self) -> DbResult<bool> {
        let schema = self.schema.as_deref().unwrap_or("main");
        let rows = self.session.query_rows(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = ? AND table_name = ?",
            &[schema, self.table.as_str()],
        )?;
        Ok(first_count(&rows)? > 0)
    }

    fn applied_records(&self) -> DbResult<Vec<AppliedRecord>> {
        let sql = format!(
            "SELECT id, strftime(applied_at, '{APPLIED_AT_FORMAT}') FROM {}",
            self.qualified_name()
        );
        let mut records = self
            .session
            .query_rows(&sql, &[])?
            .into_iter()
            .map(|row| -> DbResult<AppliedRecord> {
                let mut values = row.into_iter();
                let id = values
                    .next()
                    .flatten()
                    .and_then(MigrationId::try_new)
                    .ok_or_else(|| DbError::UnexpectedValue("empty migration id".to_string()))?;
                let applied_at = values.next().flatten().ok_or_else(|| {
                    DbError::UnexpectedValue(format!("missing applied_at for {id}"))
                })?;
                Ok(AppliedRecord {
                    applied_at: parse_applied_at(&applied_at)?,
                    id,
                })
            })
            .collect::<DbResult<Vec<_>>>()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    fn is_applied(&self, id: &MigrationId) -> DbResult<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE id = ?",
            self.qualified_name()
        );
        let rows = self.session.query_rows(&sql, &[id.as_str()])?;
        Ok(first_count(&rows)? > 0)
    }

    fn mark_applied(&self, id: &MigrationId, applied_at: NaiveDateTime) -> DbResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, applied_at) VALUES (?, CAST(? AS TIMESTAMP))",
            self.qualified_name()
        );
        let applied_at = applied_at.format(APPLIED_AT_FORMAT).to_string();
        self.session.execute(&sql, &[id.as_str(), applied_at.as_str()])?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
