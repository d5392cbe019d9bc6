//! Database session abstraction used by the store and the executor.

use crate::error::{DbError, DbResult};

/// A live, exclusively owned database session.
///
/// Migration runs are single-threaded, so implementations need not be `Sync`.
pub trait Session {
    /// Execute one or more SQL statements with no parameters.
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single statement with string parameters, returning affected rows.
    fn execute(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Run a query and return every row with values coerced to strings.
    ///
    /// SQL `NULL` is returned as `None`.
    fn query_rows(&self, sql: &str, params: &[&str]) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Start a transaction.
    fn begin(&self) -> DbResult<()> {
        self.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))
    }

    /// Commit the current transaction.
    fn commit(&self) -> DbResult<()> {
        self.execute_batch("COMMIT")
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {e}")))
    }

    /// Roll back the current transaction.
    fn rollback(&self) -> DbResult<()> {
        self.execute_batch("ROLLBACK")
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {e}")))
    }
}

/// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
/// error.
pub fn with_transaction<S, F, T>(session: &S, body: F) -> DbResult<T>
where
    S: Session + ?Sized,
    F: FnOnce(&S) -> DbResult<T>,
{
    session.begin()?;

    let result = body(session);

    match &result {
        Ok(_) => {
            if let Err(commit_err) = session.commit() {
                let _ = session.rollback();
                return Err(commit_err);
            }
        }
        Err(_) => {
            let _ = session.rollback();
        }
    }
    result
}
