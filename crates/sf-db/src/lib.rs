//! sf-db - Database layer for Schemaflow
//!
//! This crate provides the `Session` trait and its DuckDB implementation,
//! the applied-state store that records which migrations have run, the
//! migration executor, and the `provision` entry point used at startup.

pub mod duckdb;
pub mod error;
pub mod executor;
pub mod provision;
pub(crate) mod row_helpers;
pub mod session;
pub mod store;

pub use crate::duckdb::DuckDbSession;
pub use error::{ApplyStep, DbError, DbResult, MigrateError, MigrateResult};
pub use executor::{
    MigrateOptions, MigrationPlan, MigrationReport, MigrationStatus, Migrator, StatusEntry,
};
pub use provision::{migrate, migrate_with_options, provision};
pub use session::{with_transaction, Session};
pub use store::{AppliedRecord, AppliedStore, SqlAppliedStore};
