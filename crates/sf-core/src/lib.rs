//! sf-core - Core library for Schemaflow
//!
//! This crate provides the migration model, the script parser, recursive
//! migration discovery, the ordering policy, and project configuration
//! shared by the database and CLI crates.

pub mod config;
pub mod error;
pub mod migration;
pub mod migration_id;
pub mod ordering;
pub mod parser;
pub(crate) mod serde_helpers;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use config::{Config, OutOfOrderPolicy};
pub use error::{CoreError, CoreResult};
pub use migration::Migration;
pub use migration_id::MigrationId;
pub use ordering::{compare_ids, sort_migrations};
pub use parser::{parse_migration, ParseError};
pub use source::{EntryKind, FsEntry, MigrationFs, MigrationSource, OsFs};
