//! Recursive migration discovery.
//!
//! [`MigrationSource`] walks a root directory through a [`MigrationFs`],
//! parses every file whose name ends with the migration suffix, and returns
//! the migrations in application order. Discovery is fail-fast: the first
//! unreadable directory, unreadable file, malformed script, or duplicate id
//! aborts the whole walk, so a partial migration list never escapes.

use crate::error::{CoreError, CoreResult};
use crate::migration::Migration;
use crate::migration_id::MigrationId;
use crate::ordering::sort_migrations;
use crate::parser::parse_migration;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Default suffix of migration files.
pub const DEFAULT_SUFFIX: &str = ".sql";

/// Kind of a directory entry, as seen without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Filesystem access needed by discovery.
pub trait MigrationFs {
    /// List the entries of `dir`.
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FsEntry>>;

    /// Read the full contents of the file at `path`.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// [`MigrationFs`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

impl MigrationFs for OsFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FsEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().into_string().map_err(|raw| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("entry name {raw:?} is not valid UTF-8"),
                )
            })?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            entries.push(FsEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Discovers migrations under a root directory.
#[derive(Debug, Clone)]
pub struct MigrationSource<F: MigrationFs = OsFs> {
    fs: F,
    root: PathBuf,
    suffix: String,
}

impl MigrationSource<OsFs> {
    /// Discover migrations on the real filesystem under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(OsFs, root)
    }
}

impl<F: MigrationFs> MigrationSource<F> {
    /// Discover migrations under `root` through a custom filesystem.
    pub fn with_fs(fs: F, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    /// Override the recognized file suffix.
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Root directory being searched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find, parse, and order every migration under the root.
    pub fn find_migrations(&self) -> CoreResult<Vec<Migration>> {
        let mut migrations = Vec::new();
        self.find_recursive(&self.root, &mut migrations)?;

        // Validate no duplicate ids
        let mut seen: HashMap<&str, &Path> = HashMap::new();
        for migration in &migrations {
            let path = migration.path.as_deref().unwrap_or(&self.root);
            if let Some(existing) = seen.insert(migration.id.as_str(), path) {
                return Err(CoreError::DuplicateMigrationId {
                    id: migration.id.to_string(),
                    path1: existing.display().to_string(),
                    path2: path.display().to_string(),
                });
            }
        }

        sort_migrations(&mut migrations);
        log::debug!(
            "Discovered {} migration(s) under {}",
            migrations.len(),
            self.root.display()
        );
        Ok(migrations)
    }

    fn find_recursive(&self, dir: &Path, migrations: &mut Vec<Migration>) -> CoreResult<()> {
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|e| CoreError::MigrationDirUnreadable {
                path: dir.display().to_string(),
                source: e,
            })?;

        for entry in entries {
            let path = dir.join(&entry.name);
            match entry.kind {
                EntryKind::Dir => self.find_recursive(&path, migrations)?,
                EntryKind::File if entry.name.ends_with(&self.suffix) => {
                    migrations.push(self.load(&entry.name, path)?);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn load(&self, name: &str, path: PathBuf) -> CoreResult<Migration> {
        let content = self
            .fs
            .read(&path)
            .map_err(|e| CoreError::MigrationReadError {
                path: path.display().to_string(),
                source: e,
            })?;
        // File names are never empty, so the id is too.
        let id = MigrationId::new(name);
        let mut migration =
            parse_migration(id, &content).map_err(|e| CoreError::MigrationParseError {
                path: path.display().to_string(),
                source: e,
            })?;
        log::debug!(
            "Parsed {} ({} up statement(s))",
            path.display(),
            migration.up_statements.len()
        );
        migration.path = Some(path);
        Ok(migration)
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
