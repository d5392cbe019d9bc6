//! In-memory filesystem for exercising discovery without touching disk.

use crate::source::{EntryKind, FsEntry, MigrationFs};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

/// A fake [`MigrationFs`] holding files and directories in memory.
///
/// Adding a file implicitly creates its parent directories. Paths listed with
/// [`deny`](Self::deny) fail with `PermissionDenied` on read or list.
#[derive(Debug, Default, Clone)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
    other: BTreeSet<PathBuf>,
    denied: BTreeSet<PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, creating any missing parent directories.
    pub fn file(mut self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) -> Self {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.as_ref().to_vec());
        self
    }

    /// Add an empty directory.
    pub fn dir(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.dirs.insert(path);
        self
    }

    /// Add an entry that is neither a file nor a directory (e.g. a symlink).
    pub fn other(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.other.insert(path);
        self
    }

    /// Make reads and listings of `path` fail.
    pub fn deny(mut self, path: impl AsRef<Path>) -> Self {
        self.denied.insert(path.as_ref().to_path_buf());
        self
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            parent = dir.parent();
        }
    }

    fn check_denied(&self, path: &Path) -> io::Result<()> {
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }
        Ok(())
    }
}

impl MigrationFs for MemoryFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<FsEntry>> {
        self.check_denied(dir)?;
        if !self.dirs.contains(dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ));
        }

        let child_name = |path: &PathBuf| -> Option<String> {
            (path.parent() == Some(dir))
                .then(|| path.file_name())
                .flatten()
                .map(|n| n.to_string_lossy().into_owned())
        };

        let mut entries: Vec<FsEntry> = self
            .dirs
            .iter()
            .filter_map(|p| child_name(p).map(|name| (name, EntryKind::Dir)))
            .chain(
                self.files
                    .keys()
                    .filter_map(|p| child_name(p).map(|name| (name, EntryKind::File))),
            )
            .chain(
                self.other
                    .iter()
                    .filter_map(|p| child_name(p).map(|name| (name, EntryKind::Other))),
            )
            .map(|(name, kind)| FsEntry { name, kind })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.check_denied(path)?;
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}
