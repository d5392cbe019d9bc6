//! Runtime context for CLI commands

use anyhow::{Context, Result};
use sf_core::{Config, Migration, MigrationSource};
use sf_db::DuckDbSession;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Loaded project configuration with command-line overrides applied
pub(crate) struct ProjectContext {
    /// Project directory that relative config paths resolve against
    pub root: PathBuf,

    /// The loaded configuration
    pub config: Config,
}

impl ProjectContext {
    /// Load the project configuration selected by the global arguments
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&args.project_dir);

        let mut config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(&root).context("Failed to load project configuration")?
        };

        if let Some(database) = &args.database {
            config.database.path = database.clone();
        }

        log::debug!(
            "Loaded project '{}' from {}",
            config.name,
            root.display()
        );
        Ok(Self { root, config })
    }

    /// Database path with the project directory applied
    pub fn database_path(&self) -> String {
        self.config.database_path_absolute(&self.root)
    }

    /// Open the project database
    pub fn open_session(&self) -> Result<DuckDbSession> {
        let path = self.database_path();
        DuckDbSession::new(&path).with_context(|| format!("Failed to open database: {path}"))
    }

    /// Discover the project's migrations in application order
    pub fn discover(&self) -> Result<Vec<Migration>> {
        let dir = self.config.migrations_dir_absolute(&self.root);
        MigrationSource::new(&dir)
            .suffix(self.config.migrations.suffix.as_str())
            .find_migrations()
            .with_context(|| format!("Failed to discover migrations in {}", dir.display()))
    }
}
