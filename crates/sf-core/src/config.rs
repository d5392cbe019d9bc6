//! Configuration types and parsing for schemaflow.yml

use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::default_true;
use crate::source::DEFAULT_SUFFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main project configuration from schemaflow.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Migration discovery and execution settings
    #[serde(default)]
    pub migrations: MigrationsConfig,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// DuckDB file path, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// How to treat a pending migration that sorts before an applied one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutOfOrderPolicy {
    /// Apply it in ascending order, with a warning (default)
    #[default]
    Allow,
    /// Refuse to run
    Reject,
}

impl std::fmt::Display for OutOfOrderPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutOfOrderPolicy::Allow => write!(f, "allow"),
            OutOfOrderPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Migration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationsConfig {
    /// Root directory of migration scripts, searched recursively
    #[serde(default = "default_migrations_dir")]
    pub dir: String,

    /// Whether migrations run at all when the database is provisioned
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Table recording applied migrations (optionally `schema.table`)
    #[serde(default = "default_table")]
    pub table: String,

    /// File name suffix of migration scripts
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Policy for pending migrations older than the newest applied one
    #[serde(default)]
    pub out_of_order: OutOfOrderPolicy,

    /// Tolerate applied ids that no longer have a migration file
    #[serde(default)]
    pub ignore_unknown: bool,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
            enabled: true,
            table: default_table(),
            suffix: default_suffix(),
            out_of_order: OutOfOrderPolicy::default(),
            ignore_unknown: false,
        }
    }
}

const DEFAULT_DB_PATH: &str = "data/schemaflow.duckdb";

/// In-memory DuckDB path marker.
pub const MEMORY_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_table() -> String {
    "schema_migrations".to_string()
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

/// Check that `name` is a plain identifier or `schema.identifier`.
pub fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return false;
    }
    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

impl Config {
    /// Configuration with defaults for everything but the name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database: DatabaseConfig::default(),
            migrations: MigrationsConfig::default(),
        }
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for schemaflow.yml or schemaflow.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("schemaflow.yml");
        let yaml_path = dir.join("schemaflow.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.database.path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }
        if self.migrations.suffix.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations.suffix cannot be empty".to_string(),
            });
        }
        if !is_valid_table_name(&self.migrations.table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "migrations.table '{}' must be an identifier or schema.identifier",
                    self.migrations.table
                ),
            });
        }
        Ok(())
    }

    /// Migration root resolved against the project directory
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations.dir)
    }

    /// Database path resolved against the project directory (`:memory:` is kept as-is)
    pub fn database_path_absolute(&self, root: &Path) -> String {
        if self.database.path == MEMORY_DB_PATH {
            MEMORY_DB_PATH.to_string()
        } else {
            root.join(&self.database.path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
