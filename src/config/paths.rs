//! Path resolution for vetbox configuration and data files.
//!
//! All vetbox data is stored in `~/.vetbox/` unless `VETBOX_HOME` or `--home`
//! points elsewhere:
//! - `config.yaml` - Main configuration file
//! - `vetbox.db` - SQLite database holding the outbox queue

use std::path::PathBuf;

use crate::error::VetboxError;

/// Paths to vetbox configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.vetbox/`
    pub root: PathBuf,
    /// Config file: `~/.vetbox/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.vetbox/vetbox.db`
    pub database: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, VetboxError> {
        let home = std::env::var("HOME")
            .map_err(|_| VetboxError::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_root(PathBuf::from(home).join(".vetbox")))
    }

    /// Resolve paths from an optional explicit root, falling back to the home
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is given and the home directory cannot be
    /// determined.
    pub fn resolve(root: Option<PathBuf>) -> Result<Self, VetboxError> {
        root.map_or_else(Self::new, |root| Ok(Self::with_root(root)))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("vetbox.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), VetboxError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                VetboxError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }
        Ok(())
    }
}
