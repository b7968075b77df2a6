//! Global context for Ferry operations.
//!
//! Provides centralized access to configuration paths and the
//! project manifest location.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

use crate::core::manifest::{ManifestError, MANIFEST_NAME};
use crate::util::config::{load_config, Config};

/// Project directories for Ferry
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "ferry", "ferry"));

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Ferry data (~/.ferry/)
    home: PathBuf,

    /// Whether to use colors in output
    color: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let home = std::env::var_os("FERRY_HOME")
            .map(PathBuf::from)
            .or_else(|| BaseDirs::new().map(|b| b.home_dir().join(".ferry")))
            .or_else(|| {
                PROJECT_DIRS
                    .as_ref()
                    .map(|dirs| dirs.config_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from(".ferry"));

        GlobalContext {
            cwd,
            home,
            color: true,
        }
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Get the project-local configuration file path for a project root.
    pub fn project_config_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(".ferry").join("config.toml")
    }

    /// Load the merged global + project configuration.
    pub fn load_config(&self, project_root: &Path) -> Config {
        load_config(&self.config_path(), &self.project_config_path(project_root))
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find `Ferry.toml` starting from cwd and searching upward.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(ManifestError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }
}
