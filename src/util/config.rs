//! Configuration file support for Ferry.
//!
//! Ferry reads two configuration files:
//! - Global: `~/.ferry/config.toml` - user-wide defaults
//! - Project: `.ferry/config.toml` - project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Ferry configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolution settings
    pub resolve: ResolveConfig,

    /// Cargo resolver settings
    pub cargo: CargoConfig,

    /// vcpkg resolver settings
    pub vcpkg: VcpkgConfig,
}

/// Resolution-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Number of requirements resolved in parallel (None = one per core)
    pub jobs: Option<usize>,
}

/// Cargo resolver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CargoConfig {
    /// Path to the cargo executable (defaults to `cargo` on PATH)
    pub program: Option<PathBuf>,

    /// Shared target directory for every Cargo requirement
    pub target_dir: Option<PathBuf>,

    /// Pass `--offline` to cargo
    pub offline: bool,
}

/// vcpkg resolver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VcpkgConfig {
    /// Force vcpkg discovery on/off (None = auto-detect)
    pub enabled: Option<bool>,

    /// vcpkg root directory
    pub root: Option<PathBuf>,

    /// Default triplet
    pub triplet: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.resolve.jobs.is_some() {
            self.resolve.jobs = other.resolve.jobs;
        }

        if other.cargo.program.is_some() {
            self.cargo.program = other.cargo.program;
        }
        if other.cargo.target_dir.is_some() {
            self.cargo.target_dir = other.cargo.target_dir;
        }
        if other.cargo.offline {
            self.cargo.offline = true;
        }

        if other.vcpkg.enabled.is_some() {
            self.vcpkg.enabled = other.vcpkg.enabled;
        }
        if other.vcpkg.root.is_some() {
            self.vcpkg.root = other.vcpkg.root;
        }
        if other.vcpkg.triplet.is_some() {
            self.vcpkg.triplet = other.vcpkg.triplet;
        }
    }

    /// The cargo program to run.
    pub fn cargo_program(&self) -> PathBuf {
        self.cargo
            .program
            .clone()
            .or_else(|| std::env::var_os("CARGO").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("cargo"))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.ferry/config.toml)
/// 2. Global config (~/.ferry/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}
