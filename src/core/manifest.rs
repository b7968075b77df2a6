//! Ferry.toml parsing.
//!
//! `Ferry.toml` is the declarative configuration surface: a table of
//! requirements, each pointing at a foreign manifest, and a table of targets
//! that attach them.
//!
//! ```toml
//! [project]
//! name = "rsa"
//!
//! [requires.rsa]
//! manifest = "rsa/Cargo.toml"
//! options = { profile = "release", features = ["cli"] }
//!
//! [targets.rsa]
//! kind = "binary"
//! sources = ["src/main.c"]
//! requires = ["rsa"]
//! ```
//!
//! Declaration order in the file is kept. Paths are relative to the
//! directory holding `Ferry.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::build_config::BuildConfig;
use crate::core::errors::BridgeError;
use crate::core::requirement::{Profile, RequirementOptions};
use crate::util::diagnostic::ManifestSyntaxError;
use crate::util::fs::{glob_files, is_glob_pattern, resolve_relative};

/// Canonical manifest filename.
pub const MANIFEST_NAME: &str = "Ferry.toml";

/// Error loading a `Ferry.toml`.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to read manifest: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Syntax(Box<ManifestSyntaxError>),

    #[error("invalid manifest {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectSection {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    project: Option<ProjectSection>,

    // Kept as tables so iteration follows document order
    #[serde(default)]
    requires: toml::Table,

    #[serde(default)]
    targets: toml::Table,
}

/// A `[requires.<name>]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRequirement {
    manifest: PathBuf,
    #[serde(default)]
    options: BTreeMap<String, toml::Value>,
}

/// A `[targets.<name>]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTarget {
    #[serde(default = "default_kind")]
    kind: String,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    requires: Vec<String>,
}

fn default_kind() -> String {
    "binary".to_string()
}

/// A parsed `Ferry.toml`.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    root: PathBuf,
    project: Option<ProjectSection>,
    requires: Vec<(String, RawRequirement)>,
    targets: Vec<(String, RawTarget)>,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse manifest content. `path` locates the project root.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(contents).map_err(|e| {
            ManifestError::Syntax(Box::new(ManifestSyntaxError::from_toml(
                path.display().to_string(),
                contents,
                &e,
            )))
        })?;

        let invalid = |message: String| ManifestError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        let mut requires = Vec::with_capacity(raw.requires.len());
        for (name, value) in raw.requires {
            let entry: RawRequirement = value
                .try_into()
                .map_err(|e| invalid(format!("[requires.{}]: {}", name, e.message())))?;
            requires.push((name, entry));
        }

        let mut targets = Vec::with_capacity(raw.targets.len());
        for (name, value) in raw.targets {
            let entry: RawTarget = value
                .try_into()
                .map_err(|e| invalid(format!("[targets.{}]: {}", name, e.message())))?;
            targets.push((name, entry));
        }

        let root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Ok(Manifest {
            path: path.to_path_buf(),
            root,
            project: raw.project,
            requires,
            targets,
        })
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the manifest.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project name: `[project] name`, else the root directory's name.
    pub fn name(&self) -> String {
        if let Some(project) = &self.project {
            return project.name.clone();
        }
        self.root
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "ferry".to_string())
    }

    /// Declare every requirement and define every target.
    ///
    /// Declaration errors surface here, before anything is resolved. With
    /// `profile` set, every requirement's profile is overridden.
    pub fn to_build_config(&self, profile: Option<Profile>) -> Result<BuildConfig, BridgeError> {
        let mut config = BuildConfig::new();

        for (name, raw) in &self.requires {
            let mut options = RequirementOptions::from_table(name, raw.options.clone())?;
            if let Some(profile) = profile {
                options.profile = profile;
            }
            config.declare(
                name.clone(),
                resolve_relative(&self.root, &raw.manifest),
                options,
            )?;
        }

        for (name, raw) in &self.targets {
            let sources = self.expand_sources(name, &raw.sources)?;
            config.define_target_str(name.clone(), &raw.kind, sources)?;
            for requirement in &raw.requires {
                config.attach(name, requirement.clone())?;
            }
        }

        Ok(config)
    }

    /// Expand source entries relative to the root, keeping entry order.
    fn expand_sources(&self, target: &str, entries: &[String]) -> Result<Vec<PathBuf>, BridgeError> {
        let mut sources: Vec<PathBuf> = Vec::new();

        for entry in entries {
            let matched = if is_glob_pattern(entry) {
                let files = glob_files(&self.root, entry).map_err(|_| BridgeError::SourceNotFound {
                    target: target.to_string(),
                    path: PathBuf::from(entry),
                })?;
                if files.is_empty() {
                    tracing::warn!("target `{}`: `{}` matched no files", target, entry);
                }
                files
            } else {
                let path = resolve_relative(&self.root, Path::new(entry));
                if !path.exists() {
                    return Err(BridgeError::SourceNotFound {
                        target: target.to_string(),
                        path,
                    });
                }
                vec![path]
            };

            for path in matched {
                if !sources.contains(&path) {
                    sources.push(path);
                }
            }
        }

        Ok(sources)
    }
}
