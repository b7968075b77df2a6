//! Compile/link artifacts produced by resolution.
//!
//! A ResolvedPackage is what a foreign resolver hands back for one
//! requirement. An ArtifactSet is the merged view a target sees once all of
//! its requirements are folded in: ordered, with exact duplicates dropped
//! and first occurrence kept.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::requirement::Linkage;

/// A library file to link against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkArtifact {
    /// Path to the library file
    pub path: PathBuf,
    /// Static archive or shared object/import library
    pub linkage: Linkage,
}

impl LinkArtifact {
    /// A static archive.
    pub fn static_lib(path: impl Into<PathBuf>) -> Self {
        LinkArtifact {
            path: path.into(),
            linkage: Linkage::Static,
        }
    }

    /// A shared library (or its import library on Windows).
    pub fn dynamic_lib(path: impl Into<PathBuf>) -> Self {
        LinkArtifact {
            path: path.into(),
            linkage: Linkage::Dynamic,
        }
    }

    /// Convert to linker argument.
    pub fn to_flag(&self) -> String {
        self.path.display().to_string()
    }
}

impl fmt::Display for LinkArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// The outcome of resolving one requirement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolvedPackage {
    /// Include directories, in order
    pub include_dirs: Vec<PathBuf>,

    /// Libraries to link, in order
    pub link_artifacts: Vec<LinkArtifact>,

    /// Additional linker flags, in order
    pub link_flags: Vec<String>,

    /// Fingerprint of the manifest contents and options it was resolved from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl ResolvedPackage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn with_artifact(mut self, artifact: LinkArtifact) -> Self {
        self.link_artifacts.push(artifact);
        self
    }

    pub fn with_link_flag(mut self, flag: impl Into<String>) -> Self {
        self.link_flags.push(flag.into());
        self
    }
}

// Two resolutions are the same when their artifacts are; the fingerprint
// only records where they came from.
impl PartialEq for ResolvedPackage {
    fn eq(&self, other: &Self) -> bool {
        self.include_dirs == other.include_dirs
            && self.link_artifacts == other.link_artifacts
            && self.link_flags == other.link_flags
    }
}

impl Eq for ResolvedPackage {}

/// The merged compile/link artifacts of a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub include_dirs: Vec<PathBuf>,
    pub link_artifacts: Vec<LinkArtifact>,
    pub link_flags: Vec<String>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a resolved package in after everything merged so far.
    pub fn merge(&mut self, package: &ResolvedPackage) {
        push_unique(&mut self.include_dirs, &package.include_dirs);
        push_unique(&mut self.link_artifacts, &package.link_artifacts);
        push_unique(&mut self.link_flags, &package.link_flags);
    }

    pub fn is_empty(&self) -> bool {
        self.include_dirs.is_empty() && self.link_artifacts.is_empty() && self.link_flags.is_empty()
    }

    /// Compiler flags (`-I...`).
    pub fn compile_flags(&self) -> Vec<String> {
        self.include_dirs
            .iter()
            .map(|dir| format!("-I{}", dir.display()))
            .collect()
    }

    /// Linker arguments: libraries first, then extra flags.
    pub fn link_args(&self) -> Vec<String> {
        self.link_artifacts
            .iter()
            .map(LinkArtifact::to_flag)
            .chain(self.link_flags.iter().cloned())
            .collect()
    }
}

// Linear scan keeps first-seen order; artifact lists are short.
fn push_unique<T: PartialEq + Clone>(into: &mut Vec<T>, items: &[T]) {
    for item in items {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}
