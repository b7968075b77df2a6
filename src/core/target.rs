//! Target definitions - what gets built.
//!
//! A BuildTarget is a named output (executable, static library or shared
//! library) together with its entry sources and the names of the
//! requirements attached to it.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::BridgeError;

/// The kind of target being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetKind {
    /// Executable binary
    Binary,

    /// Static library (.a / .lib)
    StaticLibrary,

    /// Shared/dynamic library (.so / .dylib / .dll)
    SharedLibrary,
}

impl TargetKind {
    /// Parse a kind as written in configuration.
    pub fn parse(target: &str, kind: &str) -> Result<Self, BridgeError> {
        kind.parse().map_err(|_| BridgeError::UnsupportedKind {
            target: target.to_string(),
            kind: kind.to_string(),
        })
    }
}

impl FromStr for TargetKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" | "bin" | "exe" => Ok(TargetKind::Binary),
            "staticLibrary" | "staticlib" | "static" => Ok(TargetKind::StaticLibrary),
            "sharedLibrary" | "sharedlib" | "shared" | "dylib" => Ok(TargetKind::SharedLibrary),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Binary => write!(f, "binary"),
            TargetKind::StaticLibrary => write!(f, "staticLibrary"),
            TargetKind::SharedLibrary => write!(f, "sharedLibrary"),
        }
    }
}

/// A build target with its attached requirement names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    name: String,
    kind: TargetKind,
    sources: Vec<PathBuf>,
    /// Attached requirement names, in attachment order, no duplicates
    requirements: Vec<String>,
}

impl BuildTarget {
    /// Create a target, rejecting empty names and empty source lists.
    pub fn new(
        name: impl Into<String>,
        kind: TargetKind,
        sources: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Result<Self, BridgeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BridgeError::EmptyName { what: "target" });
        }

        let sources: Vec<PathBuf> = sources.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(BridgeError::NoSources { target: name });
        }

        Ok(BuildTarget {
            name,
            kind,
            sources,
            requirements: Vec::new(),
        })
    }

    /// Get the target name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the target kind.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Get the entry sources, in declaration order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Get the attached requirement names, in attachment order.
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Attach a requirement name. Returns false if it was already attached.
    pub fn attach(&mut self, requirement: impl Into<String>) -> bool {
        let requirement = requirement.into();
        if self.requirements.contains(&requirement) {
            return false;
        }
        self.requirements.push(requirement);
        true
    }

    /// Detach a requirement name. Returns false if it was not attached.
    pub fn detach(&mut self, requirement: &str) -> bool {
        let before = self.requirements.len();
        self.requirements.retain(|r| r != requirement);
        self.requirements.len() != before
    }
}
