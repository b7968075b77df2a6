//! The finalized build graph.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::artifacts::ArtifactSet;
use crate::core::target::TargetKind;

/// A target with its merged compile/link artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildNode {
    pub name: String,
    pub kind: TargetKind,
    pub sources: Vec<PathBuf>,
    /// Attached requirement names, in attachment order
    pub requirements: Vec<String>,
    pub artifacts: ArtifactSet,
}

/// One node per finalized target, in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildGraph {
    pub nodes: Vec<BuildNode>,
}

impl BuildGraph {
    /// Get the node for a target.
    pub fn node(&self, name: &str) -> Option<&BuildNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
