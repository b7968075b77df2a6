//! Compiler and linker flags for one target.

use crate::core::artifacts::ArtifactSet;
use crate::core::errors::BridgeError;
use crate::core::workspace::Workspace;
use crate::ops::plan::{plan, PlanOptions};

/// Which flags to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagKind {
    /// Include paths only
    Compile,
    /// Libraries and link flags only
    Link,
    /// Both, compile flags first
    #[default]
    All,
}

/// Finalize `target` alone and render its flags.
pub fn target_flags(ws: &Workspace, target: &str, kind: FlagKind) -> Result<Vec<String>, BridgeError> {
    let opts = PlanOptions {
        targets: vec![target.to_string()],
        jobs: None,
    };
    let graph = plan(ws, &opts)?;
    let node = graph.node(target).ok_or_else(|| BridgeError::UnknownTarget {
        name: target.to_string(),
    })?;
    Ok(render_flags(&node.artifacts, kind))
}

/// Render an artifact set as command-line flags.
pub fn render_flags(artifacts: &ArtifactSet, kind: FlagKind) -> Vec<String> {
    match kind {
        FlagKind::Compile => artifacts.compile_flags(),
        FlagKind::Link => artifacts.link_args(),
        FlagKind::All => {
            let mut flags = artifacts.compile_flags();
            flags.extend(artifacts.link_args());
            flags
        }
    }
}
