//! Build planning: finalize a workspace into its build graph.

use crate::core::errors::BridgeError;
use crate::core::graph::BuildGraph;
use crate::core::workspace::Workspace;
use crate::ops::finalize::{finalize, FinalizeOptions};

/// Options for the plan command.
#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    /// Targets to plan (empty = all)
    pub targets: Vec<String>,

    /// Resolution threads, overriding `[resolve] jobs`
    pub jobs: Option<usize>,
}

/// Resolve every requirement the selected targets need and merge the
/// results into a build graph.
pub fn plan(ws: &Workspace, opts: &PlanOptions) -> Result<BuildGraph, BridgeError> {
    let finalize_opts = FinalizeOptions {
        targets: opts.targets.clone(),
        jobs: opts.jobs.or(ws.config().resolve.jobs),
    };

    let graph = finalize(ws.build_config(), &ws.resolvers(), &finalize_opts)?;
    tracing::debug!("planned {} target(s) for `{}`", graph.len(), ws.name());
    Ok(graph)
}
