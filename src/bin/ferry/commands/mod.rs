//! Command implementations

use std::path::PathBuf;

use anyhow::Result;

use ferry::core::requirement::Profile;
use ferry::core::Workspace;
use ferry::util::GlobalContext;

pub mod check;
pub mod completions;
pub mod flags;
pub mod plan;
pub mod tree;

/// Load the workspace from `--manifest-path` or the nearest Ferry.toml.
pub fn load_workspace(
    ctx: &GlobalContext,
    manifest_path: Option<PathBuf>,
    release: bool,
) -> Result<Workspace> {
    let manifest_path = match manifest_path {
        Some(path) => path,
        None => ctx.find_manifest()?,
    };
    let profile = release.then_some(Profile::Release);
    Workspace::with_profile(&manifest_path, ctx, profile)
}
