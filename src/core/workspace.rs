//! Workspace - a loaded project.
//!
//! A Workspace ties a parsed `Ferry.toml` to the merged tool configuration
//! and the `BuildConfig` declared from it.

use std::path::Path;

use anyhow::Result;

use crate::core::build_config::BuildConfig;
use crate::core::manifest::Manifest;
use crate::core::requirement::Profile;
use crate::resolver::ResolverSet;
use crate::util::{Config, GlobalContext};

/// A project: its manifest, configuration and declarations.
#[derive(Debug)]
pub struct Workspace {
    manifest: Manifest,
    config: Config,
    build_config: BuildConfig,
}

impl Workspace {
    /// Load a workspace from a manifest path.
    pub fn new(manifest_path: &Path, ctx: &GlobalContext) -> Result<Self> {
        Self::with_profile(manifest_path, ctx, None)
    }

    /// Load a workspace, overriding every requirement's profile.
    pub fn with_profile(
        manifest_path: &Path,
        ctx: &GlobalContext,
        profile: Option<Profile>,
    ) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let config = ctx.load_config(manifest.root());
        let build_config = manifest.to_build_config(profile)?;

        tracing::debug!(
            "loaded {} ({} requirements, {} targets)",
            manifest.path().display(),
            build_config.requirements().len(),
            build_config.targets().len()
        );

        Ok(Workspace {
            manifest,
            config,
            build_config,
        })
    }

    /// Get the project name.
    pub fn name(&self) -> String {
        self.manifest.name()
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        self.manifest.root()
    }

    /// Get the manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Get the merged tool configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the declared requirements and targets.
    pub fn build_config(&self) -> &BuildConfig {
        &self.build_config
    }

    /// The foreign resolvers configured for this workspace.
    pub fn resolvers(&self) -> ResolverSet {
        ResolverSet::from_config(&self.config)
    }
}
