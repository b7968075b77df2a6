//! Foreign package resolution.
//!
//! A foreign resolver turns a manifest written for another ecosystem into the
//! include paths, libraries and link flags a C/C++ target needs. Resolvers
//! are looked up by [`ManifestKind`]; the ecosystem's own dependency graph is
//! the resolver's business and comes back flattened.

pub mod cargo;
pub mod memo;
pub mod vcpkg;

pub use cargo::CargoResolver;
pub use memo::ResolutionCache;
pub use vcpkg::VcpkgResolver;

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::artifacts::ResolvedPackage;
use crate::core::errors::BridgeError;
use crate::core::requirement::{ManifestKind, PackageRequirement, RequirementOptions};
use crate::util::hash::Fingerprint;
use crate::util::Config;

/// Error returned by a foreign resolver.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The manifest is missing or cannot be parsed.
    #[error("cannot read manifest {}: {reason}", path.display())]
    ManifestUnreadable { path: PathBuf, reason: String },

    /// Anything else: the foreign tool failed, the package is unusable, ...
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl ResolverError {
    pub fn unreadable(path: &Path, reason: impl fmt::Display) -> Self {
        ResolverError::ManifestUnreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// Attach the requirement name.
    pub fn into_bridge_error(self, requirement: &str) -> BridgeError {
        match self {
            ResolverError::ManifestUnreadable { path, reason } => BridgeError::ManifestUnreadable {
                name: requirement.to_string(),
                path,
                reason,
            },
            ResolverError::Failed(cause) => BridgeError::resolution_failed(requirement, cause),
        }
    }
}

/// A resolver for one foreign manifest format.
///
/// Implementations must be deterministic: the same manifest contents and
/// options produce the same [`ResolvedPackage`].
pub trait ForeignResolver: Send + Sync {
    /// Get the resolver name for display and fingerprinting.
    fn name(&self) -> &str;

    /// The manifest format this resolver understands.
    fn kind(&self) -> ManifestKind;

    /// Resolve a manifest into compile/link artifacts.
    fn resolve(
        &self,
        manifest_path: &Path,
        options: &RequirementOptions,
    ) -> Result<ResolvedPackage, ResolverError>;
}

/// The resolvers available to a build, one per manifest kind.
#[derive(Default)]
pub struct ResolverSet {
    resolvers: Vec<Box<dyn ForeignResolver>>,
}

impl ResolverSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Cargo and vcpkg resolvers, configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut set = ResolverSet::new();
        set.register(CargoResolver::from_config(config));
        set.register(VcpkgResolver::from_config(config));
        set
    }

    /// Add a resolver, replacing any existing one for the same kind.
    pub fn register(&mut self, resolver: impl ForeignResolver + 'static) {
        let kind = resolver.kind();
        self.resolvers.retain(|r| r.kind() != kind);
        self.resolvers.push(Box::new(resolver));
    }

    /// Get the resolver for a manifest kind.
    pub fn get(&self, kind: ManifestKind) -> Option<&dyn ForeignResolver> {
        self.resolvers
            .iter()
            .find(|r| r.kind() == kind)
            .map(|r| r.as_ref())
    }

    /// Pick the resolver responsible for a requirement.
    pub fn resolver_for(
        &self,
        requirement: &PackageRequirement,
    ) -> Result<&dyn ForeignResolver, BridgeError> {
        let kind = requirement.manifest_kind().ok_or_else(|| {
            BridgeError::resolution_failed(
                requirement.name(),
                anyhow::anyhow!(
                    "cannot tell the manifest format of {} (set the `kind` option to `cargo` or `vcpkg`)",
                    requirement.manifest_path().display()
                ),
            )
        })?;

        self.get(kind).ok_or_else(|| {
            BridgeError::resolution_failed(
                requirement.name(),
                anyhow::anyhow!("no resolver is registered for {} manifests", kind),
            )
        })
    }

    /// Run the responsible resolver. Not memoized; see [`ResolutionCache`].
    pub fn resolve(&self, requirement: &PackageRequirement) -> Result<ResolvedPackage, BridgeError> {
        let resolver = self.resolver_for(requirement)?;
        tracing::debug!(
            "resolving `{}` from {} with the {} resolver",
            requirement.name(),
            requirement.manifest_path().display(),
            resolver.name()
        );

        let mut package = resolver
            .resolve(requirement.manifest_path(), requirement.options())
            .map_err(|e| e.into_bridge_error(requirement.name()))?;

        if package.fingerprint.is_none() {
            package.fingerprint = requirement_fingerprint(resolver.name(), requirement);
        }
        Ok(package)
    }
}

/// Fingerprint of a requirement's manifest contents, resolver and options.
///
/// Returns `None` when the manifest cannot be read.
pub fn requirement_fingerprint(resolver: &str, requirement: &PackageRequirement) -> Option<String> {
    let contents = std::fs::read(requirement.manifest_path()).ok()?;
    let options = requirement.options();

    let mut fp = Fingerprint::new();
    fp.update_bytes(&contents)
        .update_str(resolver)
        .update_opt(options.kind.map(|k| k.to_string()).as_deref())
        .update_strs(options.features.iter().map(String::as_str))
        .update_bool(options.default_features)
        .update_str(options.profile.as_str())
        .update_opt(options.target.as_deref())
        .update_opt(options.linkage.map(|l| format!("{:?}", l)).as_deref())
        .update_bool(options.build);
    if let Some(libs) = &options.libs {
        fp.update_strs(libs.iter().map(String::as_str));
    }
    for (key, value) in &options.extra {
        fp.update_str(key).update_str(value);
    }
    Some(fp.finish())
}
