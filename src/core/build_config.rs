//! The build configuration of one invocation.
//!
//! `BuildConfig` is the context object the declarator and the binder write
//! into: requirements and targets are kept in declaration order and nothing
//! here resolves anything. Resolution happens at finalization, and its
//! memoized results live in the configuration's [`ResolutionCache`] so that
//! repeated finalizations of the same configuration reuse them.

use std::path::PathBuf;

use crate::core::errors::BridgeError;
use crate::core::requirement::{PackageRequirement, RequirementOptions};
use crate::core::target::{BuildTarget, TargetKind};
use crate::resolver::ResolutionCache;

/// Declared requirements and defined targets.
#[derive(Debug, Default)]
pub struct BuildConfig {
    requirements: Vec<PackageRequirement>,
    targets: Vec<BuildTarget>,
    resolutions: ResolutionCache,
}

impl BuildConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a requirement satisfied by a foreign manifest.
    ///
    /// Pure data entry: the manifest is not read until resolution.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        manifest_path: impl Into<PathBuf>,
        options: RequirementOptions,
    ) -> Result<&PackageRequirement, BridgeError> {
        let requirement = PackageRequirement::new(name, manifest_path, options)?;
        if self.requirement(requirement.name()).is_some() {
            return Err(BridgeError::DuplicateRequirement {
                name: requirement.name().to_string(),
            });
        }

        tracing::debug!("declared requirement {}", requirement);
        self.requirements.push(requirement);
        Ok(&self.requirements[self.requirements.len() - 1])
    }

    /// Define a target.
    pub fn define_target(
        &mut self,
        name: impl Into<String>,
        kind: TargetKind,
        sources: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Result<&BuildTarget, BridgeError> {
        let target = BuildTarget::new(name, kind, sources)?;
        if self.target(target.name()).is_some() {
            return Err(BridgeError::DuplicateTarget {
                name: target.name().to_string(),
            });
        }

        tracing::debug!("defined {} target `{}`", target.kind(), target.name());
        self.targets.push(target);
        Ok(&self.targets[self.targets.len() - 1])
    }

    /// Define a target whose kind is given as text.
    pub fn define_target_str(
        &mut self,
        name: impl Into<String>,
        kind: &str,
        sources: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Result<&BuildTarget, BridgeError> {
        let name = name.into();
        let kind = TargetKind::parse(&name, kind)?;
        self.define_target(name, kind, sources)
    }

    /// Attach a requirement name to a target.
    ///
    /// The name is not checked here; an undeclared name is reported when
    /// the configuration is validated or finalized.
    pub fn attach(&mut self, target: &str, requirement: impl Into<String>) -> Result<(), BridgeError> {
        let target = self.target_mut(target)?;
        target.attach(requirement);
        Ok(())
    }

    /// Detach a requirement name from a target. Returns false if it was
    /// not attached.
    pub fn detach(&mut self, target: &str, requirement: &str) -> Result<bool, BridgeError> {
        let target = self.target_mut(target)?;
        Ok(target.detach(requirement))
    }

    /// Look up a requirement by name.
    pub fn requirement(&self, name: &str) -> Option<&PackageRequirement> {
        self.requirements.iter().find(|r| r.name() == name)
    }

    /// Look up a target by name.
    pub fn target(&self, name: &str) -> Option<&BuildTarget> {
        self.targets.iter().find(|t| t.name() == name)
    }

    fn target_mut(&mut self, name: &str) -> Result<&mut BuildTarget, BridgeError> {
        self.targets
            .iter_mut()
            .find(|t| t.name() == name)
            .ok_or_else(|| BridgeError::UnknownTarget {
                name: name.to_string(),
            })
    }

    /// Requirements in declaration order.
    pub fn requirements(&self) -> &[PackageRequirement] {
        &self.requirements
    }

    /// Targets in definition order.
    pub fn targets(&self) -> &[BuildTarget] {
        &self.targets
    }

    /// Declared requirements that no target attaches.
    pub fn unused_requirements(&self) -> Vec<&PackageRequirement> {
        self.requirements
            .iter()
            .filter(|r| {
                !self
                    .targets
                    .iter()
                    .any(|t| t.requirements().iter().any(|n| n == r.name()))
            })
            .collect()
    }

    /// Check that every attached name refers to a declared requirement.
    pub fn validate(&self) -> Result<(), BridgeError> {
        self.validate_targets(&self.targets)
    }

    /// [`validate`](Self::validate) restricted to some targets.
    pub(crate) fn validate_targets<'a>(
        &self,
        targets: impl IntoIterator<Item = &'a BuildTarget>,
    ) -> Result<(), BridgeError> {
        for target in targets {
            for name in target.requirements() {
                if self.requirement(name).is_none() {
                    return Err(BridgeError::UnknownRequirement {
                        target: target.name().to_string(),
                        name: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Memoized resolutions of this configuration's requirements.
    pub fn resolutions(&self) -> &ResolutionCache {
        &self.resolutions
    }
}
