//! Core data structures for Ferry.
//!
//! This module contains the foundational types used throughout Ferry:
//! - Requirements on foreign manifests and their options
//! - Targets and the requirement names attached to them
//! - Resolved artifacts and the finalized build graph
//! - The `BuildConfig` context object and `Ferry.toml` loading

pub mod artifacts;
pub mod build_config;
pub mod errors;
pub mod graph;
pub mod manifest;
pub mod requirement;
pub mod target;
pub mod workspace;

pub use artifacts::{ArtifactSet, LinkArtifact, ResolvedPackage};
pub use build_config::BuildConfig;
pub use errors::BridgeError;
pub use graph::{BuildGraph, BuildNode};
pub use manifest::{Manifest, ManifestError, MANIFEST_NAME};
pub use requirement::{Linkage, ManifestKind, PackageRequirement, Profile, RequirementOptions};
pub use target::{BuildTarget, TargetKind};
pub use workspace::Workspace;
