//! Ferry - bridge foreign package manifests into C/C++ build targets.
//!
//! This crate provides the core library functionality for Ferry: declaring
//! requirements on packages described by Cargo or vcpkg manifests, attaching
//! them to targets, and finalizing the build graph with each target's
//! merged include paths, libraries and link flags.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for Ferry unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a counting mock resolver and project
/// fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{
    build_config::BuildConfig, errors::BridgeError, graph::BuildGraph, manifest::Manifest,
    requirement::PackageRequirement, target::BuildTarget, workspace::Workspace,
};

pub use resolver::{ForeignResolver, ResolverSet};
pub use util::context::GlobalContext;
