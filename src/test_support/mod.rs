//! Test utilities and mocks for Ferry unit tests.
//!
//! [`MockResolver`] stands in for a foreign resolver: it hands back canned
//! packages or failures per manifest path and counts how often it was asked.
//!
//! # Example
//!
//! ```rust,ignore
//! use ferry::test_support::MockResolver;
//!
//! let mock = MockResolver::new("mock")
//!     .with_package("crypto/Cargo.toml", ResolvedPackage::new().with_include_dir("/inc"));
//! let calls = mock.calls();
//! ```

pub mod fixtures;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::core::artifacts::ResolvedPackage;
use crate::core::requirement::{ManifestKind, RequirementOptions};
use crate::resolver::{ForeignResolver, ResolverError};

pub use fixtures::*;

#[derive(Debug, Clone)]
enum MockOutcome {
    Package(ResolvedPackage),
    Failure(String),
    Unreadable(String),
}

/// Mock foreign resolver with a call counter.
///
/// Manifests without a registered outcome resolve to an empty package.
#[derive(Debug, Clone)]
pub struct MockResolver {
    name: String,
    kind: ManifestKind,
    outcomes: HashMap<PathBuf, MockOutcome>,
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockResolver {
    /// Create a mock that handles Cargo manifests.
    pub fn new(name: impl Into<String>) -> Self {
        MockResolver {
            name: name.into(),
            kind: ManifestKind::Cargo,
            outcomes: HashMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    /// Handle a different manifest kind.
    pub fn with_kind(mut self, kind: ManifestKind) -> Self {
        self.kind = kind;
        self
    }

    /// Resolve `manifest` to `package`.
    pub fn with_package(mut self, manifest: impl Into<PathBuf>, package: ResolvedPackage) -> Self {
        self.outcomes
            .insert(manifest.into(), MockOutcome::Package(package));
        self
    }

    /// Fail resolution of `manifest`.
    pub fn with_failure(mut self, manifest: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        self.outcomes
            .insert(manifest.into(), MockOutcome::Failure(message.into()));
        self
    }

    /// Report `manifest` as unreadable.
    pub fn with_unreadable(mut self, manifest: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        self.outcomes
            .insert(manifest.into(), MockOutcome::Unreadable(reason.into()));
        self
    }

    /// Sleep inside every resolution, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared handle to the call counter, usable after the mock is moved.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    /// Number of resolutions so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ForeignResolver for MockResolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ManifestKind {
        self.kind
    }

    fn resolve(
        &self,
        manifest_path: &Path,
        _options: &RequirementOptions,
    ) -> Result<ResolvedPackage, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        match self.outcomes.get(manifest_path) {
            Some(MockOutcome::Package(package)) => Ok(package.clone()),
            Some(MockOutcome::Failure(message)) => {
                Err(ResolverError::Failed(anyhow::anyhow!("{}", message)))
            }
            Some(MockOutcome::Unreadable(reason)) => {
                Err(ResolverError::unreadable(manifest_path, reason))
            }
            None => Ok(ResolvedPackage::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_resolver_outcomes() {
        let mock = MockResolver::new("mock")
            .with_package("a/Cargo.toml", ResolvedPackage::new().with_link_flag("-la"))
            .with_failure("b/Cargo.toml", "boom")
            .with_unreadable("c/Cargo.toml", "missing");
        let options = RequirementOptions::default();

        let a = mock.resolve(Path::new("a/Cargo.toml"), &options).unwrap();
        assert_eq!(a.link_flags, vec!["-la"]);
        assert!(matches!(
            mock.resolve(Path::new("b/Cargo.toml"), &options),
            Err(ResolverError::Failed(_))
        ));
        assert!(matches!(
            mock.resolve(Path::new("c/Cargo.toml"), &options),
            Err(ResolverError::ManifestUnreadable { .. })
        ));
        assert!(mock
            .resolve(Path::new("d/Cargo.toml"), &options)
            .unwrap()
            .link_artifacts
            .is_empty());

        assert_eq!(mock.call_count(), 4);
    }
}
