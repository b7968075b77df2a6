//! Memoized resolutions.
//!
//! Each requirement name owns a slot guarded by its own lock. The first
//! caller for a name resolves while holding that lock; concurrent callers for
//! the same name wait on it and reuse the result, so a name is resolved at
//! most once. Failures are not stored, and a later call retries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::artifacts::ResolvedPackage;
use crate::core::build_config::BuildConfig;
use crate::core::errors::BridgeError;
use crate::core::requirement::PackageRequirement;
use crate::resolver::{requirement_fingerprint, ResolverSet};

type Slot = Arc<Mutex<Option<Arc<ResolvedPackage>>>>;

/// Per-name cache of successful resolutions.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(name.to_string()).or_default().clone()
    }

    /// Return the memoized resolution of `requirement`, resolving it first
    /// if needed.
    pub fn get_or_resolve(
        &self,
        requirement: &PackageRequirement,
        resolvers: &ResolverSet,
    ) -> Result<Arc<ResolvedPackage>, BridgeError> {
        let slot = self.slot(requirement.name());
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(package) = entry.as_ref() {
            tracing::debug!("reusing resolution of `{}`", requirement.name());
            return Ok(Arc::clone(package));
        }

        let package = Arc::new(resolvers.resolve(requirement)?);
        *entry = Some(Arc::clone(&package));
        Ok(package)
    }

    /// Get a memoized resolution without resolving.
    pub fn get(&self, name: &str) -> Option<Arc<ResolvedPackage>> {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.get(name)?.clone()
        };
        let entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        entry.clone()
    }

    /// Number of memoized resolutions.
    pub fn len(&self) -> usize {
        let slots: Vec<Slot> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.values().cloned().collect()
        };
        slots
            .iter()
            .filter(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget the resolution of `name`. Returns true if one was memoized.
    pub fn invalidate(&self, name: &str) -> bool {
        let slot = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get(name) {
                Some(slot) => slot.clone(),
                None => return false,
            }
        };
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        entry.take().is_some()
    }

    /// Forget every resolution.
    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Evict resolutions whose manifest or options changed since they were
    /// made. Returns the evicted names in declaration order.
    pub fn refresh(&self, config: &BuildConfig, resolvers: &ResolverSet) -> Vec<String> {
        let mut evicted = Vec::new();

        for requirement in config.requirements() {
            let Some(package) = self.get(requirement.name()) else {
                continue;
            };

            let current = resolvers
                .resolver_for(requirement)
                .ok()
                .and_then(|r| requirement_fingerprint(r.name(), requirement));

            let stale = match (&package.fingerprint, &current) {
                (Some(old), Some(new)) => old != new,
                _ => true,
            };

            if stale && self.invalidate(requirement.name()) {
                tracing::debug!("manifest of `{}` changed, dropping its resolution", requirement.name());
                evicted.push(requirement.name().to_string());
            }
        }

        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifacts::LinkArtifact;
    use crate::core::requirement::RequirementOptions;
    use crate::test_support::MockResolver;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tempfile::TempDir;

    fn requirement(name: &str, path: impl Into<std::path::PathBuf>) -> PackageRequirement {
        PackageRequirement::new(name, path, RequirementOptions::default()).unwrap()
    }

    #[test]
    fn test_resolves_once() {
        let mock = MockResolver::new("mock").with_package(
            "crypto/Cargo.toml",
            ResolvedPackage::new().with_artifact(LinkArtifact::static_lib("libcrypto.a")),
        );
        let calls = mock.calls();
        let mut resolvers = ResolverSet::new();
        resolvers.register(mock);

        let cache = ResolutionCache::new();
        let req = requirement("crypto", "crypto/Cargo.toml");

        let first = cache.get_or_resolve(&req, &resolvers).unwrap();
        let second = cache.get_or_resolve(&req, &resolvers).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_callers_share_one_resolution() {
        let mock = MockResolver::new("mock").with_delay(Duration::from_millis(50));
        let calls = mock.calls();
        let mut resolvers = ResolverSet::new();
        resolvers.register(mock);

        let cache = ResolutionCache::new();
        let req = requirement("crypto", "crypto/Cargo.toml");

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| cache.get_or_resolve(&req, &resolvers).unwrap());
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_not_memoized() {
        let mock = MockResolver::new("mock").with_failure("bad/Cargo.toml", "boom");
        let calls = mock.calls();
        let mut resolvers = ResolverSet::new();
        resolvers.register(mock);

        let cache = ResolutionCache::new();
        let req = requirement("bad", "bad/Cargo.toml");

        assert!(cache.get_or_resolve(&req, &resolvers).is_err());
        assert!(cache.get_or_resolve(&req, &resolvers).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut resolvers = ResolverSet::new();
        resolvers.register(MockResolver::new("mock"));

        let cache = ResolutionCache::new();
        cache
            .get_or_resolve(&requirement("a", "a/Cargo.toml"), &resolvers)
            .unwrap();
        cache
            .get_or_resolve(&requirement("b", "b/Cargo.toml"), &resolvers)
            .unwrap();

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_refresh_evicts_changed_manifests() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a/Cargo.toml");
        let b = tmp.path().join("b/Cargo.toml");
        std::fs::create_dir_all(a.parent().unwrap()).unwrap();
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, "[package]\nname = \"a\"\n").unwrap();
        std::fs::write(&b, "[package]\nname = \"b\"\n").unwrap();

        let mock = MockResolver::new("mock");
        let calls = mock.calls();
        let mut resolvers = ResolverSet::new();
        resolvers.register(mock);

        let mut config = BuildConfig::new();
        config.declare("a", &a, RequirementOptions::default()).unwrap();
        config.declare("b", &b, RequirementOptions::default()).unwrap();

        let cache = ResolutionCache::new();
        for req in config.requirements() {
            cache.get_or_resolve(req, &resolvers).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(cache.refresh(&config, &resolvers).is_empty());

        std::fs::write(&b, "[package]\nname = \"b\"\nversion = \"2.0.0\"\n").unwrap();
        assert_eq!(cache.refresh(&config, &resolvers), vec!["b"]);

        for req in config.requirements() {
            cache.get_or_resolve(req, &resolvers).unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
