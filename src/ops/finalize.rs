//! Build graph finalization.
//!
//! Turns a `BuildConfig` into a `BuildGraph`:
//!
//! 1. every attached requirement name is checked against the declarations,
//!    before any resolver runs;
//! 2. the union of attached names is resolved in parallel through the
//!    configuration's resolution cache;
//! 3. each target merges its requirements' artifacts in attachment order.
//!
//! Any failure aborts the whole finalization; no partial graph is returned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::core::artifacts::{ArtifactSet, ResolvedPackage};
use crate::core::build_config::BuildConfig;
use crate::core::errors::BridgeError;
use crate::core::graph::{BuildGraph, BuildNode};
use crate::core::requirement::PackageRequirement;
use crate::core::target::BuildTarget;
use crate::resolver::ResolverSet;

/// Options for finalization.
#[derive(Debug, Clone, Default)]
pub struct FinalizeOptions {
    /// Targets to finalize (empty = all)
    pub targets: Vec<String>,

    /// Number of resolution threads (None = rayon's default)
    pub jobs: Option<usize>,
}

impl FinalizeOptions {
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }
}

/// Finalize the build graph.
pub fn finalize(
    config: &BuildConfig,
    resolvers: &ResolverSet,
    opts: &FinalizeOptions,
) -> Result<BuildGraph, BridgeError> {
    let targets = select_targets(config, &opts.targets)?;
    config.validate_targets(targets.iter().copied())?;

    let requirements = requirement_union(config, &targets);
    let resolved = resolve_all(config, resolvers, &requirements, opts.jobs)?;

    let nodes = targets
        .iter()
        .map(|target| {
            let mut artifacts = ArtifactSet::new();
            for name in target.requirements() {
                if let Some(package) = resolved.get(name.as_str()) {
                    artifacts.merge(package);
                }
            }

            BuildNode {
                name: target.name().to_string(),
                kind: target.kind(),
                sources: target.sources().to_vec(),
                requirements: target.requirements().to_vec(),
                artifacts,
            }
        })
        .collect();

    Ok(BuildGraph { nodes })
}

/// The requested targets in definition order, or all of them.
fn select_targets<'a>(
    config: &'a BuildConfig,
    requested: &[String],
) -> Result<Vec<&'a BuildTarget>, BridgeError> {
    if requested.is_empty() {
        return Ok(config.targets().iter().collect());
    }

    if let Some(missing) = requested.iter().find(|name| config.target(name).is_none()) {
        return Err(BridgeError::UnknownTarget {
            name: missing.clone(),
        });
    }

    Ok(config
        .targets()
        .iter()
        .filter(|t| requested.iter().any(|name| name == t.name()))
        .collect())
}

/// Attached requirements across `targets`, each once, in first-seen order.
fn requirement_union<'a>(
    config: &'a BuildConfig,
    targets: &[&BuildTarget],
) -> Vec<&'a PackageRequirement> {
    let mut union: Vec<&PackageRequirement> = Vec::new();
    for target in targets {
        for name in target.requirements() {
            if union.iter().any(|r| r.name() == name) {
                continue;
            }
            if let Some(requirement) = config.requirement(name) {
                union.push(requirement);
            }
        }
    }
    union
}

fn resolve_all(
    config: &BuildConfig,
    resolvers: &ResolverSet,
    requirements: &[&PackageRequirement],
    jobs: Option<usize>,
) -> Result<HashMap<String, Arc<ResolvedPackage>>, BridgeError> {
    if requirements.is_empty() {
        return Ok(HashMap::new());
    }

    tracing::info!("Resolving {} requirement(s)", requirements.len());
    let cache = config.resolutions();
    let failed = AtomicBool::new(false);
    let run = || {
        requirements
            .par_iter()
            .map(|requirement| {
                // No new resolution starts once one has failed
                if failed.load(Ordering::Acquire) {
                    return None;
                }
                let result = cache.get_or_resolve(requirement, resolvers);
                if result.is_err() {
                    failed.store(true, Ordering::Release);
                }
                Some(result)
            })
            .collect::<Vec<_>>()
    };

    let results = match jobs {
        Some(jobs) => match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                tracing::warn!("failed to start {} resolver threads ({}), using the global pool", jobs, e);
                run()
            }
        },
        None => run(),
    };

    // Report the earliest failure in union order among those that ran
    let mut resolved = HashMap::with_capacity(requirements.len());
    for (requirement, result) in requirements.iter().zip(results) {
        if let Some(result) = result {
            resolved.insert(requirement.name().to_string(), result?);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifacts::LinkArtifact;
    use crate::core::requirement::{ManifestKind, RequirementOptions};
    use crate::core::target::TargetKind;
    use crate::test_support::MockResolver;
    use std::path::PathBuf;
    use std::time::Duration;

    fn crypto() -> ResolvedPackage {
        ResolvedPackage::new()
            .with_include_dir("/inc")
            .with_artifact(LinkArtifact::static_lib("libcrypto.a"))
    }

    fn zlib() -> ResolvedPackage {
        ResolvedPackage::new()
            .with_include_dir("/zlib/include")
            .with_include_dir("/inc")
            .with_artifact(LinkArtifact::static_lib("libz.a"))
            .with_link_flag("-lm")
    }

    fn resolvers(mock: MockResolver) -> ResolverSet {
        let mut set = ResolverSet::new();
        set.register(mock);
        set
    }

    #[test]
    fn test_single_requirement_scenario() {
        let mock = MockResolver::new("mock").with_package("crypto/Cargo.toml", crypto());
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("crypto", "crypto/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();
        config.attach("app", "crypto").unwrap();

        let graph = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap();
        let node = graph.node("app").unwrap();

        assert_eq!(node.kind, TargetKind::Binary);
        assert_eq!(node.sources, vec![PathBuf::from("main.x")]);
        assert_eq!(node.artifacts.include_dirs, vec![PathBuf::from("/inc")]);
        assert_eq!(
            node.artifacts.link_artifacts,
            vec![LinkArtifact::static_lib("libcrypto.a")]
        );
        assert!(node.artifacts.link_flags.is_empty());
    }

    #[test]
    fn test_merge_follows_attachment_order() {
        let mock = MockResolver::new("mock")
            .with_package("crypto/Cargo.toml", crypto())
            .with_package("zlib/Cargo.toml", zlib());
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("crypto", "crypto/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .declare("zlib", "zlib/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("a", TargetKind::Binary, ["a.x"])
            .unwrap();
        config
            .define_target("b", TargetKind::Binary, ["b.x"])
            .unwrap();
        config.attach("a", "crypto").unwrap();
        config.attach("a", "zlib").unwrap();
        config.attach("b", "zlib").unwrap();
        config.attach("b", "crypto").unwrap();

        let graph = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap();

        let a = &graph.node("a").unwrap().artifacts;
        assert_eq!(
            a.include_dirs,
            vec![PathBuf::from("/inc"), PathBuf::from("/zlib/include")]
        );
        assert_eq!(
            a.link_artifacts,
            vec![
                LinkArtifact::static_lib("libcrypto.a"),
                LinkArtifact::static_lib("libz.a")
            ]
        );

        let b = &graph.node("b").unwrap().artifacts;
        assert_eq!(
            b.include_dirs,
            vec![PathBuf::from("/zlib/include"), PathBuf::from("/inc")]
        );
        assert_eq!(b.link_flags, vec!["-lm"]);
    }

    #[test]
    fn test_requirements_dispatch_by_manifest_kind() {
        let cargo = MockResolver::new("cargo").with_package("crypto/Cargo.toml", crypto());
        let vcpkg = MockResolver::new("vcpkg")
            .with_kind(ManifestKind::Vcpkg)
            .with_package("ports/vcpkg.json", zlib());
        let cargo_calls = cargo.calls();
        let vcpkg_calls = vcpkg.calls();
        let mut resolvers = ResolverSet::new();
        resolvers.register(cargo);
        resolvers.register(vcpkg);

        let mut config = BuildConfig::new();
        config
            .declare("zlib", "ports/vcpkg.json", RequirementOptions::default())
            .unwrap();
        config
            .declare("crypto", "crypto/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();
        config.attach("app", "zlib").unwrap();
        config.attach("app", "crypto").unwrap();

        let graph = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap();
        assert_eq!(
            graph.node("app").unwrap().artifacts.link_artifacts,
            vec![
                LinkArtifact::static_lib("libz.a"),
                LinkArtifact::static_lib("libcrypto.a")
            ]
        );
        assert_eq!(cargo_calls.load(Ordering::SeqCst), 1);
        assert_eq!(vcpkg_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_shared_requirement_resolved_once() {
        let mock = MockResolver::new("mock")
            .with_package("crypto/Cargo.toml", crypto())
            .with_delay(Duration::from_millis(20));
        let calls = mock.calls();
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("crypto", "crypto/Cargo.toml", RequirementOptions::default())
            .unwrap();
        for name in ["a", "b", "c", "d"] {
            config
                .define_target(name, TargetKind::Binary, ["main.x"])
                .unwrap();
            config.attach(name, "crypto").unwrap();
        }

        let opts = FinalizeOptions::default().with_jobs(4);
        finalize(&config, &resolvers, &opts).unwrap();
        finalize(&config, &resolvers, &opts).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_finalization_resolves_each_name_once() {
        let mock = MockResolver::new("mock").with_delay(Duration::from_millis(20));
        let calls = mock.calls();
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        for name in ["x", "y", "z"] {
            config
                .declare(name, format!("{}/Cargo.toml", name), RequirementOptions::default())
                .unwrap();
        }
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();
        for name in ["x", "y", "z"] {
            config.attach("app", name).unwrap();
        }

        std::thread::scope(|s| {
            for _ in 0..6 {
                s.spawn(|| finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap());
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unknown_requirement_stops_before_resolution() {
        let mock = MockResolver::new("mock");
        let calls = mock.calls();
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("crypto", "crypto/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();
        config.attach("app", "crypto").unwrap();
        config.attach("app", "missing").unwrap();

        let err = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::UnknownRequirement { ref name, .. } if name == "missing"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failure_aborts_and_config_stays_usable() {
        let mock = MockResolver::new("mock")
            .with_package("crypto/Cargo.toml", crypto())
            .with_failure("broken/Cargo.toml", "cargo build exited with status 101");
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("crypto", "crypto/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .declare("broken", "broken/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();
        config.attach("app", "crypto").unwrap();
        config.attach("app", "broken").unwrap();

        let err = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap_err();
        assert!(matches!(err, BridgeError::ResolutionFailed { ref name, .. } if name == "broken"));
        assert!(err.to_string().contains("status 101"));

        // Fix the configuration and run again
        config.detach("app", "broken").unwrap();
        let graph = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap();
        assert_eq!(graph.node("app").unwrap().artifacts.link_artifacts.len(), 1);
    }

    #[test]
    fn test_failure_stops_remaining_resolutions() {
        let mock = MockResolver::new("mock").with_failure("a/Cargo.toml", "boom");
        let calls = mock.calls();
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();
        for name in ["a", "b", "c", "d", "e"] {
            config
                .declare(name, format!("{}/Cargo.toml", name), RequirementOptions::default())
                .unwrap();
            config.attach("app", name).unwrap();
        }

        let opts = FinalizeOptions::default().with_jobs(1);
        let err = finalize(&config, &resolvers, &opts).unwrap_err();
        assert!(matches!(err, BridgeError::ResolutionFailed { ref name, .. } if name == "a"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(config.resolutions().is_empty());
    }

    #[test]
    fn test_unreadable_manifest_is_reported() {
        let mock = MockResolver::new("mock").with_unreadable("gone/Cargo.toml", "No such file");
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("gone", "gone/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();
        config.attach("app", "gone").unwrap();

        let err = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap_err();
        assert!(matches!(err, BridgeError::ManifestUnreadable { ref name, .. } if name == "gone"));
    }

    #[test]
    fn test_target_selection() {
        let mock = MockResolver::new("mock");
        let calls = mock.calls();
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("a", "a/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .declare("b", "b/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("one", TargetKind::Binary, ["1.x"])
            .unwrap();
        config
            .define_target("two", TargetKind::StaticLibrary, ["2.x"])
            .unwrap();
        config.attach("one", "a").unwrap();
        config.attach("two", "b").unwrap();
        config.attach("two", "undeclared").unwrap();

        // Only the selected target is validated and resolved
        let opts = FinalizeOptions::default().with_targets(["one"]);
        let graph = finalize(&config, &resolvers, &opts).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let opts = FinalizeOptions::default().with_targets(["three"]);
        let err = finalize(&config, &resolvers, &opts).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownTarget { ref name } if name == "three"));
    }

    #[test]
    fn test_unattached_requirements_are_not_resolved() {
        let mock = MockResolver::new("mock");
        let calls = mock.calls();
        let resolvers = resolvers(mock);

        let mut config = BuildConfig::new();
        config
            .declare("unused", "unused/Cargo.toml", RequirementOptions::default())
            .unwrap();
        config
            .define_target("app", TargetKind::Binary, ["main.x"])
            .unwrap();

        let graph = finalize(&config, &resolvers, &FinalizeOptions::default()).unwrap();
        assert!(graph.node("app").unwrap().artifacts.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
