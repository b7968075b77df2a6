//! Cargo manifest resolver.
//!
//! Resolves a Rust crate that exposes a C ABI (`staticlib` or `cdylib`) into
//! the library file cargo produces, plus the include directory and native
//! link flags a C/C++ consumer needs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::core::artifacts::{LinkArtifact, ResolvedPackage};
use crate::core::requirement::{Linkage, ManifestKind, Profile, RequirementOptions};
use crate::resolver::{ForeignResolver, ResolverError};
use crate::util::process::ProcessBuilder;
use crate::util::Config;

#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
    #[serde(default)]
    lib: Option<CargoLib>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: String,
    #[serde(default)]
    metadata: Option<PackageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct PackageMetadata {
    #[serde(default)]
    ferry: Option<FerryMetadata>,
}

/// `[package.metadata.ferry]`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct FerryMetadata {
    #[serde(default)]
    include: Vec<PathBuf>,
    #[serde(default)]
    link_flags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CargoLib {
    name: Option<String>,
    #[serde(default)]
    crate_type: Vec<String>,
}

/// Resolver for `Cargo.toml` manifests.
#[derive(Debug, Clone)]
pub struct CargoResolver {
    program: PathBuf,
    target_dir: Option<PathBuf>,
    offline: bool,
}

impl CargoResolver {
    pub fn from_config(config: &Config) -> Self {
        CargoResolver {
            program: config.cargo_program(),
            target_dir: config.cargo.target_dir.clone(),
            offline: config.cargo.offline,
        }
    }

    /// Root of cargo's target directory. A relative `target-dir` is taken
    /// from the crate's manifest directory, never from the process cwd.
    fn target_root(&self, manifest_dir: &Path) -> PathBuf {
        match &self.target_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => manifest_dir.join(dir),
            None => manifest_dir.join("target"),
        }
    }

    /// Directory cargo writes the library into.
    fn output_dir(&self, target_root: &Path, options: &RequirementOptions) -> PathBuf {
        let mut dir = target_root.to_path_buf();
        if let Some(triple) = &options.target {
            dir.push(triple);
        }
        dir.push(options.profile.as_str());
        dir
    }

    fn build(
        &self,
        manifest_path: &Path,
        lib_name: &str,
        target_root: &Path,
        options: &RequirementOptions,
    ) -> anyhow::Result<()> {
        let mut cmd = ProcessBuilder::new(&self.program)
            .arg("build")
            .arg("--manifest-path")
            .arg(manifest_path)
            .arg("--lib")
            .arg("--target-dir")
            .arg(target_root);

        if options.profile == Profile::Release {
            cmd = cmd.arg("--release");
        }
        if !options.features.is_empty() {
            cmd = cmd.arg("--features").arg(options.features.join(","));
        }
        if !options.default_features {
            cmd = cmd.arg("--no-default-features");
        }
        if let Some(triple) = &options.target {
            cmd = cmd.arg("--target").arg(triple);
        }
        if self.offline {
            cmd = cmd.arg("--offline");
        }
        cmd = cmd.envs(&options.extra);

        tracing::info!("Building `{}` with cargo ({})", lib_name, options.profile.as_str());
        cmd.exec_and_check()
            .with_context(|| format!("cargo build failed for {}", manifest_path.display()))?;
        Ok(())
    }
}

impl ForeignResolver for CargoResolver {
    fn name(&self) -> &str {
        "cargo"
    }

    fn kind(&self) -> ManifestKind {
        ManifestKind::Cargo
    }

    fn resolve(
        &self,
        manifest_path: &Path,
        options: &RequirementOptions,
    ) -> Result<ResolvedPackage, ResolverError> {
        let contents = std::fs::read_to_string(manifest_path)
            .map_err(|e| ResolverError::unreadable(manifest_path, e))?;
        let manifest: CargoManifest = toml::from_str(&contents)
            .map_err(|e| ResolverError::unreadable(manifest_path, e.message()))?;
        let package = manifest.package.ok_or_else(|| {
            ResolverError::unreadable(
                manifest_path,
                "no [package] section (workspace manifests are not supported)",
            )
        })?;

        let lib = manifest.lib.unwrap_or_default();
        let lib_name = lib
            .name
            .clone()
            .unwrap_or_else(|| package.name.replace('-', "_"));
        let linkage = select_linkage(&package.name, &lib, options)?;

        let os = target_os(options.target.as_deref());
        let manifest_dir = manifest_path.parent().unwrap_or(Path::new(""));
        let target_root = self.target_root(manifest_dir);
        let artifact_path = self
            .output_dir(&target_root, options)
            .join(library_filename(&lib_name, linkage, os));

        if options.build {
            self.build(manifest_path, &lib_name, &target_root, options)?;
            if !artifact_path.exists() {
                return Err(anyhow::anyhow!(
                    "cargo finished but {} was not produced",
                    artifact_path.display()
                )
                .into());
            }
        }

        let metadata = package
            .metadata
            .and_then(|m| m.ferry)
            .unwrap_or_default();

        let mut resolved = ResolvedPackage::new();
        if metadata.include.is_empty() {
            let include = manifest_dir.join("include");
            if include.is_dir() {
                resolved = resolved.with_include_dir(include);
            }
        } else {
            for dir in &metadata.include {
                resolved = resolved.with_include_dir(manifest_dir.join(dir));
            }
        }

        resolved = resolved.with_artifact(LinkArtifact {
            path: artifact_path,
            linkage,
        });

        for flag in metadata.link_flags {
            resolved = resolved.with_link_flag(flag);
        }
        if linkage == Linkage::Static {
            for flag in native_static_libs(os) {
                resolved = resolved.with_link_flag(*flag);
            }
        }

        tracing::debug!(
            "cargo package `{}` resolves to {} ({:?})",
            package.name,
            lib_name,
            linkage
        );
        Ok(resolved)
    }
}

/// Pick static or dynamic linkage from the options and `[lib] crate-type`.
fn select_linkage(
    package: &str,
    lib: &CargoLib,
    options: &RequirementOptions,
) -> anyhow::Result<Linkage> {
    let has_static = lib.crate_type.iter().any(|t| t == "staticlib");
    let has_dynamic = lib.crate_type.iter().any(|t| t == "cdylib");

    match options.linkage {
        Some(Linkage::Static) if has_static => Ok(Linkage::Static),
        Some(Linkage::Dynamic) if has_dynamic => Ok(Linkage::Dynamic),
        Some(Linkage::Static) => {
            bail!("crate `{}` does not build a staticlib; add \"staticlib\" to [lib] crate-type", package)
        }
        Some(Linkage::Dynamic) => {
            bail!("crate `{}` does not build a cdylib; add \"cdylib\" to [lib] crate-type", package)
        }
        None if has_static => Ok(Linkage::Static),
        None if has_dynamic => Ok(Linkage::Dynamic),
        None => bail!(
            "crate `{}` is not a C-compatible library; [lib] crate-type must list \"staticlib\" or \"cdylib\"",
            package
        ),
    }
}

/// Operating system of a target triple, or of the host.
fn target_os(triple: Option<&str>) -> &'static str {
    match triple {
        Some(t) if t.contains("windows") => "windows",
        Some(t) if t.contains("apple") || t.contains("darwin") => "macos",
        Some(_) => "linux",
        None => match std::env::consts::OS {
            "windows" => "windows",
            "macos" => "macos",
            _ => "linux",
        },
    }
}

/// File name cargo gives the library for a linkage and OS.
fn library_filename(lib_name: &str, linkage: Linkage, os: &str) -> String {
    match (linkage, os) {
        (Linkage::Static, "windows") => format!("{}.lib", lib_name),
        (Linkage::Static, _) => format!("lib{}.a", lib_name),
        (Linkage::Dynamic, "windows") => format!("{}.dll.lib", lib_name),
        (Linkage::Dynamic, "macos") => format!("lib{}.dylib", lib_name),
        (Linkage::Dynamic, _) => format!("lib{}.so", lib_name),
    }
}

/// Native libraries the Rust standard library needs when linked statically.
fn native_static_libs(os: &str) -> &'static [&'static str] {
    match os {
        "windows" => &[
            "kernel32.lib",
            "advapi32.lib",
            "ntdll.lib",
            "userenv.lib",
            "ws2_32.lib",
        ],
        "macos" => &["-lSystem", "-lresolv", "-lc", "-lm"],
        _ => &["-lpthread", "-ldl", "-lm"],
    }
}
