//! vcpkg manifest-mode resolver.
//!
//! Reads a project's `vcpkg.json` and describes the packages vcpkg installs
//! next to it, reading the installed tree directly rather than parsing
//! vcpkg's CLI output:
//!
//! ```text
//! <manifest dir>/
//! ├── vcpkg.json
//! └── vcpkg_installed/<triplet>/
//!     ├── include/
//!     ├── lib/          # release libraries
//!     └── debug/lib/    # debug libraries
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::core::artifacts::{LinkArtifact, ResolvedPackage};
use crate::core::requirement::{Linkage, ManifestKind, Profile, RequirementOptions};
use crate::resolver::{ForeignResolver, ResolverError};
use crate::util::process::ProcessBuilder;
use crate::util::{Config, VcpkgIntegration};

/// The parts of `vcpkg.json` the resolver reads.
#[derive(Debug, Deserialize)]
struct VcpkgManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    dependencies: Vec<VcpkgDependency>,
}

/// A dependency is either a bare port name or an object with a `name`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VcpkgDependency {
    Port(String),
    Detailed { name: String },
}

impl VcpkgDependency {
    fn port(&self) -> &str {
        match self {
            VcpkgDependency::Port(name) => name,
            VcpkgDependency::Detailed { name } => name,
        }
    }
}

/// Resolver for `vcpkg.json` manifests.
#[derive(Debug, Clone)]
pub struct VcpkgResolver {
    integration: Option<VcpkgIntegration>,
}

impl VcpkgResolver {
    pub fn from_config(config: &Config) -> Self {
        VcpkgResolver {
            integration: VcpkgIntegration::from_config(&config.vcpkg),
        }
    }

    fn triplet(&self, options: &RequirementOptions) -> anyhow::Result<String> {
        options
            .target
            .clone()
            .or_else(|| self.integration.as_ref().map(|i| i.triplet.clone()))
            .ok_or_else(|| {
                anyhow!("cannot determine a vcpkg triplet for this host; set the `target` option")
            })
    }

    fn install(
        &self,
        manifest_dir: &Path,
        triplet: &str,
        options: &RequirementOptions,
    ) -> anyhow::Result<()> {
        let vcpkg = self
            .integration
            .as_ref()
            .and_then(VcpkgIntegration::vcpkg_binary)
            .filter(|path| path.exists())
            .ok_or_else(|| anyhow!("vcpkg binary not found. {}", diagnose_vcpkg_setup_error()))?;

        tracing::info!("Installing vcpkg manifest in {} ({})", manifest_dir.display(), triplet);

        let output = ProcessBuilder::new(&vcpkg)
            .arg("install")
            .arg("--triplet")
            .arg(triplet)
            .arg(format!("--x-manifest-root={}", manifest_dir.display()))
            .cwd(manifest_dir)
            .envs(&options.extra)
            .exec()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "vcpkg install failed\n{}\n{}",
                stderr.trim_end(),
                diagnose_vcpkg_install_error(&stderr)
            ));
        }
        Ok(())
    }
}

impl ForeignResolver for VcpkgResolver {
    fn name(&self) -> &str {
        "vcpkg"
    }

    fn kind(&self) -> ManifestKind {
        ManifestKind::Vcpkg
    }

    fn resolve(
        &self,
        manifest_path: &Path,
        options: &RequirementOptions,
    ) -> Result<ResolvedPackage, ResolverError> {
        let contents = fs::read_to_string(manifest_path)
            .map_err(|e| ResolverError::unreadable(manifest_path, e))?;
        let manifest: VcpkgManifest = serde_json::from_str(&contents)
            .map_err(|e| ResolverError::unreadable(manifest_path, e))?;

        let triplet = self.triplet(options)?;
        let manifest_dir = manifest_path.parent().unwrap_or(Path::new(""));
        let installed = manifest_dir.join("vcpkg_installed").join(&triplet);

        if options.build && !installed.exists() {
            self.install(manifest_dir, &triplet, options)
                .with_context(|| format!("failed to install {}", manifest_path.display()))?;
        }

        let lib_dir = match options.profile {
            Profile::Release => installed.join("lib"),
            Profile::Debug => installed.join("debug").join("lib"),
        };
        let os = triplet_os(&triplet);
        let default_linkage = options.linkage.unwrap_or(Linkage::Static);

        let mut resolved = ResolvedPackage::new().with_include_dir(installed.join("include"));

        match &options.libs {
            Some(libs) => {
                for lib in libs {
                    let path = lib_dir.join(library_filename(lib, os));
                    resolved = resolved.with_artifact(LinkArtifact {
                        path,
                        linkage: default_linkage,
                    });
                }
            }
            None => {
                for dep in &manifest.dependencies {
                    let port = dep.port();
                    let found = scan_lib_directory(&lib_dir, port);
                    if found.is_empty() {
                        resolved = resolved.with_artifact(LinkArtifact {
                            path: lib_dir.join(library_filename(port, os)),
                            linkage: default_linkage,
                        });
                    }
                    for path in found {
                        let linkage = linkage_of(&path).unwrap_or(default_linkage);
                        resolved = resolved.with_artifact(LinkArtifact { path, linkage });
                    }
                }
            }
        }

        tracing::debug!(
            "vcpkg manifest `{}` resolves to {} libraries for {}",
            manifest.name.as_deref().unwrap_or("<unnamed>"),
            resolved.link_artifacts.len(),
            triplet
        );
        Ok(resolved)
    }
}

/// Library files in `lib_dir` named after the port, sorted.
fn scan_lib_directory(lib_dir: &Path, port: &str) -> Vec<PathBuf> {
    let port_lower = port.to_lowercase();
    let Ok(entries) = fs::read_dir(lib_dir) else {
        return Vec::new();
    };

    let mut libs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(lib_names)
                .is_some_and(|names| names.iter().any(|name| names_port(name, &port_lower)))
        })
        .collect();
    libs.sort();
    libs
}

/// Suffixes of libraries following the Unix `lib<name>` convention.
/// `.dll.a` is a MinGW import library.
const UNIX_LIB_SUFFIXES: &[&str] = &[".dll.a", ".a", ".so", ".dylib"];

/// Names a library file can be referred to by, or `None` if it is not a
/// library. `libfoo.a` answers to `libfoo` and `foo`; `foo.lib` only to `foo`.
fn lib_names(filename: &str) -> Option<Vec<&str>> {
    if let Some(stem) = UNIX_LIB_SUFFIXES
        .iter()
        .find_map(|suffix| filename.strip_suffix(suffix))
    {
        let mut names = vec![stem];
        if let Some(short) = stem.strip_prefix("lib").filter(|s| !s.is_empty()) {
            names.push(short);
        }
        return Some(names);
    }
    filename.strip_suffix(".lib").map(|stem| vec![stem])
}

/// Whether a library name is the port's own: the port name exactly, or the
/// port name followed by a version or a `_`/`-`/`.` separated suffix.
fn names_port(name: &str, port_lower: &str) -> bool {
    let name = name.to_lowercase();
    match name.strip_prefix(port_lower) {
        Some(rest) => rest
            .chars()
            .next()
            .map_or(true, |c| matches!(c, '_' | '-' | '.') || c.is_ascii_digit()),
        None => false,
    }
}

fn linkage_of(path: &Path) -> Option<Linkage> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(".so") || name.ends_with(".dylib") || name.ends_with(".dll.a") {
        Some(Linkage::Dynamic)
    } else {
        None
    }
}

fn triplet_os(triplet: &str) -> &'static str {
    if triplet.contains("windows") {
        "windows"
    } else if triplet.contains("osx") {
        "macos"
    } else {
        "linux"
    }
}

fn library_filename(lib: &str, os: &str) -> String {
    if os == "windows" {
        format!("{}.lib", lib)
    } else {
        format!("lib{}.a", lib)
    }
}

fn diagnose_vcpkg_setup_error() -> &'static str {
    "Set the VCPKG_ROOT environment variable to your vcpkg installation, \
     or configure [vcpkg] root in .ferry/config.toml"
}

/// Analyze vcpkg install stderr and provide helpful diagnostics.
fn diagnose_vcpkg_install_error(stderr: &str) -> String {
    if stderr.contains("could not find a port named") {
        return "Port not found. Check the port name or run 'vcpkg search' to find available packages.".to_string();
    }

    if stderr.contains("triplet") && stderr.contains("not found") {
        return "Triplet not found. Check available triplets with 'vcpkg help triplet'.".to_string();
    }

    if stderr.contains("error: building") || stderr.contains("CMake Error") {
        return "Build failed. This may be a vcpkg port issue or missing system dependencies."
            .to_string();
    }

    String::new()
}
