//! vcpkg discovery helpers.
//!
//! Locates the vcpkg root and picks a triplet from configuration,
//! the environment, or the host platform.

use std::path::{Path, PathBuf};

use crate::util::config::VcpkgConfig;

/// Resolved vcpkg installation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcpkgIntegration {
    /// Path to the vcpkg root directory (None if vcpkg is not installed)
    pub root: Option<PathBuf>,
    /// Triplet used when a requirement does not name one
    pub triplet: String,
}

impl VcpkgIntegration {
    /// Resolve vcpkg settings from config and environment.
    ///
    /// Returns `None` only when no triplet can be determined for the host.
    pub fn from_config(config: &VcpkgConfig) -> Option<Self> {
        let root = if config.enabled == Some(false) {
            None
        } else {
            resolve_root(config)
        };

        let triplet = resolve_triplet(config)?;
        Some(VcpkgIntegration { root, triplet })
    }

    /// Get the path to the vcpkg binary, if a root is known.
    pub fn vcpkg_binary(&self) -> Option<PathBuf> {
        let exe = if cfg!(windows) { "vcpkg.exe" } else { "vcpkg" };
        self.root.as_ref().map(|root| root.join(exe))
    }
}

fn resolve_root(config: &VcpkgConfig) -> Option<PathBuf> {
    // Priority: config file > environment variable > PATH
    config
        .root
        .clone()
        .or_else(|| std::env::var_os("VCPKG_ROOT").map(PathBuf::from))
        .or_else(detect_from_path)
}

/// Find vcpkg in PATH and derive root from binary location.
fn detect_from_path() -> Option<PathBuf> {
    let vcpkg_exe = if cfg!(windows) { "vcpkg.exe" } else { "vcpkg" };
    let vcpkg_path = which::which(vcpkg_exe).ok()?;
    let root = vcpkg_path.parent()?;

    if is_valid_vcpkg_root(root) {
        tracing::debug!("Found vcpkg in PATH: {}", root.display());
        return Some(root.to_path_buf());
    }

    None
}

/// A vcpkg root carries the `.vcpkg-root` marker written by bootstrap.
fn is_valid_vcpkg_root(path: &Path) -> bool {
    path.join(".vcpkg-root").exists()
}

fn resolve_triplet(config: &VcpkgConfig) -> Option<String> {
    config
        .triplet
        .clone()
        .or_else(|| std::env::var("VCPKG_TARGET_TRIPLET").ok())
        .or_else(|| std::env::var("VCPKG_DEFAULT_TRIPLET").ok())
        .or_else(|| infer_triplet(std::env::consts::ARCH, std::env::consts::OS))
}

/// Map a Rust arch/os pair onto vcpkg's triplet naming.
pub fn infer_triplet(arch: &str, os: &str) -> Option<String> {
    let arch = match arch {
        "x86_64" => "x64",
        "x86" | "i686" | "i386" => "x86",
        "aarch64" => "arm64",
        "arm" => "arm",
        _ => return None,
    };

    let os = match os {
        "windows" => "windows",
        "linux" => "linux",
        "macos" | "darwin" => "osx",
        _ => return None,
    };

    Some(format!("{}-{}", arch, os))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_infer_triplet() {
        assert_eq!(infer_triplet("x86_64", "linux").as_deref(), Some("x64-linux"));
        assert_eq!(infer_triplet("aarch64", "macos").as_deref(), Some("arm64-osx"));
        assert_eq!(infer_triplet("x86", "windows").as_deref(), Some("x86-windows"));
        assert_eq!(infer_triplet("riscv64", "linux"), None);
    }

    #[test]
    fn test_config_wins() {
        let tmp = TempDir::new().unwrap();
        let config = VcpkgConfig {
            enabled: None,
            root: Some(tmp.path().to_path_buf()),
            triplet: Some("x64-mingw-static".to_string()),
        };

        let vcpkg = VcpkgIntegration::from_config(&config).unwrap();
        assert_eq!(vcpkg.root.as_deref(), Some(tmp.path()));
        assert_eq!(vcpkg.triplet, "x64-mingw-static");
        assert!(vcpkg.vcpkg_binary().unwrap().starts_with(tmp.path()));
    }

    #[test]
    fn test_disabled_has_no_root() {
        let config = VcpkgConfig {
            enabled: Some(false),
            root: Some(PathBuf::from("/opt/vcpkg")),
            triplet: Some("x64-linux".to_string()),
        };

        let vcpkg = VcpkgIntegration::from_config(&config).unwrap();
        assert!(vcpkg.root.is_none());
        assert!(vcpkg.vcpkg_binary().is_none());
    }
}
