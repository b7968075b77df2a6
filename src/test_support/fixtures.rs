//! Test fixtures for common project layouts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Fixture for a project directory: a `Ferry.toml` plus arbitrary files.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Ferry.toml content.
    pub manifest: String,
    /// Other files (path relative to project root -> content).
    pub files: BTreeMap<PathBuf, String>,
}

impl ProjectFixture {
    /// Create a project with the given Ferry.toml.
    pub fn new(manifest: impl Into<String>) -> Self {
        ProjectFixture {
            manifest: manifest.into(),
            files: BTreeMap::new(),
        }
    }

    /// A binary `app` built from `src/main.c` that requires one staticlib
    /// crate under `<requirement>/`.
    pub fn binary_with_crate(requirement: &str) -> Self {
        let manifest = format!(
            r#"[project]
name = "app"

[requires.{requirement}]
manifest = "{requirement}/Cargo.toml"
options = {{ build = false }}

[targets.app]
kind = "binary"
sources = ["src/main.c"]
requires = ["{requirement}"]
"#
        );

        ProjectFixture::new(manifest)
            .with_file("src/main.c", "int main(void) { return 0; }\n")
            .with_file(
                format!("{}/Cargo.toml", requirement),
                cargo::staticlib(requirement),
            )
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write the fixture to disk. Returns the path of the Ferry.toml.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(base_path)?;
        let manifest_path = base_path.join("Ferry.toml");
        std::fs::write(&manifest_path, &self.manifest)?;

        for (path, content) in &self.files {
            let full = base_path.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full, content)?;
        }

        Ok(manifest_path)
    }
}

/// Cargo manifests for C-compatible crates.
pub mod cargo {
    /// A crate building a static library.
    pub fn staticlib(name: &str) -> String {
        format!(
            r#"[package]
name = "{name}"
version = "0.1.0"
edition = "2021"

[lib]
crate-type = ["staticlib"]
"#
        )
    }

    /// A crate building a shared library.
    pub fn cdylib(name: &str) -> String {
        format!(
            r#"[package]
name = "{name}"
version = "0.1.0"
edition = "2021"

[lib]
crate-type = ["cdylib"]
"#
        )
    }
}
