//! Display targets and the requirements attached to them.

use std::fmt::Write;

use crate::core::build_config::BuildConfig;
use crate::core::target::BuildTarget;

/// Render targets and their requirements as a tree.
///
/// ```text
/// app (binary)
/// ├── rsa: rsa/Cargo.toml [cargo]
/// └── zlib: ports/vcpkg.json [vcpkg]
/// ```
pub fn format_tree(config: &BuildConfig) -> String {
    let mut output = String::new();

    for target in config.targets() {
        output.push_str(&format_target(config, target));
    }

    let unused = config.unused_requirements();
    if !unused.is_empty() {
        let names: Vec<&str> = unused.iter().map(|r| r.name()).collect();
        let _ = writeln!(output, "\nunattached: {}", names.join(", "));
    }

    output
}

/// Render one target and its requirements.
pub fn format_target(config: &BuildConfig, target: &BuildTarget) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{} ({})", target.name(), target.kind());

    let count = target.requirements().len();
    for (i, name) in target.requirements().iter().enumerate() {
        let branch = if i + 1 == count { "└──" } else { "├──" };
        let detail = match config.requirement(name) {
            Some(requirement) => {
                let kind = requirement
                    .manifest_kind()
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                format!("{} [{}]", requirement.manifest_path().display(), kind)
            }
            None => "(not declared)".to_string(),
        };
        let _ = writeln!(output, "{} {}: {}", branch, name, detail);
    }

    output
}
