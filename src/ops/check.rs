//! Configuration checks that do not resolve anything.
//!
//! `ferry check` loads `Ferry.toml` (which surfaces every declaration-time
//! error), then verifies that attached names are declared. Problems that
//! would not fail a build are reported as warnings.

use std::fmt::Write;

use crate::core::errors::BridgeError;
use crate::core::workspace::Workspace;
use crate::util::diagnostic::Diagnostic;

/// Result of checking a workspace.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Project name
    pub project: String,
    /// Number of declared requirements
    pub requirements: usize,
    /// Number of defined targets
    pub targets: usize,
    /// Non-fatal findings
    pub warnings: Vec<Diagnostic>,
}

/// Validate a workspace without running any resolver.
pub fn check(ws: &Workspace) -> Result<CheckReport, BridgeError> {
    let config = ws.build_config();
    config.validate()?;

    let mut warnings = Vec::new();
    for requirement in config.unused_requirements() {
        warnings.push(
            Diagnostic::warning(format!(
                "requirement `{}` is not attached to any target",
                requirement.name()
            ))
            .with_suggestion("Add it to a target's `requires` list or remove it"),
        );
    }

    for requirement in config.requirements() {
        if requirement.manifest_kind().is_none() {
            warnings.push(
                Diagnostic::warning(format!(
                    "requirement `{}`: cannot tell the manifest format of {}",
                    requirement.name(),
                    requirement.manifest_path().display()
                ))
                .with_suggestion("Set `options = { kind = \"cargo\" }` or `kind = \"vcpkg\"`"),
            );
        }
    }

    Ok(CheckReport {
        project: ws.name(),
        requirements: config.requirements().len(),
        targets: config.targets().len(),
        warnings,
    })
}

/// Format a check report for display.
pub fn format_report(report: &CheckReport, color: bool) -> String {
    let mut output = String::new();

    for warning in &report.warnings {
        output.push_str(&warning.format(color));
    }

    let _ = writeln!(
        output,
        "{}: {} requirement(s), {} target(s), {} warning(s)",
        report.project,
        report.requirements,
        report.targets,
        report.warnings.len()
    );
    output
}
