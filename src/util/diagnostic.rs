//! User-friendly diagnostic messages.
//!
//! Every error reported to the user carries the requirement or target it
//! concerns, the underlying cause, and a suggested fix.

use std::fmt;
use std::path::PathBuf;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a target is not found.
    pub const TARGET_NOT_FOUND: &str = "help: Run `ferry tree` to see available targets";

    /// Suggestion when a requirement name is not declared.
    pub const REQUIREMENT_NOT_FOUND: &str =
        "help: Declare it under [requires.<name>] with a `manifest` path";

    /// Suggestion when resolution fails.
    pub const RESOLUTION_FAILED: &str = "help: Run `ferry plan --verbose` for more details";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(message)
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = match (color, self.severity) {
            (true, Severity::Error) => "\x1b[1;31merror\x1b[0m",
            (true, Severity::Warning) => "\x1b[1;33mwarning\x1b[0m",
            (false, Severity::Error) => "error",
            (false, Severity::Warning) => "warning",
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Syntax error inside `Ferry.toml`, rendered with the offending span.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("failed to parse {file}: {reason}")]
#[diagnostic(
    code(ferry::manifest::syntax),
    help("Ferry.toml must contain [requires.<name>] and [targets.<name>] tables")
)]
pub struct ManifestSyntaxError {
    pub file: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("{reason}")]
    pub span: Option<SourceSpan>,
    pub reason: String,
}

impl ManifestSyntaxError {
    /// Build from a TOML parse error and the text it was parsed from.
    pub fn from_toml(file: impl Into<String>, contents: &str, err: &toml::de::Error) -> Self {
        let file = file.into();
        ManifestSyntaxError {
            src: NamedSource::new(file.clone(), contents.to_string()),
            span: err.span().map(SourceSpan::from),
            reason: err.message().to_string(),
            file,
        }
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
