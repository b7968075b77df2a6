//! Configuration and resolution error types.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error raised while declaring, binding, or resolving requirements.
///
/// Every variant names the requirement and/or target it concerns.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("requirement `{name}` is already declared")]
    DuplicateRequirement { name: String },

    #[error("target `{name}` is already defined")]
    DuplicateTarget { name: String },

    #[error("target `{target}` has unsupported kind `{kind}`")]
    UnsupportedKind { target: String, kind: String },

    #[error("target `{target}` has no sources")]
    NoSources { target: String },

    #[error("target `{target}` requires `{name}`, which is not declared")]
    UnknownRequirement { target: String, name: String },

    #[error("requirement `{name}`: cannot read manifest {}: {reason}", path.display())]
    ManifestUnreadable {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("requirement `{name}` failed to resolve: {cause:#}")]
    ResolutionFailed {
        name: String,
        cause: Arc<anyhow::Error>,
    },

    #[error("{what} name must not be empty")]
    EmptyName { what: &'static str },

    #[error("requirement `{requirement}`: invalid option `{key}`: {reason}")]
    InvalidOption {
        requirement: String,
        key: String,
        reason: String,
    },

    #[error("target `{name}` is not defined")]
    UnknownTarget { name: String },

    #[error("target `{target}`: source `{}` does not exist", path.display())]
    SourceNotFound { target: String, path: PathBuf },
}

impl BridgeError {
    /// Build a `ResolutionFailed` from any error.
    pub fn resolution_failed(name: impl Into<String>, cause: anyhow::Error) -> Self {
        BridgeError::ResolutionFailed {
            name: name.into(),
            cause: Arc::new(cause),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            BridgeError::DuplicateRequirement { name } => diag
                .with_suggestion(format!("Remove or rename the second `[requires.{}]`", name)),

            BridgeError::DuplicateTarget { name } => {
                diag.with_suggestion(format!("Remove or rename the second `[targets.{}]`", name))
            }

            BridgeError::UnsupportedKind { .. } => diag
                .with_context("supported kinds: binary, staticLibrary, sharedLibrary")
                .with_suggestion("Use one of the supported target kinds"),

            BridgeError::NoSources { .. } => diag
                .with_suggestion("List at least one source file in `sources`")
                .with_suggestion("Check that glob patterns match existing files"),

            BridgeError::UnknownRequirement { name, .. } => diag
                .with_suggestion(format!("Declare `[requires.{}]`", name))
                .with_suggestion(suggestions::REQUIREMENT_NOT_FOUND),

            BridgeError::ManifestUnreadable { path, .. } => diag
                .with_location(path.clone())
                .with_suggestion("Check the `manifest` path of the requirement"),

            BridgeError::ResolutionFailed { .. } => {
                diag.with_suggestion(suggestions::RESOLUTION_FAILED)
            }

            BridgeError::EmptyName { .. } => diag,

            BridgeError::InvalidOption { .. } => diag.with_context(
                "recognized options: kind, features, default-features, profile, target, \
                 linkage, libs, build",
            ),

            BridgeError::UnknownTarget { .. } => {
                diag.with_suggestion(suggestions::TARGET_NOT_FOUND)
            }

            BridgeError::SourceNotFound { path, .. } => diag.with_location(path.clone()),
        }
    }
}
