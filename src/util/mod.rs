//! Shared utilities

pub mod config;
pub mod context;
pub mod diagnostic;
pub mod fs;
pub mod hash;
pub mod process;
pub mod vcpkg;

pub use config::Config;
pub use context::GlobalContext;
pub use diagnostic::Diagnostic;
pub use vcpkg::VcpkgIntegration;
