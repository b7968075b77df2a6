//! High-level operations.
//!
//! This module contains the implementation of Ferry commands.

pub mod check;
pub mod finalize;
pub mod flags;
pub mod plan;
pub mod tree;

pub use check::{check, format_report, CheckReport};
pub use finalize::{finalize, FinalizeOptions};
pub use flags::{render_flags, target_flags, FlagKind};
pub use plan::{plan, PlanOptions};
pub use tree::{format_target, format_tree};
