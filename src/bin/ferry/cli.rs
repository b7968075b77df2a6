//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Ferry - bridge foreign package manifests into C/C++ build targets
#[derive(Parser)]
#[command(name = "ferry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to Ferry.toml (defaults to searching upward from the current directory)
    #[arg(long, global = true, env = "FERRY_MANIFEST_PATH")]
    pub manifest_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate Ferry.toml without resolving anything
    Check(CheckArgs),

    /// Resolve requirements and print the build graph as JSON
    Plan(PlanArgs),

    /// Show compile/link flags for a target
    Flags(FlagsArgs),

    /// Display targets and their requirements
    Tree(TreeArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Specific targets to plan
    #[arg(long)]
    pub target: Vec<String>,

    /// Resolve every requirement with the release profile
    #[arg(short, long)]
    pub release: bool,

    /// Number of parallel resolutions
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Write the graph to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct FlagsArgs {
    /// Target to show flags for
    pub target: String,

    /// Show compile flags only
    #[arg(long, conflicts_with = "link")]
    pub compile: bool,

    /// Show link flags only
    #[arg(long)]
    pub link: bool,

    /// Resolve every requirement with the release profile
    #[arg(short, long)]
    pub release: bool,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Only show this target
    pub target: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
