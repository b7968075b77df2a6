//! `ferry plan` command

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::PlanArgs;
use crate::commands::load_workspace;
use ferry::ops::{plan, PlanOptions};
use ferry::util::fs::write_string;
use ferry::util::GlobalContext;

pub fn execute(args: PlanArgs, ctx: &GlobalContext, manifest_path: Option<PathBuf>) -> Result<()> {
    let ws = load_workspace(ctx, manifest_path, args.release)?;

    let opts = PlanOptions {
        targets: args.target,
        jobs: args.jobs,
    };
    let graph = plan(&ws, &opts)?;
    let json = graph.to_json().context("failed to serialize build graph")?;

    match args.output {
        Some(path) => {
            write_string(&path, &json)?;
            tracing::info!("Wrote build graph to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}
