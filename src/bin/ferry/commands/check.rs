//! `ferry check` command

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::cli::CheckArgs;
use crate::commands::load_workspace;
use ferry::ops::{check, format_report};
use ferry::util::GlobalContext;

pub fn execute(args: CheckArgs, ctx: &GlobalContext, manifest_path: Option<PathBuf>) -> Result<()> {
    let ws = load_workspace(ctx, manifest_path, false)?;
    let report = check(&ws)?;

    eprint!("{}", format_report(&report, ctx.color()));

    if args.deny_warnings && !report.warnings.is_empty() {
        bail!("{} warning(s) denied", report.warnings.len());
    }
    Ok(())
}
