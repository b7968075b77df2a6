//! `ferry flags` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::FlagsArgs;
use crate::commands::load_workspace;
use ferry::ops::{target_flags, FlagKind};
use ferry::util::GlobalContext;

pub fn execute(args: FlagsArgs, ctx: &GlobalContext, manifest_path: Option<PathBuf>) -> Result<()> {
    let ws = load_workspace(ctx, manifest_path, args.release)?;

    let kind = if args.compile {
        FlagKind::Compile
    } else if args.link {
        FlagKind::Link
    } else {
        FlagKind::All
    };

    let flags = target_flags(&ws, &args.target, kind)?;
    println!("{}", flags.join(" "));
    Ok(())
}
