//! `ferry tree` command

use std::path::PathBuf;

use anyhow::Result;

use crate::cli::TreeArgs;
use crate::commands::load_workspace;
use ferry::core::BridgeError;
use ferry::ops::{format_target, format_tree};
use ferry::util::GlobalContext;

pub fn execute(args: TreeArgs, ctx: &GlobalContext, manifest_path: Option<PathBuf>) -> Result<()> {
    let ws = load_workspace(ctx, manifest_path, false)?;
    let config = ws.build_config();

    match &args.target {
        Some(name) => {
            let target = config
                .target(name)
                .ok_or_else(|| BridgeError::UnknownTarget { name: name.clone() })?;
            print!("{}", format_target(config, target));
        }
        None => print!("{}", format_tree(config)),
    }
    Ok(())
}
