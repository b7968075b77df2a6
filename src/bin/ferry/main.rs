//! Ferry CLI - bridge foreign package manifests into C/C++ targets

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use miette::{GraphicalReportHandler, GraphicalTheme};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use ferry::core::{BridgeError, ManifestError};
use ferry::util::diagnostic::{emit, ManifestSyntaxError};
use ferry::util::GlobalContext;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli, color) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn report(e: &anyhow::Error, color: bool) {
    // Configuration and resolution errors carry their own suggestions
    if let Some(err) = e.downcast_ref::<BridgeError>() {
        emit(&err.to_diagnostic(), color);
        return;
    }
    if let Some(ManifestError::Syntax(syntax)) = e.downcast_ref::<ManifestError>() {
        render_syntax_error(syntax, color);
        return;
    }
    eprintln!("error: {:#}", e);
}

fn render_syntax_error(err: &ManifestSyntaxError, color: bool) {
    let handler = if color {
        GraphicalReportHandler::new()
    } else {
        GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
    };

    let mut out = String::new();
    match handler.render_report(&mut out, err) {
        Ok(()) => eprint!("{}", out),
        Err(_) => eprintln!("error: {}", err),
    }
}

fn run(cli: Cli, color: bool) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("ferry=debug")
    } else {
        EnvFilter::new("ferry=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut ctx = GlobalContext::new()?;
    ctx.set_color(color);
    let manifest_path = cli.manifest_path;

    // Execute command
    match cli.command {
        Commands::Check(args) => commands::check::execute(args, &ctx, manifest_path),
        Commands::Plan(args) => commands::plan::execute(args, &ctx, manifest_path),
        Commands::Flags(args) => commands::flags::execute(args, &ctx, manifest_path),
        Commands::Tree(args) => commands::tree::execute(args, &ctx, manifest_path),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
