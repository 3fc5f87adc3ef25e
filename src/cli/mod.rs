//! The Recast Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions. Trees are read and written as JSON.

use clap::Parser;
use miette::Report;
use std::path::Path;
use std::{fs, process};
use termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::EnvFilter;

use crate::ast::AstNode;
use crate::cli::args::{Command, RecastArgs};
use crate::config::EngineConfig;
use crate::{err_msg, RecastError};

pub mod args;
pub mod output;

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "RECAST_LOG";

/// The main entry point for the CLI.
pub fn run() {
    let args = RecastArgs::parse();
    init_tracing(args.verbose);

    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::Apply {
            tree,
            config,
            output,
        } => handle_apply(&tree, config.as_deref(), output.as_deref()),
        Command::Trace { tree, config } => handle_trace(&tree, config.as_deref()),
        Command::ListRules { config } => handle_list_rules(config.as_deref()),
        Command::Check { config } => handle_check(&config),
    };

    if let Err(e) = result {
        eprintln!("{:?}", Report::new(e));
        process::exit(1);
    }
}

/// Installs the stderr subscriber. Returns false when one was already installed.
fn init_tracing(verbose: u8) -> bool {
    let default_directive = match verbose {
        0 => "recast=warn",
        1 => "recast=info",
        2 => "recast=debug",
        _ => "recast=trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        // An embedding host installed its own subscriber first; it stays in charge.
        tracing::debug!(error = %e, "keeping the existing tracing subscriber");
        return false;
    }
    true
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

/// Handles the `apply` subcommand.
fn handle_apply(tree: &Path, config: Option<&Path>, output: Option<&Path>) -> Result<(), RecastError> {
    let engine = load_config(config)?.build_engine()?;
    let outcome = engine.run(&read_tree(tree)?)?;
    tracing::info!(
        rewrites = outcome.trace.len(),
        passes = outcome.passes,
        "rewrite complete"
    );
    let json = outcome.tree.to_json()?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .map_err(|e| err_msg!(Io, "cannot write '{}'", path.display()).caused_by(e)),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

/// Handles the `trace` subcommand.
fn handle_trace(tree: &Path, config: Option<&Path>) -> Result<(), RecastError> {
    let engine = load_config(config)?.build_engine()?;
    let outcome = engine.run(&read_tree(tree)?)?;
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    output::print_trace(&mut stdout, &outcome)?;
    Ok(())
}

/// Handles the `list-rules` subcommand.
fn handle_list_rules(config: Option<&Path>) -> Result<(), RecastError> {
    let registry = load_config(config)?.build_registry()?;
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    output::print_rules(&mut stdout, &registry)?;
    Ok(())
}

/// Handles the `check` subcommand.
fn handle_check(path: &Path) -> Result<(), RecastError> {
    let config = EngineConfig::load(path)?;
    let engine = config.build_engine()?;
    println!(
        "{}: ok ({} rule(s): {})",
        path.display(),
        engine.rules().len(),
        engine.rules().names().join(", ")
    );
    Ok(())
}

// ============================================================================
// HELPERS
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<EngineConfig, RecastError> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

fn read_tree(path: &Path) -> Result<AstNode, RecastError> {
    let text = fs::read_to_string(path)
        .map_err(|e| err_msg!(Io, "cannot read tree '{}'", path.display()).caused_by(e))?;
    AstNode::from_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_tracing_init_keeps_first_subscriber() {
        init_tracing(2);
        assert!(!init_tracing(0));
    }
}
