//! Defines the command-line arguments and subcommands for the Recast CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "recast",
    version,
    about = "Rule-based, type-aware rewriting of annotated syntax trees."
)]
pub struct RecastArgs {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RECAST_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite a tree and print the result as JSON.
    Apply {
        /// The path to the JSON-serialized tree.
        #[arg(required = true)]
        tree: PathBuf,
        /// Engine configuration (YAML, or JSON by extension).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the rewritten tree here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show every rewrite applied to a tree, with diffs.
    Trace {
        /// The path to the JSON-serialized tree.
        #[arg(required = true)]
        tree: PathBuf,
        /// Engine configuration (YAML, or JSON by extension).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List all available rules with their alternatives.
    ListRules {
        /// Engine configuration whose definitions should be listed too.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration: its definitions, selection and traversal settings.
    Check {
        /// The configuration file to check.
        #[arg(required = true)]
        config: PathBuf,
    },
}
