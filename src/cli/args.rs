//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::application::Algorithm;

/// Recipe derivation trees: reconstruct, lay out and replay search results
#[derive(Parser, Debug)]
#[command(name = "recipe-tree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Local config file, merged over the global one
    #[arg(short, long, global = true, env = "RECIPE_TREE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the derivation tree of a recipe
    Tree {
        /// Search response JSON
        #[arg(value_hint = ValueHint::FilePath, required_unless_present = "steps", conflicts_with = "steps")]
        response: Option<PathBuf>,

        /// Recipe number within the response (1-based)
        #[arg(short, long, default_value_t = 1)]
        recipe: usize,

        /// Combination given inline, e.g. "Water + Earth => Mud" (repeatable)
        #[arg(short, long = "step", requires = "target")]
        steps: Vec<String>,

        /// Item to derive from inline combinations
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Lay out a recipe as positioned nodes and edges
    Layout {
        /// Search response JSON
        #[arg(value_hint = ValueHint::FilePath)]
        response: PathBuf,

        /// Recipe number within the response (1-based)
        #[arg(short, long, default_value_t = 1)]
        recipe: usize,

        /// Item to highlight (repeatable)
        #[arg(short = 'H', long)]
        highlight: Vec<String>,

        /// Print the frame as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the search snapshots of a response
    Steps {
        /// Search response JSON
        #[arg(value_hint = ValueHint::FilePath)]
        response: PathBuf,

        /// Print the snapshots as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay the search step by step
    Play {
        /// Search response JSON
        #[arg(value_hint = ValueHint::FilePath)]
        response: PathBuf,

        /// Milliseconds between steps (default: playback.delay_ms)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print each frame as one JSON line
        #[arg(long)]
        json: bool,
    },

    /// Validate a search request and print it
    Check {
        /// Item to search for
        target: String,

        /// Search algorithm: bfs, dfs or bidirectional
        #[arg(short, long, default_value = "bfs")]
        algorithm: Algorithm,

        /// Ask for several recipes (1-10)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Recipe catalog JSON; the target must be one of its items
        #[arg(long, value_hint = ValueHint::FilePath)]
        catalog: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Print a commented template config
    Template,
}
