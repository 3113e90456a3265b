//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Randomized vignette generator: weighted draws over hierarchical treatment trees
#[derive(Parser, Debug)]
#[command(name = "vignette")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-d, -dd, -ddd)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate vignettes from a treatment tree
    Generate {
        /// Treatment tree JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,

        /// Select several branches per order instead of exactly one
        #[arg(short, long)]
        multiple: bool,

        /// Sampling method: simple or complex
        #[arg(short = 'M', long)]
        method: Option<String>,

        /// Comma-separated selection weights, e.g. 0.7,0.3
        #[arg(short, long)]
        weights: Option<String>,

        /// Output style: text or html
        #[arg(short, long)]
        output: Option<String>,

        /// RNG seed for reproducible draws
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of vignettes to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Emit one JSON record per vignette instead of plain text
        #[arg(short, long)]
        json: bool,
    },

    /// Check a treatment tree and report its shape
    Validate {
        /// Treatment tree JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,
    },

    /// Show the treatment hierarchy as a tree
    Tree {
        /// Treatment tree JSON file
        #[arg(value_hint = ValueHint::FilePath)]
        tree: PathBuf,
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

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init,

    /// Show config paths
    Path,
}
