//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Stave - Discover project extensions and bridge them into configuration
/// templates
#[derive(Parser, Debug)]
#[command(name = "stave")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, env = "STAVE_ROOT")]
    pub root: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List discovered plugins and skipped dependencies
    Plugins {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List every registered native function
    Functions {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List local modules and regenerate their aggregator
    Modules,

    /// Call a registered function
    ///
    /// Arguments are parsed as JSON; anything that is not valid JSON is
    /// passed as a string.
    ///
    /// Examples:
    ///   stave call local_utils_add 2 3
    ///   stave call dns:lookup example.org
    Call {
        /// Qualified function name (e.g. `dns:lookup` or `local_utils_add`)
        name: String,

        /// Arguments
        args: Vec<String>,
    },

    /// Write an evaluated output tree to disk
    ///
    /// The tree is a JSON object mapping file names to values. Each value
    /// is serialized by the handler registered for its extension.
    Emit {
        /// JSON file holding the output tree
        tree: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
}

impl Commands {
    /// Name passed to CLI hooks.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Plugins { .. } => "plugins",
            Self::Functions { .. } => "functions",
            Self::Modules => "modules",
            Self::Call { .. } => "call",
            Self::Emit { .. } => "emit",
        }
    }

    /// Positional arguments passed to CLI hooks.
    pub fn hook_args(&self) -> Vec<String> {
        match self {
            Self::Call { name, args } => std::iter::once(name.clone()).chain(args.iter().cloned()).collect(),
            Self::Emit { tree, out } => vec![tree.display().to_string(), out.display().to_string()],
            _ => Vec::new(),
        }
    }
}
