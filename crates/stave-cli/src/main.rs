//! Stave CLI
//!
//! Discovers extensions in a project's dependency graph and local modules
//! folder, and exposes what they contribute.

mod cli;
mod commands;
mod error;
mod logging;

use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use stave_fs::NormalizedPath;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(cmd) => {
            let root = project_root(cli.root)?;
            execute_command(&root, cmd)
        }
        None => {
            println!("{} Stave CLI", "stave".green().bold());
            println!();
            println!("Run {} for available commands.", "stave --help".cyan());
            Ok(())
        }
    }
}

fn project_root(root: Option<PathBuf>) -> Result<NormalizedPath> {
    let root = match root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    Ok(NormalizedPath::new(root).canonicalize()?)
}

fn execute_command(root: &NormalizedPath, cmd: Commands) -> Result<()> {
    let mut host = commands::open_host(root)?;
    host.run_cli_hooks(cmd.name(), &cmd.hook_args())?;

    match cmd {
        Commands::Plugins { json } => commands::run_plugins(&host, json),
        Commands::Functions { json } => commands::run_functions(&host, json),
        Commands::Modules => commands::run_modules(&host),
        Commands::Call { name, args } => commands::run_call(&mut host, &name, &args),
        Commands::Emit { tree, out } => commands::run_emit(&mut host, &tree, &out),
    }
}
