//! Emit command implementation

use std::path::Path;

use colored::Colorize;
use stave_fs::{NormalizedPath, io};
use stave_plugins::PluginHost;

use crate::error::Result;

/// Run the emit command
pub fn run_emit(host: &mut PluginHost, tree: &Path, out: &Path) -> Result<()> {
    let tree_path = NormalizedPath::new(tree);
    let tree = serde_json::from_str(&io::read_text(&tree_path)?)?;
    host.run_init_hooks()?;

    let written = host.output_writer().write_tree(&tree, &NormalizedPath::new(out))?;
    for path in &written {
        println!("  {} {}", "+".green(), path.as_str());
    }
    println!("{} {} files written.", "Total:".dimmed(), written.len());
    Ok(())
}
