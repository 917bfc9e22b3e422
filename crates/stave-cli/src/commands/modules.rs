//! Modules command implementation

use colored::Colorize;
use stave_plugins::PluginHost;

use crate::error::Result;

/// Run the modules command. The aggregator was regenerated when the host
/// initialized.
pub fn run_modules(host: &PluginHost) -> Result<()> {
    let artifact = host.config().modules_artifact(host.root());

    println!("{}", "Local Modules".bold());
    println!();
    if host.local_modules().is_empty() && host.skipped_local_modules().is_empty() {
        println!(
            "  {} (add scripts to {})",
            "None".dimmed(),
            host.config().modules_dir(host.root()).as_str().cyan()
        );
        return Ok(());
    }

    for module in host.local_modules() {
        println!("  {} ({})", module.namespace.green(), module.path.as_str().dimmed());
        for function in &module.functions {
            println!(
                "    {}({}) -> {}",
                function.name,
                function.params.join(", "),
                function.qualified.cyan()
            );
        }
    }
    for skipped in host.skipped_local_modules() {
        println!(
            "  {} {} ({})",
            skipped.namespace.yellow(),
            "skipped".yellow(),
            skipped.error.dimmed()
        );
    }
    println!();
    println!("{}: {}", "Aggregator".dimmed(), artifact.as_str());
    Ok(())
}
