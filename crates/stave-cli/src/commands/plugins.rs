//! Plugins command implementation

use colored::Colorize;
use serde::Serialize;
use stave_plugins::{PluginHost, PluginRecord, SkipReason};

use crate::error::Result;

#[derive(Serialize)]
struct SkippedEntry<'a> {
    dependency: &'a str,
    declared_by: &'a str,
    #[serde(flatten)]
    reason: &'a SkipReason,
}

#[derive(Serialize)]
struct PluginsReport<'a> {
    plugins: Vec<&'a PluginRecord>,
    skipped: Vec<SkippedEntry<'a>>,
}

/// Run the plugins command
pub fn run_plugins(host: &PluginHost, json: bool) -> Result<()> {
    let skipped: Vec<_> = host
        .report()
        .skipped()
        .filter(|(_, reason)| **reason != SkipReason::NotAnExtension)
        .map(|(node, reason)| SkippedEntry {
            dependency: &node.dependency,
            declared_by: &node.declared_by,
            reason,
        })
        .collect();

    if json {
        let report = PluginsReport {
            plugins: host.plugins().loaded().collect(),
            skipped,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Plugins".bold());
    println!();
    let mut count = 0;
    for plugin in host.plugins().loaded() {
        count += 1;
        println!(
            "  {:<24} {} functions ({})",
            plugin.identity.green(),
            plugin.functions.len(),
            plugin.entry.as_str().dimmed()
        );
        if !plugin.requires.is_empty() {
            println!("  {:<24} requires {}", "", plugin.requires.join(", ").cyan());
        }
    }
    if count == 0 {
        println!("  {}", "None".dimmed());
    }

    if !skipped.is_empty() {
        println!();
        println!("{}:", "Skipped".yellow().bold());
        for entry in &skipped {
            println!(
                "  {:<24} {} (declared by {})",
                entry.dependency.yellow(),
                entry.reason,
                entry.declared_by.dimmed()
            );
        }
    }
    Ok(())
}
