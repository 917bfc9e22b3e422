//! Functions command implementation

use colored::Colorize;
use serde::Serialize;
use stave_plugins::{CachePolicy, PluginHost};

use crate::error::Result;

#[derive(Serialize)]
struct FunctionEntry<'a> {
    name: &'a str,
    params: &'a [String],
    cache: CachePolicy,
}

/// Run the functions command
pub fn run_functions(host: &PluginHost, json: bool) -> Result<()> {
    let mut entries: Vec<_> = host
        .registry()
        .entries()
        .map(|entry| FunctionEntry {
            name: &entry.name,
            params: &entry.params,
            cache: entry.policy,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(b.name));

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", "Native Functions".bold());
    println!();
    for entry in &entries {
        let bypass = match entry.cache {
            CachePolicy::Memoize => String::new(),
            CachePolicy::Bypass => format!(" {}", "(uncached)".dimmed()),
        };
        println!("  {}({}){}", entry.name.green(), entry.params.join(", "), bypass);
    }
    println!();
    println!("{} {} functions registered.", "Total:".dimmed(), entries.len());
    Ok(())
}
