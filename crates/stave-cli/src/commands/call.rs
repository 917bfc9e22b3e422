//! Call command implementation

use serde_json::Value;
use stave_plugins::PluginHost;

use crate::error::{CliError, Result};

/// Run the call command
pub fn run_call(host: &mut PluginHost, name: &str, args: &[String]) -> Result<()> {
    if host.registry().get(name).is_none() {
        return Err(CliError::user(format!(
            "unknown function '{name}' (run `stave functions` to list them)"
        )));
    }
    host.run_init_hooks()?;

    let args: Vec<Value> = args.iter().map(|arg| parse_arg(arg)).collect();
    let result = host.invoke(name, &args)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// JSON if it parses, otherwise the raw string.
fn parse_arg(arg: &str) -> Value {
    serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string()))
}
