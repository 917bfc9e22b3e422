//! Command implementations for stave-cli

pub mod call;
pub mod emit;
pub mod functions;
pub mod modules;
pub mod plugins;

pub use call::run_call;
pub use emit::run_emit;
pub use functions::run_functions;
pub use modules::run_modules;
pub use plugins::run_plugins;

use stave_fs::NormalizedPath;
use stave_plugins::PluginHost;
use stave_script::ScriptLoader;

use crate::error::Result;

/// Open and initialize the host for `root` with the script loader.
pub fn open_host(root: &NormalizedPath) -> Result<PluginHost> {
    let mut host = PluginHost::open(root, Box::new(ScriptLoader::new()?))?;
    host.initialize()?;
    Ok(host)
}
