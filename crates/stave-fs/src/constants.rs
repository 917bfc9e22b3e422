//! Well-known file and directory names in a Stave project.

use std::path::Path;

/// Fixed names the plugin host looks for or generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPath {
    /// Package manifest (`package.json`)
    Manifest,
    /// Installed dependency tree (`node_modules`)
    NodeModules,
    /// Optional host configuration (`stave.toml`)
    ConfigFile,
    /// Default local extension folder (`modules`)
    LocalModules,
    /// Default generated-artifact directory (`.stave`)
    GeneratedDir,
    /// Aggregator artifact for local extensions (`modules.libsonnet`)
    ModulesArtifact,
    /// Per-plugin wrapper libraries, under the generated directory (`plugins`)
    PluginLibraries,
}

impl ProjectPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "package.json",
            Self::NodeModules => "node_modules",
            Self::ConfigFile => "stave.toml",
            Self::LocalModules => "modules",
            Self::GeneratedDir => ".stave",
            Self::ModulesArtifact => "modules.libsonnet",
            Self::PluginLibraries => "plugins",
        }
    }
}

impl AsRef<Path> for ProjectPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
