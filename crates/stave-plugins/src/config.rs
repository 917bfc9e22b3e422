//! Host configuration (`stave.toml`).
//!
//! ```toml
//! [modules]
//! dir = "modules"
//!
//! [generated]
//! dir = ".stave"
//!
//! [walk]
//! dev_dependencies = true
//!
//! [cache]
//! enabled = true
//! bypass = ["clock:*", "local_utils_now"]
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use stave_fs::{ConfigStore, NormalizedPath, ProjectPath};

use crate::registry::CachePolicy;
use crate::{Error, Result};

fn default_modules_dir() -> String {
    ProjectPath::LocalModules.as_str().to_string()
}

fn default_generated_dir() -> String {
    ProjectPath::GeneratedDir.as_str().to_string()
}

fn default_true() -> bool {
    true
}

/// Local extension folder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesSection {
    /// Folder of ad-hoc scripts, relative to the project root
    #[serde(default = "default_modules_dir")]
    pub dir: String,
}

impl Default for ModulesSection {
    fn default() -> Self {
        Self {
            dir: default_modules_dir(),
        }
    }
}

/// Generated artifact settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratedSection {
    /// Output directory for generated libraries, also the engine import path
    #[serde(default = "default_generated_dir")]
    pub dir: String,
}

impl Default for GeneratedSection {
    fn default() -> Self {
        Self {
            dir: default_generated_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalkSection {
    /// Whether the root manifest's `devDependencies` are walked
    #[serde(default = "default_true")]
    pub dev_dependencies: bool,
}

impl Default for WalkSection {
    fn default() -> Self {
        Self {
            dev_dependencies: true,
        }
    }
}

/// Memoization settings for native functions.
///
/// `bypass` entries are exact qualified names, or prefixes ending in `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub bypass: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bypass: Vec::new(),
        }
    }
}

impl CacheConfig {
    /// Cache policy for a qualified function name.
    pub fn policy_for(&self, qualified_name: &str) -> CachePolicy {
        if !self.enabled {
            return CachePolicy::Bypass;
        }
        let bypassed = self.bypass.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => qualified_name.starts_with(prefix),
            None => pattern == qualified_name,
        });
        if bypassed {
            CachePolicy::Bypass
        } else {
            CachePolicy::Memoize
        }
    }
}

/// Complete host configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    #[serde(default)]
    pub modules: ModulesSection,
    #[serde(default)]
    pub generated: GeneratedSection,
    #[serde(default)]
    pub walk: WalkSection,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl HostConfig {
    /// Load `stave.toml` from `root`, or defaults when it is absent.
    pub fn load(root: &NormalizedPath) -> Result<Self> {
        let path = root.join(ProjectPath::ConfigFile.as_str());
        let config: Self = ConfigStore::new().load_or_default(&path)?;
        config.validate()?;
        Ok(config)
    }

    /// The generated directory is cleaned on every run, so it must be a
    /// subdirectory of the project.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::InvalidConfig {
                key: "generated.dir".to_string(),
                message: format!("'{}' {message}", self.generated.dir),
            })
        };
        let path = Path::new(&self.generated.dir);
        let mut depth = 0usize;
        for component in path.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return invalid("escapes the project root");
                    }
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return invalid("must be relative to the project root");
                }
            }
        }
        if depth == 0 {
            return invalid("must name a directory below the project root");
        }
        Ok(())
    }

    pub fn modules_dir(&self, root: &NormalizedPath) -> NormalizedPath {
        root.join(&self.modules.dir)
    }

    pub fn generated_dir(&self, root: &NormalizedPath) -> NormalizedPath {
        root.join(&self.generated.dir)
    }

    /// Path of the local-extension aggregator artifact.
    pub fn modules_artifact(&self, root: &NormalizedPath) -> NormalizedPath {
        self.generated_dir(root)
            .join(ProjectPath::ModulesArtifact.as_str())
    }

    pub fn plugin_libraries_dir(&self, root: &NormalizedPath) -> NormalizedPath {
        self.generated_dir(root)
            .join(ProjectPath::PluginLibraries.as_str())
    }
}
