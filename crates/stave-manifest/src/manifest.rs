//! `package.json` parsing.
//!
//! Only the fields the plugin host needs are modelled; everything else in a
//! manifest is ignored.
//!
//! # Example
//!
//! ```json
//! {
//!   "name": "@acme/stave-k8s",
//!   "version": "1.2.0",
//!   "main": "lib/index.js",
//!   "dependencies": { "@acme/stave-base": "^1.0.0" },
//!   "stave": {
//!     "requires": ["@acme/stave-base"],
//!     "libraryFile": "lib/k8s.libsonnet",
//!     "context": { "cluster": "prod" }
//!   }
//! }
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stave_fs::{NormalizedPath, io};

use crate::dependencies::DependencyList;
use crate::error::{Error, Result};
use crate::{DEFAULT_ENTRY, EXTENSION_KEY};

/// One parsed `package.json`. Immutable once read.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ManifestRecord {
    /// Package identity. May be empty for an unpublished root project.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Entry point relative to the package directory.
    #[serde(default)]
    pub main: Option<String>,
    #[serde(default)]
    pub dependencies: DependencyList,
    /// Only consulted for the root manifest.
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: DependencyList,
    /// Present only when the package is a Stave extension.
    #[serde(default, rename = "stave")]
    pub extension: Option<ExtensionMetadata>,
}

/// The extension marker block of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionMetadata {
    /// Plugin identities that must also be loaded.
    #[serde(default)]
    pub requires: Vec<String>,
    /// Companion Jsonnet library, relative to the package directory.
    #[serde(default)]
    pub library_file: Option<String>,
    /// Fields merged into the shared evaluation context.
    #[serde(default)]
    pub context: Map<String, Value>,
    /// Any other metadata, kept for extensions that read their own manifest.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestRecord {
    pub fn is_extension(&self) -> bool {
        self.extension.is_some()
    }

    /// The entry file inside `package_dir`, defaulting to `index.js`.
    pub fn entry_path(&self, package_dir: &NormalizedPath) -> NormalizedPath {
        let main = self.main.as_deref().unwrap_or(DEFAULT_ENTRY);
        package_dir.join(main.trim_start_matches("./"))
    }

    /// The companion library file inside `package_dir`, if declared.
    pub fn library_path(&self, package_dir: &NormalizedPath) -> Option<NormalizedPath> {
        self.extension
            .as_ref()
            .and_then(|ext| ext.library_file.as_deref())
            .map(|file| package_dir.join(file.trim_start_matches("./")))
    }

    fn validate(&self) -> Result<()> {
        if !self.name.is_empty() {
            validate_package_name(&self.name)?;
        }

        let Some(extension) = &self.extension else {
            return Ok(());
        };
        if self.name.is_empty() {
            return Err(Error::InvalidName {
                name: String::new(),
                reason: format!("a package with a \"{EXTENSION_KEY}\" block must have a name"),
            });
        }
        if let Some(main) = &self.main {
            ensure_confined(&self.name, "main", main)?;
        }
        if let Some(library) = &extension.library_file {
            ensure_confined(&self.name, "libraryFile", library)?;
        }
        for required in &extension.requires {
            validate_package_name(required)?;
        }
        Ok(())
    }
}

/// Reads manifests from disk or from strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManifestReader;

impl ManifestReader {
    pub fn new() -> Self {
        Self
    }

    /// Read and validate the manifest at `path`.
    pub fn read(&self, path: &NormalizedPath) -> Result<ManifestRecord> {
        if !path.is_file() {
            return Err(Error::ManifestNotFound(path.to_native()));
        }
        let content = io::read_text(path)?;
        let record = Self::parse(&content).map_err(|e| match e {
            Error::ManifestParse { source, .. } => Error::ManifestParse {
                path: path.to_native(),
                source,
            },
            other => other,
        })?;
        tracing::trace!(path = %path, name = %record.name, "read manifest");
        Ok(record)
    }

    /// Parse and validate manifest JSON.
    pub fn parse(content: &str) -> Result<ManifestRecord> {
        let record: ManifestRecord =
            serde_json::from_str(content).map_err(|source| Error::ManifestParse {
                path: Default::default(),
                source,
            })?;
        record.validate()?;
        Ok(record)
    }
}

/// npm-style package names: optional `@scope/`, then lowercase-ish URL-safe
/// characters.
pub fn validate_package_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let bare = match name.strip_prefix('@') {
        Some(scoped) => {
            let (scope, rest) = scoped
                .split_once('/')
                .ok_or_else(|| invalid("scoped names must look like @scope/name"))?;
            if scope.is_empty() || !scope.chars().all(is_name_char) {
                return Err(invalid("scope contains invalid characters"));
            }
            rest
        }
        None => name,
    };

    if bare.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if bare.starts_with('.') || bare.starts_with('_') {
        return Err(invalid("name must not start with '.' or '_'"));
    }
    if !bare.chars().all(is_name_char) {
        return Err(invalid(
            "name may contain only letters, digits, '-', '_', '.' and '~'",
        ));
    }
    Ok(())
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

fn ensure_confined(package: &str, field: &'static str, value: &str) -> Result<()> {
    let path = Path::new(value);
    let escapes = path.has_root()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(Error::InvalidPath {
            package: package.to_string(),
            field,
            path: value.to_string(),
        });
    }
    Ok(())
}
