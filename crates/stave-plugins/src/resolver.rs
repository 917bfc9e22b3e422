//! Directory-anchored dependency resolution.
//!
//! A dependency declared by a manifest is looked up in `node_modules` next to
//! that manifest first, then in each ancestor directory, the same way Node
//! resolves packages. Directories that are themselves named `node_modules`
//! are skipped, since `node_modules/node_modules` is never a valid location.

use stave_fs::{NormalizedPath, ProjectPath};
use stave_manifest::{ManifestReader, ManifestRecord, validate_package_name};

use crate::error::{Error, Result};

/// A dependency located on disk, with its manifest parsed.
#[derive(Debug, Clone)]
pub struct ResolvedDependency {
    /// The name it was declared under.
    pub name: String,
    pub package_dir: NormalizedPath,
    /// Canonical path of the dependency's `package.json`.
    pub manifest_path: NormalizedPath,
    pub manifest: ManifestRecord,
    /// `main`, or `index.js`, inside `package_dir`.
    pub entry_path: NormalizedPath,
}

impl ResolvedDependency {
    /// Identity used for the plugin table: the manifest's own name.
    pub fn identity(&self) -> &str {
        &self.manifest.name
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyResolver {
    reader: ManifestReader,
}

impl DependencyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical manifest path of `name` as seen from `anchor`. Names that
    /// are not valid package names are rejected before touching the disk.
    pub fn locate(&self, name: &str, anchor: &NormalizedPath) -> Result<NormalizedPath> {
        validate_package_name(name)?;
        let mut current = Some(anchor.clone());
        while let Some(dir) = current {
            if dir.file_name() != Some(ProjectPath::NodeModules.as_str()) {
                let candidate = dir
                    .join(ProjectPath::NodeModules.as_str())
                    .join(name)
                    .join(ProjectPath::Manifest.as_str());
                if candidate.is_file() {
                    return Ok(candidate.canonicalize()?);
                }
            }
            current = dir.parent();
        }
        Err(Error::DependencyNotFound {
            name: name.to_string(),
            anchor: anchor.clone(),
        })
    }

    /// Locate `name` from `anchor` and read its manifest.
    pub fn resolve(&self, name: &str, anchor: &NormalizedPath) -> Result<ResolvedDependency> {
        let manifest_path = self.locate(name, anchor)?;
        self.read(name, manifest_path)
    }

    /// Read an already located manifest.
    pub fn read(&self, name: &str, manifest_path: NormalizedPath) -> Result<ResolvedDependency> {
        let manifest = self.reader.read(&manifest_path)?;
        let package_dir = manifest_path
            .parent()
            .ok_or_else(|| Error::DependencyNotFound {
                name: name.to_string(),
                anchor: manifest_path.clone(),
            })?;
        let entry_path = manifest.entry_path(&package_dir);
        tracing::trace!(dependency = name, manifest = %manifest_path, "resolved dependency");
        Ok(ResolvedDependency {
            name: name.to_string(),
            package_dir,
            manifest_path,
            manifest,
            entry_path,
        })
    }
}
