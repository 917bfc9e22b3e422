//! Ad-hoc extensions from the project's local modules folder.
//!
//! Every script directly inside the folder becomes a namespace named after
//! its file stem. Its exports are registered as `local_<namespace>_<export>`
//! and exposed to templates through the generated `modules.libsonnet`.

use std::fs;

use serde::Serialize;
use stave_fs::{NormalizedPath, io};

use crate::error::{Error, Result};
use crate::library;
use crate::loader::{ExportSummary, ExtensionState, ModuleLoader};

/// One compiled local module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalModuleRecord {
    pub namespace: String,
    pub path: NormalizedPath,
    pub functions: Vec<ExportSummary>,
    /// Plugins this module declared it needs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
}

/// A local script that failed to load and was left out of the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLocalModule {
    pub namespace: String,
    pub path: NormalizedPath,
    pub error: String,
}

/// Outcome of one compile pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalCompileReport {
    pub modules: Vec<LocalModuleRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedLocalModule>,
}

/// Qualified name of a local export.
pub fn local_function_name(namespace: &str, export: &str) -> String {
    format!("local_{namespace}_{export}")
}

pub struct LocalExtensionCompiler<'a> {
    modules: &'a mut dyn ModuleLoader,
    state: &'a mut ExtensionState,
}

impl<'a> LocalExtensionCompiler<'a> {
    pub fn new(modules: &'a mut dyn ModuleLoader, state: &'a mut ExtensionState) -> Self {
        Self { modules, state }
    }

    /// Load every script in `source_dir` and write the aggregator to
    /// `artifact`. Without a source folder any stale artifact is removed.
    ///
    /// A script that fails to load is logged and skipped; the artifact is
    /// still written for the rest.
    pub fn compile(
        &mut self,
        source_dir: &NormalizedPath,
        artifact: &NormalizedPath,
    ) -> Result<LocalCompileReport> {
        if !source_dir.is_dir() {
            let removed = io::remove_file_if_exists(artifact).map_err(|source| Error::ArtifactWrite {
                path: artifact.clone(),
                source,
            })?;
            if removed {
                tracing::debug!(artifact = %artifact, "removed stale local modules artifact");
            }
            return Ok(LocalCompileReport::default());
        }

        let mut records: Vec<LocalModuleRecord> = Vec::new();
        let mut skipped = Vec::new();
        for path in self.script_files(source_dir)? {
            let Some(namespace) = path.file_stem().map(str::to_string) else {
                continue;
            };
            if let Some(existing) = records.iter().find(|r| r.namespace == namespace) {
                tracing::warn!(
                    namespace = %namespace,
                    path = %path,
                    existing = %existing.path,
                    "local module namespace already taken, skipping"
                );
                continue;
            }
            match self.compile_module(&namespace, &path) {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::warn!(
                        namespace = %namespace,
                        path = %path,
                        error = %error,
                        "failed to load local module, skipping"
                    );
                    skipped.push(SkippedLocalModule {
                        namespace,
                        path,
                        error,
                    });
                }
            }
        }

        let source = library::render_modules_artifact(&records);
        io::write_text(artifact, &source).map_err(|source| Error::ArtifactWrite {
            path: artifact.clone(),
            source,
        })?;
        tracing::info!(
            modules = records.len(),
            skipped = skipped.len(),
            artifact = %artifact,
            "compiled local modules"
        );
        Ok(LocalCompileReport {
            modules: records,
            skipped,
        })
    }

    fn compile_module(
        &mut self,
        namespace: &str,
        path: &NormalizedPath,
    ) -> std::result::Result<LocalModuleRecord, String> {
        let mut module = self.modules.load(path, namespace).map_err(|e| e.message)?;
        let requires = std::mem::take(&mut module.metadata.requires);
        let owner = format!("local_{namespace}");
        let functions = self
            .state
            .absorb(&owner, module, |export| local_function_name(namespace, export))
            .map_err(|e| e.to_string())?;
        tracing::debug!(namespace = %namespace, functions = functions.len(), "loaded local module");
        Ok(LocalModuleRecord {
            namespace: namespace.to_string(),
            path: path.clone(),
            functions,
            requires,
        })
    }

    /// Script files directly inside `dir`, sorted by file name.
    fn script_files(&self, dir: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
        let native = dir.to_native();
        let entries = fs::read_dir(&native).map_err(|e| stave_fs::Error::io(&native, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| stave_fs::Error::io(&native, e))?;
            let path = NormalizedPath::new(entry.path());
            if path.is_file() && self.modules.handles(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}
