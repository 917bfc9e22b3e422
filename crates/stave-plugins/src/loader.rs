//! Loading extension entry modules and absorbing their exports.
//!
//! A [`ModuleLoader`] turns an entry file into a [`LoadedModule`]: a list of
//! exported callables plus the reserved metadata block. [`PluginLoader`]
//! applies that to one dependency of the graph, and [`ExtensionState`] holds
//! everything loaded modules contribute (functions and hooks).

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use stave_fs::NormalizedPath;

use crate::callable::{Callable, ContextObject};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::hooks::{HookTable, merge_context};
use crate::registry::FunctionRegistry;
use crate::resolver::ResolvedDependency;

/// Reserved export holding extension metadata.
pub const METADATA_EXPORT: &str = "__stave__";

/// Error from a [`ModuleLoader`]. The message is shown as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One exported function.
#[derive(Clone)]
pub struct ModuleExport {
    pub name: String,
    pub callable: Callable,
    /// Explicit parameter names, from the `[fn, "p1", ...]` export form.
    pub params: Option<Vec<String>>,
}

/// Contents of the reserved metadata export.
#[derive(Clone, Default)]
pub struct ModuleMetadata {
    /// File extension → handler
    pub file_types: Vec<(String, Callable)>,
    pub cli: Vec<Callable>,
    pub init: Vec<Callable>,
    pub context: ContextObject,
    pub requires: Vec<String>,
}

/// An entry module after evaluation.
#[derive(Clone, Default)]
pub struct LoadedModule {
    pub exports: Vec<ModuleExport>,
    pub metadata: ModuleMetadata,
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exports: Vec<_> = self.exports.iter().map(|e| e.name.as_str()).collect();
        let file_types: Vec<_> = self.metadata.file_types.iter().map(|(ext, _)| ext.as_str()).collect();
        f.debug_struct("LoadedModule")
            .field("exports", &exports)
            .field("file_types", &file_types)
            .field("cli", &self.metadata.cli.len())
            .field("init", &self.metadata.init.len())
            .field("context", &self.metadata.context)
            .field("requires", &self.metadata.requires)
            .finish()
    }
}

/// Evaluates entry files into [`LoadedModule`]s.
pub trait ModuleLoader {
    /// Whether this loader can load `path` (by extension).
    fn handles(&self, path: &NormalizedPath) -> bool;

    /// Load the module at `path`. `namespace` is used for diagnostics only.
    fn load(&mut self, path: &NormalizedPath, namespace: &str) -> std::result::Result<LoadedModule, LoadError>;
}

/// A registered function, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub name: String,
    pub qualified: String,
    pub params: Vec<String>,
}

/// Functions and hooks contributed by everything loaded so far.
#[derive(Debug, Default)]
pub struct ExtensionState {
    pub registry: FunctionRegistry,
    pub hooks: HookTable,
}

impl ExtensionState {
    pub fn new(cache: CacheConfig) -> Self {
        Self {
            registry: FunctionRegistry::new(cache),
            hooks: HookTable::new(),
        }
    }

    /// Register `module`'s exports under names produced by `qualify` and
    /// merge its metadata under `owner`.
    ///
    /// Nothing is registered if any qualified name is already taken.
    pub fn absorb(
        &mut self,
        owner: &str,
        module: LoadedModule,
        qualify: impl Fn(&str) -> String,
    ) -> Result<Vec<ExportSummary>> {
        let qualified: Vec<String> = module.exports.iter().map(|e| qualify(&e.name)).collect();
        for (index, name) in qualified.iter().enumerate() {
            if self.registry.contains(name) || qualified[..index].contains(name) {
                return Err(Error::DuplicateFunction(name.clone()));
            }
        }

        let mut summaries = Vec::with_capacity(module.exports.len());
        for (export, qualified) in module.exports.into_iter().zip(qualified) {
            let entry = self
                .registry
                .register(&qualified, export.callable, export.params)?;
            summaries.push(ExportSummary {
                name: export.name,
                qualified,
                params: entry.params.clone(),
            });
        }

        let metadata = module.metadata;
        for (extension, handler) in metadata.file_types {
            self.hooks.add_file_handler(&extension, owner, handler);
        }
        for hook in metadata.cli {
            self.hooks.add_cli_hook(owner, hook);
        }
        for hook in metadata.init {
            self.hooks.add_init_hook(owner, hook);
        }
        if !metadata.context.is_empty() {
            merge_context(&mut self.registry.context().borrow_mut(), &metadata.context);
        }
        Ok(summaries)
    }
}

/// One plugin known to the host, loaded or not.
#[derive(Debug, Clone, Serialize)]
pub struct PluginRecord {
    pub identity: String,
    pub entry: NormalizedPath,
    pub manifest: NormalizedPath,
    pub requires: Vec<String>,
    pub library: Option<NormalizedPath>,
    pub functions: Vec<ExportSummary>,
    pub loaded: bool,
    /// Why loading failed, when it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Plugin records keyed by identity, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct PluginTable {
    records: Vec<PluginRecord>,
    index: HashMap<String, usize>,
}

impl PluginTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<&PluginRecord> {
        self.index.get(identity).map(|&i| &self.records[i])
    }

    pub fn is_loaded(&self, identity: &str) -> bool {
        self.get(identity).is_some_and(|record| record.loaded)
    }

    /// Insert `record`, replacing any record with the same identity in place.
    pub fn upsert(&mut self, record: PluginRecord) {
        match self.index.get(&record.identity) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.identity.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginRecord> {
        self.records.iter()
    }

    /// Loaded plugins in load order.
    pub fn loaded(&self) -> impl Iterator<Item = &PluginRecord> {
        self.records.iter().filter(|record| record.loaded)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of offering one dependency to the [`PluginLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// A plugin with the same identity is already loaded from `existing`.
    AlreadyLoaded { existing: NormalizedPath },
    Failed(String),
}

/// Loads extension packages into an [`ExtensionState`].
pub struct PluginLoader<'a> {
    modules: &'a mut dyn ModuleLoader,
    state: &'a mut ExtensionState,
    plugins: &'a mut PluginTable,
}

impl<'a> PluginLoader<'a> {
    pub fn new(
        modules: &'a mut dyn ModuleLoader,
        state: &'a mut ExtensionState,
        plugins: &'a mut PluginTable,
    ) -> Self {
        Self {
            modules,
            state,
            plugins,
        }
    }

    /// Load `candidate` as a plugin named after its manifest.
    ///
    /// A plugin that is already loaded is left alone. A failed load is
    /// recorded with `loaded = false` and may be retried by another copy.
    pub fn load(&mut self, candidate: &ResolvedDependency) -> LoadOutcome {
        let identity = candidate.identity().to_string();
        if let Some(existing) = self.plugins.get(&identity).filter(|record| record.loaded) {
            return LoadOutcome::AlreadyLoaded {
                existing: existing.manifest.clone(),
            };
        }

        let extension = candidate.manifest.extension.clone().unwrap_or_default();
        let mut record = PluginRecord {
            identity: identity.clone(),
            entry: candidate.entry_path.clone(),
            manifest: candidate.manifest_path.clone(),
            requires: extension.requires.clone(),
            library: candidate.manifest.library_path(&candidate.package_dir),
            functions: Vec::new(),
            loaded: false,
            error: None,
        };

        match self.load_entry(&identity, candidate, &extension.context) {
            Ok((functions, requires)) => {
                for requirement in requires {
                    if !record.requires.contains(&requirement) {
                        record.requires.push(requirement);
                    }
                }
                tracing::debug!(
                    plugin = %identity,
                    functions = functions.len(),
                    "loaded plugin"
                );
                record.functions = functions;
                record.loaded = true;
                self.plugins.upsert(record);
                LoadOutcome::Loaded
            }
            Err(message) => {
                tracing::warn!(
                    plugin = %identity,
                    entry = %candidate.entry_path,
                    error = %message,
                    "failed to load plugin, skipping"
                );
                record.error = Some(message.clone());
                self.plugins.upsert(record);
                LoadOutcome::Failed(message)
            }
        }
    }

    fn load_entry(
        &mut self,
        identity: &str,
        candidate: &ResolvedDependency,
        manifest_context: &ContextObject,
    ) -> std::result::Result<(Vec<ExportSummary>, Vec<String>), String> {
        let entry = &candidate.entry_path;
        if !self.modules.handles(entry) {
            return Err(format!("no module loader handles entry file {entry}"));
        }
        let mut module = self
            .modules
            .load(entry, identity)
            .map_err(|e| e.message)?;

        // Manifest context goes in first so the module's own block wins.
        let mut context = manifest_context.clone();
        merge_context(&mut context, &module.metadata.context);
        module.metadata.context = context;
        let requires = std::mem::take(&mut module.metadata.requires);

        let functions = self
            .state
            .absorb(identity, module, |name| format!("{identity}:{name}"))
            .map_err(|e| e.to_string())?;
        Ok((functions, requires))
    }
}
