//! In-memory [`ModuleLoader`] for tests and embedding.
//!
//! Modules are registered against entry paths up front; loading a path that
//! was never registered fails the same way a missing file would.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use stave_fs::NormalizedPath;

use crate::callable::Callable;
use crate::loader::{LoadError, LoadedModule, ModuleExport, ModuleLoader};

/// Builder for an in-memory module.
#[derive(Clone, Default)]
pub struct MemoryModule {
    module: LoadedModule,
}

impl MemoryModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a function whose parameter names are inferred.
    pub fn function(mut self, name: &str, callable: Callable) -> Self {
        self.module.exports.push(ModuleExport {
            name: name.to_string(),
            callable,
            params: None,
        });
        self
    }

    /// Export a function with explicit parameter names.
    pub fn function_with_params(mut self, name: &str, callable: Callable, params: &[&str]) -> Self {
        self.module.exports.push(ModuleExport {
            name: name.to_string(),
            callable,
            params: Some(params.iter().map(|p| p.to_string()).collect()),
        });
        self
    }

    pub fn file_type(mut self, extension: &str, callable: Callable) -> Self {
        self.module
            .metadata
            .file_types
            .push((extension.to_string(), callable));
        self
    }

    pub fn cli_hook(mut self, callable: Callable) -> Self {
        self.module.metadata.cli.push(callable);
        self
    }

    pub fn init_hook(mut self, callable: Callable) -> Self {
        self.module.metadata.init.push(callable);
        self
    }

    /// Merge fields of `context` (a JSON object) into the module's context
    /// block. Non-object values are ignored.
    pub fn context(mut self, context: Value) -> Self {
        if let Value::Object(fields) = context {
            self.module.metadata.context.extend(fields);
        }
        self
    }

    pub fn requires(mut self, identity: &str) -> Self {
        self.module.metadata.requires.push(identity.to_string());
        self
    }

    pub fn build(self) -> LoadedModule {
        self.module
    }
}

enum Slot {
    Module(LoadedModule),
    Broken(String),
}

#[derive(Default)]
struct Inner {
    slots: HashMap<NormalizedPath, Slot>,
    loads: HashMap<NormalizedPath, usize>,
}

/// Loader backed by a path → module table. Clones share the table, so a test
/// can keep a handle for assertions after giving one to a host.
#[derive(Clone, Default)]
pub struct MemoryLoader {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<NormalizedPath>, module: MemoryModule) -> &Self {
        self.inner
            .borrow_mut()
            .slots
            .insert(path.into(), Slot::Module(module.build()));
        self
    }

    /// Make loading `path` fail with `message`.
    pub fn fail(&self, path: impl Into<NormalizedPath>, message: &str) -> &Self {
        self.inner
            .borrow_mut()
            .slots
            .insert(path.into(), Slot::Broken(message.to_string()));
        self
    }

    /// Number of load attempts for `path`.
    pub fn load_count(&self, path: impl Into<NormalizedPath>) -> usize {
        self.inner
            .borrow()
            .loads
            .get(&path.into())
            .copied()
            .unwrap_or(0)
    }
}

impl ModuleLoader for MemoryLoader {
    fn handles(&self, path: &NormalizedPath) -> bool {
        matches!(path.extension(), Some("js" | "cjs"))
    }

    fn load(&mut self, path: &NormalizedPath, namespace: &str) -> Result<LoadedModule, LoadError> {
        let mut inner = self.inner.borrow_mut();
        *inner.loads.entry(path.clone()).or_default() += 1;
        tracing::trace!(path = %path, namespace, "loading in-memory module");
        match inner.slots.get(path) {
            Some(Slot::Module(module)) => Ok(module.clone()),
            Some(Slot::Broken(message)) => Err(LoadError::new(message.clone())),
            None => Err(LoadError::new(format!("cannot find module '{path}'"))),
        }
    }
}
