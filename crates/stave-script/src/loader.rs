//! [`ModuleLoader`] implementation backed by [`ScriptRuntime`].

use std::rc::Rc;

use serde::Deserialize;
use stave_fs::{NormalizedPath, io};
use stave_plugins::{
    Callable, ContextObject, LoadError, LoadedModule, ModuleExport, ModuleLoader, ModuleMetadata,
};

use crate::error::Result;
use crate::function::{ScriptFunction, js_string};
use crate::runtime::ScriptRuntime;

#[derive(Deserialize)]
struct FunctionDescriptor {
    key: String,
    source: String,
    length: usize,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    params: Option<Vec<String>>,
    #[serde(default)]
    extension: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MetadataDescriptor {
    file_types: Vec<FunctionDescriptor>,
    cli: Vec<FunctionDescriptor>,
    init: Vec<FunctionDescriptor>,
    context: ContextObject,
    requires: Vec<String>,
}

#[derive(Deserialize)]
struct ModuleDescriptor {
    exports: Vec<FunctionDescriptor>,
    #[serde(default)]
    metadata: MetadataDescriptor,
}

/// Loads `.js` and `.cjs` entry modules into a shared [`ScriptRuntime`].
///
/// Modules see `module`, `exports`, `__filename` and `__dirname`. `require`
/// is present but throws: extensions cannot load other modules.
///
/// # Example
///
/// ```rust,no_run
/// use stave_plugins::PluginHost;
/// use stave_script::ScriptLoader;
///
/// let loader = ScriptLoader::new()?;
/// let mut host = PluginHost::open(&".".into(), Box::new(loader))?;
/// host.initialize()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ScriptLoader {
    runtime: Rc<ScriptRuntime>,
    next_id: usize,
}

impl ScriptLoader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            runtime: Rc::new(ScriptRuntime::new()?),
            next_id: 0,
        })
    }

    pub fn runtime(&self) -> &Rc<ScriptRuntime> {
        &self.runtime
    }

    fn callable(&self, descriptor: FunctionDescriptor) -> Callable {
        Rc::new(ScriptFunction::new(
            Rc::clone(&self.runtime),
            descriptor.key,
            descriptor.source,
            descriptor.length,
        ))
    }

    fn module(&self, descriptor: ModuleDescriptor) -> LoadedModule {
        let exports = descriptor
            .exports
            .into_iter()
            .map(|mut export| ModuleExport {
                name: export.name.take().unwrap_or_default(),
                params: export.params.take(),
                callable: self.callable(export),
            })
            .collect();

        let meta = descriptor.metadata;
        let file_types = meta
            .file_types
            .into_iter()
            .map(|mut handler| {
                let extension = handler.extension.take().unwrap_or_default();
                (extension, self.callable(handler))
            })
            .collect();
        LoadedModule {
            exports,
            metadata: ModuleMetadata {
                file_types,
                cli: meta.cli.into_iter().map(|d| self.callable(d)).collect(),
                init: meta.init.into_iter().map(|d| self.callable(d)).collect(),
                context: meta.context,
                requires: meta.requires,
            },
        }
    }
}

impl ModuleLoader for ScriptLoader {
    fn handles(&self, path: &NormalizedPath) -> bool {
        matches!(path.extension(), Some("js" | "cjs"))
    }

    fn load(&mut self, path: &NormalizedPath, namespace: &str) -> std::result::Result<LoadedModule, LoadError> {
        let source = io::read_text(path).map_err(|e| LoadError::new(e.to_string()))?;
        let dirname = path.parent().map(|p| p.as_str().to_string()).unwrap_or_default();
        let module_id = format!("{namespace}@{}", self.next_id);
        self.next_id += 1;

        let code = format!(
            "__staveRegister({}, (function (module, exports, require, __filename, __dirname) {{\n{source}\n}}), {}, {})",
            js_string(&module_id),
            js_string(path.as_str()),
            js_string(&dirname),
        );
        let descriptor: ModuleDescriptor = self
            .runtime
            .eval_json(&code)
            .map_err(|e| LoadError::new(e.to_string()))?;

        tracing::debug!(
            path = %path,
            namespace,
            exports = descriptor.exports.len(),
            "evaluated script module"
        );
        Ok(self.module(descriptor))
    }
}
