//! The plugin host: one instance owns everything discovery produces.

use std::fmt;

use serde_json::{Value, json};
use stave_fs::{NormalizedPath, ProjectPath, io};

use crate::callable::SharedContext;
use crate::config::HostConfig;
use crate::engine::{EvalInput, EvaluationEngine};
use crate::error::{Error, Result};
use crate::hooks::HookTable;
use crate::library;
use crate::loader::{ExtensionState, ModuleLoader, PluginLoader, PluginRecord, PluginTable};
use crate::local::{LocalExtensionCompiler, LocalModuleRecord, SkippedLocalModule};
use crate::registry::FunctionRegistry;
use crate::validator::{RequirementValidator, check_requirements};
use crate::walker::{GraphWalker, WalkReport};
use crate::writer::OutputWriter;

/// Discovers, loads and validates extensions for one project, then exposes
/// them to an evaluation engine.
///
/// Nothing happens until [`initialize`](Self::initialize) (or
/// [`render`](Self::render), which calls it). Initialization runs in a fixed
/// order and stops at the first fatal error:
///
/// 1. walk the dependency graph and load every extension found
/// 2. check cross-plugin requirements
/// 3. regenerate `<generated>/plugins/*.libsonnet`
/// 4. compile the local modules folder into `<generated>/modules.libsonnet`
/// 5. check requirements declared by local modules
///
/// # Example
///
/// ```no_run
/// use stave_fs::NormalizedPath;
/// use stave_plugins::memory::MemoryLoader;
/// use stave_plugins::PluginHost;
///
/// let mut host = PluginHost::open(&NormalizedPath::new("."), Box::new(MemoryLoader::new()))?;
/// host.initialize()?;
/// for plugin in host.plugins().loaded() {
///     println!("{}", plugin.identity);
/// }
/// # Ok::<(), stave_plugins::Error>(())
/// ```
pub struct PluginHost {
    root: NormalizedPath,
    config: HostConfig,
    modules: Box<dyn ModuleLoader>,
    state: ExtensionState,
    plugins: PluginTable,
    report: WalkReport,
    local: Vec<LocalModuleRecord>,
    local_skipped: Vec<SkippedLocalModule>,
    initialized: bool,
    init_hooks_ran: bool,
}

impl PluginHost {
    /// Create a host for the project at `root` with an explicit config.
    pub fn new(root: &NormalizedPath, config: HostConfig, modules: Box<dyn ModuleLoader>) -> Result<Self> {
        let root = root.canonicalize()?;
        config.validate()?;
        Ok(Self {
            state: ExtensionState::new(config.cache.clone()),
            root,
            config,
            modules,
            plugins: PluginTable::new(),
            report: WalkReport::default(),
            local: Vec::new(),
            local_skipped: Vec::new(),
            initialized: false,
            init_hooks_ran: false,
        })
    }

    /// Create a host reading `stave.toml` from `root`, if present.
    pub fn open(root: &NormalizedPath, modules: Box<dyn ModuleLoader>) -> Result<Self> {
        let root = root.canonicalize()?;
        let config = HostConfig::load(&root)?;
        Self::new(&root, config, modules)
    }

    /// Discover and load everything. Calling it again after success does
    /// nothing; after a failure it starts over.
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.state = ExtensionState::new(self.config.cache.clone());
        self.plugins = PluginTable::new();
        self.local.clear();
        self.local_skipped.clear();

        let root_manifest = self.root.join(ProjectPath::Manifest.as_str());
        let loader = PluginLoader::new(self.modules.as_mut(), &mut self.state, &mut self.plugins);
        self.report = GraphWalker::new(loader)
            .dev_dependencies(self.config.walk.dev_dependencies)
            .walk(&root_manifest)?;

        RequirementValidator::new().validate(&self.plugins)?;
        self.write_plugin_libraries()?;

        let modules_dir = self.config.modules_dir(&self.root);
        let artifact = self.config.modules_artifact(&self.root);
        let compiled = LocalExtensionCompiler::new(self.modules.as_mut(), &mut self.state)
            .compile(&modules_dir, &artifact)?;
        self.local = compiled.modules;
        self.local_skipped = compiled.skipped;
        for module in &self.local {
            check_requirements(&format!("local_{}", module.namespace), &module.requires, &self.plugins)?;
        }

        self.initialized = true;
        tracing::info!(
            plugins = self.plugins.loaded().count(),
            local_modules = self.local.len(),
            functions = self.state.registry.len(),
            "plugin host initialized"
        );
        Ok(())
    }

    fn write_plugin_libraries(&self) -> Result<()> {
        let dir = self.config.plugin_libraries_dir(&self.root);
        remove_stale_libraries(&dir)?;

        for plugin in self.plugins.loaded() {
            let library = plugin.library.as_ref().filter(|path| {
                let exists = path.is_file();
                if !exists {
                    tracing::warn!(plugin = %plugin.identity, library = %path, "declared library file is missing");
                }
                exists
            });
            let source = library::render_plugin_library(
                &plugin.identity,
                &plugin.functions,
                library.map(NormalizedPath::as_str),
            );
            let path = dir.join(&format!("{}.libsonnet", plugin.identity));
            io::write_text(&path, &source).map_err(|source| Error::ArtifactWrite {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(plugin = %plugin.identity, path = %path, "wrote plugin library");
        }
        Ok(())
    }

    /// Run queued init hooks once, in load order.
    pub fn run_init_hooks(&mut self) -> Result<()> {
        self.initialize()?;
        if self.init_hooks_ran {
            return Ok(());
        }
        let context = self.context();
        for hook in self.state.hooks.init_hooks() {
            tracing::debug!(owner = %hook.owner, "running init hook");
            hook.callable
                .call(&mut context.borrow_mut(), &[])
                .map_err(|source| Error::InitHook {
                    owner: hook.owner.clone(),
                    source,
                })?;
        }
        self.init_hooks_ran = true;
        Ok(())
    }

    /// Notify CLI hooks that `command` is about to run.
    pub fn run_cli_hooks(&self, command: &str, args: &[String]) -> Result<()> {
        let payload = json!({ "command": command, "args": args });
        let context = self.context();
        for hook in self.state.hooks.cli_hooks() {
            hook.callable
                .call(&mut context.borrow_mut(), std::slice::from_ref(&payload))
                .map_err(|source| Error::CliHook {
                    owner: hook.owner.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Register every native function with `engine` and point its imports
    /// at the generated directory.
    pub fn bind(&self, engine: &mut dyn EvaluationEngine) {
        self.state.registry.bind(engine);
        engine.add_import_path(&self.generated_dir());
    }

    /// Initialize, run init hooks, bind, and evaluate `input`.
    pub fn render(&mut self, engine: &mut dyn EvaluationEngine, input: &EvalInput) -> Result<Value> {
        self.run_init_hooks()?;
        self.bind(engine);
        tracing::debug!(input = input.name(), "evaluating");
        engine
            .evaluate(input)
            .map_err(|e| Error::Evaluation(e.message))
    }

    /// Call a registered function directly, through the cache.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        self.state.registry.invoke(name, args)
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn generated_dir(&self) -> NormalizedPath {
        self.config.generated_dir(&self.root)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn plugins(&self) -> &PluginTable {
        &self.plugins
    }

    pub fn plugin(&self, identity: &str) -> Option<&PluginRecord> {
        self.plugins.get(identity)
    }

    pub fn report(&self) -> &WalkReport {
        &self.report
    }

    pub fn local_modules(&self) -> &[LocalModuleRecord] {
        &self.local
    }

    /// Local scripts that failed to load during the last initialization.
    pub fn skipped_local_modules(&self) -> &[SkippedLocalModule] {
        &self.local_skipped
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.state.registry
    }

    pub fn hooks(&self) -> &HookTable {
        &self.state.hooks
    }

    pub fn context(&self) -> SharedContext {
        self.state.registry.context().clone()
    }

    /// Writer using built-in serializers plus plugin file handlers.
    pub fn output_writer(&self) -> OutputWriter {
        OutputWriter::new(self.state.hooks.clone(), self.context())
    }
}

/// Delete plugin libraries left by an earlier run. Files without the
/// generated marker are never touched.
fn remove_stale_libraries(dir: &NormalizedPath) -> Result<()> {
    let listed = io::files_under(dir).map_err(|source| Error::ArtifactWrite {
        path: dir.clone(),
        source,
    })?;
    for path in listed {
        if path.extension() != Some("libsonnet") {
            continue;
        }
        let generated = io::read_text(&path)
            .map(|text| text.starts_with(library::GENERATED_MARKER))
            .unwrap_or(false);
        if generated {
            io::remove_file_if_exists(&path).map_err(|source| Error::ArtifactWrite {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path, "removed stale plugin library");
        }
    }
    Ok(())
}

impl fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHost")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("plugins", &self.plugins.len())
            .field("functions", &self.state.registry.len())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
