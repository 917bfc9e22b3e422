//! Plugin discovery and native-function bridge for Stave.
//!
//! [`PluginHost`] is the entry point: it walks the project's dependency graph
//! for packages marked as Stave extensions, loads their entry modules through
//! a [`ModuleLoader`], registers every exported function in a memoizing
//! [`FunctionRegistry`], checks cross-plugin requirements, and generates the
//! Jsonnet wrapper libraries the evaluation engine imports.
//!
//! ```text
//! PluginHost::initialize
//!   ├─ GraphWalker ── DependencyResolver ── PluginLoader ──┐
//!   ├─ RequirementValidator                                ├─ FunctionRegistry
//!   ├─ plugin libraries (<generated>/plugins/*.libsonnet)  ├─ HookTable
//!   └─ LocalExtensionCompiler (<generated>/modules.libsonnet)
//! ```

pub mod callable;
pub mod config;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod host;
pub mod library;
pub mod loader;
pub mod local;
pub mod memory;
pub mod registry;
pub mod resolver;
pub mod signature;
pub mod validator;
pub mod walker;
pub mod writer;

pub use callable::{
    CallError, Callable, ContextObject, NativeCallable, SharedContext, native, native_with_arity,
};
pub use config::{CacheConfig, HostConfig};
pub use engine::{EngineError, EvalInput, EvaluationEngine, NativeDispatcher};
pub use error::{Error, Result};
pub use hooks::{HookEntry, HookTable};
pub use host::PluginHost;
pub use loader::{
    ExportSummary, ExtensionState, LoadError, LoadOutcome, LoadedModule, METADATA_EXPORT,
    ModuleExport, ModuleLoader, ModuleMetadata, PluginLoader, PluginRecord, PluginTable,
};
pub use local::{LocalCompileReport, LocalExtensionCompiler, LocalModuleRecord, SkippedLocalModule};
pub use registry::{CachePolicy, CacheStats, FunctionRegistry, NativeFunctionEntry};
pub use resolver::{DependencyResolver, ResolvedDependency};
pub use validator::RequirementValidator;
pub use walker::{GraphWalker, NodeOutcome, NodeState, SkipReason, VisitedSet, WalkReport};
pub use writer::OutputWriter;
