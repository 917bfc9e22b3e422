//! Native function registry with memoized dispatch.
//!
//! Every exported function is registered under its qualified name. Calls are
//! keyed by that name plus a SHA-256 digest of the canonical JSON form of the
//! arguments, so repeating a call with equal arguments returns the stored
//! result without running the function again. Failed calls are not cached.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use stave_fs::checksum::digest_parts;

use crate::callable::{CallError, Callable, ContextObject, SharedContext};
use crate::config::CacheConfig;
use crate::engine::{EvaluationEngine, NativeDispatcher};
use crate::error::{Error, Result};
use crate::signature;

/// Whether results of a function are memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    Memoize,
    Bypass,
}

/// A registered native function.
pub struct NativeFunctionEntry {
    pub name: String,
    pub callable: Callable,
    /// Parameter names for generated wrappers. Never used to check calls.
    pub params: Vec<String>,
    pub policy: CachePolicy,
}

impl fmt::Debug for NativeFunctionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunctionEntry")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    digest: [u8; 32],
}

impl CacheKey {
    fn new(name: &str, args: &[Value]) -> Self {
        // serde_json maps are key-sorted, so to_string is canonical.
        let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
        let digest = digest_parts(rendered.iter().map(String::as_bytes));
        Self {
            name: name.to_string(),
            digest,
        }
    }
}

#[derive(Debug, Default)]
struct InvocationCache {
    results: HashMap<CacheKey, Value>,
    hits: u64,
    misses: u64,
}

/// Counters for the invocation cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Table of native functions for one host.
#[derive(Debug)]
pub struct FunctionRegistry {
    entries: BTreeMap<String, Rc<NativeFunctionEntry>>,
    cache: Rc<RefCell<InvocationCache>>,
    context: SharedContext,
    cache_config: CacheConfig,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl FunctionRegistry {
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            cache: Rc::new(RefCell::new(InvocationCache::default())),
            context: Rc::new(RefCell::new(ContextObject::new())),
            cache_config,
        }
    }

    /// Register `callable` under `name`.
    ///
    /// Without explicit `params` the names are inferred from the callable's
    /// source. Registering a name twice is an error.
    pub fn register(
        &mut self,
        name: &str,
        callable: Callable,
        params: Option<Vec<String>>,
    ) -> Result<Rc<NativeFunctionEntry>> {
        if self.entries.contains_key(name) {
            return Err(Error::DuplicateFunction(name.to_string()));
        }
        let params = params.unwrap_or_else(|| signature::infer_parameters(callable.as_ref()));
        let entry = Rc::new(NativeFunctionEntry {
            name: name.to_string(),
            callable,
            params,
            policy: self.cache_config.policy_for(name),
        });
        tracing::debug!(function = name, params = ?entry.params, policy = ?entry.policy, "registered native function");
        self.entries.insert(name.to_string(), Rc::clone(&entry));
        Ok(entry)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunctionEntry> {
        self.entries.get(name).map(Rc::as_ref)
    }

    /// Entries sorted by qualified name.
    pub fn entries(&self) -> impl Iterator<Item = &NativeFunctionEntry> {
        self.entries.values().map(Rc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The context every function receives as its receiver.
    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.borrow();
        CacheStats {
            entries: cache.results.len(),
            hits: cache.hits,
            misses: cache.misses,
        }
    }

    /// Call `name` with `args` through the cache.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))?;
        dispatch(entry, &self.cache, &self.context, args).map_err(|source| Error::Call {
            name: name.to_string(),
            source,
        })
    }

    /// A dispatcher for `name` that shares this registry's cache and context.
    pub fn dispatcher(&self, name: &str) -> Option<NativeDispatcher> {
        let entry = Rc::clone(self.entries.get(name)?);
        let cache = Rc::clone(&self.cache);
        let context = Rc::clone(&self.context);
        let dispatcher: NativeDispatcher =
            Rc::new(move |args: &[Value]| dispatch(&entry, &cache, &context, args));
        Some(dispatcher)
    }

    /// Install every entry into `engine`.
    pub fn bind(&self, engine: &mut dyn EvaluationEngine) {
        for entry in self.entries.values() {
            if let Some(dispatcher) = self.dispatcher(&entry.name) {
                engine.register_native_function(&entry.name, &entry.params, dispatcher);
            }
        }
        tracing::debug!(count = self.entries.len(), "bound native functions");
    }
}

fn dispatch(
    entry: &NativeFunctionEntry,
    cache: &RefCell<InvocationCache>,
    context: &RefCell<ContextObject>,
    args: &[Value],
) -> std::result::Result<Value, CallError> {
    if entry.policy == CachePolicy::Bypass {
        return entry.callable.call(&mut context.borrow_mut(), args);
    }

    let key = CacheKey::new(&entry.name, args);
    {
        let mut cache = cache.borrow_mut();
        if let Some(hit) = cache.results.get(&key).cloned() {
            cache.hits += 1;
            tracing::trace!(function = %entry.name, "cache hit");
            return Ok(hit);
        }
        cache.misses += 1;
    }

    let result = entry.callable.call(&mut context.borrow_mut(), args)?;
    cache.borrow_mut().results.insert(key, result.clone());
    Ok(result)
}
