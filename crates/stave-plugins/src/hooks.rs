//! Function-valued extension metadata: file-type handlers, CLI hooks and
//! init hooks, plus the shared-context merge rules.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use crate::callable::{Callable, ContextObject};

/// A callable contributed by a named owner (plugin identity or local
/// namespace).
#[derive(Clone)]
pub struct HookEntry {
    pub owner: String,
    pub callable: Callable,
}

impl fmt::Debug for HookEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEntry")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// Handlers and hooks collected from every loaded extension.
#[derive(Debug, Default, Clone)]
pub struct HookTable {
    file_handlers: BTreeMap<String, HookEntry>,
    cli: Vec<HookEntry>,
    init: Vec<HookEntry>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for files ending in `extension` (with or without
    /// the leading dot, case-insensitive). A later registration replaces an
    /// earlier one.
    pub fn add_file_handler(&mut self, extension: &str, owner: &str, callable: Callable) {
        let key = normalize_extension(extension);
        if let Some(previous) = self.file_handlers.get(&key) {
            tracing::debug!(
                extension = %key,
                previous = %previous.owner,
                owner,
                "file handler replaced"
            );
        }
        self.file_handlers.insert(
            key,
            HookEntry {
                owner: owner.to_string(),
                callable,
            },
        );
    }

    pub fn add_cli_hook(&mut self, owner: &str, callable: Callable) {
        self.cli.push(HookEntry {
            owner: owner.to_string(),
            callable,
        });
    }

    pub fn add_init_hook(&mut self, owner: &str, callable: Callable) {
        self.init.push(HookEntry {
            owner: owner.to_string(),
            callable,
        });
    }

    pub fn file_handler(&self, extension: &str) -> Option<&HookEntry> {
        self.file_handlers.get(&normalize_extension(extension))
    }

    /// Registered file extensions, sorted.
    pub fn file_types(&self) -> impl Iterator<Item = (&str, &HookEntry)> {
        self.file_handlers.iter().map(|(ext, entry)| (ext.as_str(), entry))
    }

    /// CLI hooks in registration order.
    pub fn cli_hooks(&self) -> &[HookEntry] {
        &self.cli
    }

    /// Init hooks in registration order.
    pub fn init_hooks(&self) -> &[HookEntry] {
        &self.init
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// Merge `incoming` context fields into `target`.
///
/// Arrays concatenate, objects merge one level deep, anything else is
/// replaced by the incoming value.
pub fn merge_context(target: &mut ContextObject, incoming: &ContextObject) {
    for (key, value) in incoming {
        let merged = match (target.get_mut(key), value) {
            (Some(Value::Array(existing)), Value::Array(more)) => {
                existing.extend(more.iter().cloned());
                true
            }
            (Some(Value::Object(existing)), Value::Object(more)) => {
                for (inner_key, inner_value) in more {
                    existing.insert(inner_key.clone(), inner_value.clone());
                }
                true
            }
            _ => false,
        };
        if !merged {
            target.insert(key.clone(), value.clone());
        }
    }
}
