//! Boundary to the declarative evaluation engine.
//!
//! The engine itself lives outside this workspace. Anything that can accept
//! native functions, import paths and an input to evaluate can host Stave
//! extensions.

use std::rc::Rc;

use serde_json::Value;
use stave_fs::NormalizedPath;

use crate::callable::CallError;

/// Handle the engine calls when a template invokes `std.native(name)`.
///
/// Dispatchers run synchronously on the evaluating thread.
pub type NativeDispatcher = Rc<dyn Fn(&[Value]) -> Result<Value, CallError>>;

/// What to evaluate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalInput {
    /// A template file on disk.
    File(NormalizedPath),
    /// Inline template source; `name` is used in diagnostics.
    Snippet { name: String, code: String },
}

impl EvalInput {
    pub fn snippet(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Snippet {
            name: name.into(),
            code: code.into(),
        }
    }

    /// Display name for logs and errors.
    pub fn name(&self) -> &str {
        match self {
            Self::File(path) => path.as_str(),
            Self::Snippet { name, .. } => name,
        }
    }
}

/// Error reported by an engine. Messages from native functions must come
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<CallError> for EngineError {
    fn from(err: CallError) -> Self {
        Self::new(err.message)
    }
}

/// A declarative evaluation engine that Stave can extend.
pub trait EvaluationEngine {
    /// Install a native function callable from templates as
    /// `std.native(name)(params...)`.
    fn register_native_function(&mut self, name: &str, params: &[String], dispatcher: NativeDispatcher);

    /// Add a directory searched by template imports.
    fn add_import_path(&mut self, dir: &NormalizedPath);

    /// Evaluate `input` to a JSON value.
    fn evaluate(&mut self, input: &EvalInput) -> Result<Value, EngineError>;
}
