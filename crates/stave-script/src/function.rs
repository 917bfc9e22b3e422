//! Script functions exposed to the host as [`NativeCallable`]s.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;
use stave_plugins::{CallError, ContextObject, NativeCallable};

use crate::runtime::ScriptRuntime;

#[derive(Deserialize)]
struct CallReply {
    #[serde(default)]
    ok: Value,
    #[serde(default)]
    receiver: Option<ContextObject>,
    #[serde(default)]
    error: Option<String>,
}

/// A function kept alive inside the runtime, addressed by key.
pub struct ScriptFunction {
    runtime: Rc<ScriptRuntime>,
    key: String,
    source: String,
    length: usize,
}

impl ScriptFunction {
    pub(crate) fn new(runtime: Rc<ScriptRuntime>, key: String, source: String, length: usize) -> Self {
        Self {
            runtime,
            key,
            source,
            length,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl NativeCallable for ScriptFunction {
    fn call(&self, receiver: &mut ContextObject, args: &[Value]) -> Result<Value, CallError> {
        let receiver_json = serde_json::to_string(receiver).map_err(|e| CallError::new(e.to_string()))?;
        let args_json = serde_json::to_string(args).map_err(|e| CallError::new(e.to_string()))?;
        let code = format!(
            "__staveCall({}, {}, {})",
            js_string(&self.key),
            js_string(&receiver_json),
            js_string(&args_json),
        );

        let reply: CallReply = self
            .runtime
            .eval_json(&code)
            .map_err(|e| CallError::new(e.to_string()))?;
        if let Some(message) = reply.error {
            return Err(CallError::new(message));
        }
        if let Some(updated) = reply.receiver {
            *receiver = updated;
        }
        Ok(reply.ok)
    }

    fn source_text(&self) -> Option<&str> {
        Some(&self.source)
    }

    fn arity(&self) -> Option<usize> {
        Some(self.length)
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("key", &self.key)
            .field("length", &self.length)
            .finish()
    }
}

/// Quote `text` as a JavaScript string literal.
pub(crate) fn js_string(text: &str) -> String {
    // A JSON string is a valid JS string literal.
    Value::String(text.to_string()).to_string()
}
