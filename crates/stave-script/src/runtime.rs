//! The shared `boa_engine` context.

use std::cell::RefCell;
use std::fmt;

use boa_engine::{Context, Source};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const PRELUDE: &str = include_str!("prelude.js");

#[derive(Deserialize)]
struct LogLine {
    level: String,
    message: String,
}

/// One JavaScript context shared by every module a loader evaluates.
///
/// All host glue (`__staveRegister`, `__staveCall`) returns JSON text, so
/// every exchange with the context goes through [`ScriptRuntime::eval_json`].
pub struct ScriptRuntime {
    context: RefCell<Context>,
}

impl ScriptRuntime {
    pub fn new() -> Result<Self> {
        let mut context = Context::default();
        context
            .eval(Source::from_bytes(PRELUDE))
            .map_err(|e| Error::Prelude(e.to_string()))?;
        Ok(Self {
            context: RefCell::new(context),
        })
    }

    /// Evaluate `code`, which must produce a JSON string, and decode it.
    pub fn eval_json<T: DeserializeOwned>(&self, code: &str) -> Result<T> {
        let mut context = self.context.try_borrow_mut().map_err(|_| Error::Busy)?;
        let outcome = context.eval(Source::from_bytes(code));
        forward_console(&mut context);

        let value = outcome.map_err(|e| Error::Script(e.to_string()))?;
        let text = value
            .as_string()
            .map(|s| s.to_std_string_escaped())
            .ok_or_else(|| Error::Protocol("expected a JSON string".to_string()))?;
        serde_json::from_str(&text).map_err(|e| Error::Protocol(e.to_string()))
    }
}

impl fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRuntime").finish_non_exhaustive()
    }
}

/// Re-emit buffered `console.*` output as tracing events.
fn forward_console(context: &mut Context) {
    let Ok(value) = context.eval(Source::from_bytes("__staveDrainLogs()")) else {
        return;
    };
    let Some(text) = value.as_string().map(|s| s.to_std_string_escaped()) else {
        return;
    };
    let lines: Vec<LogLine> = serde_json::from_str(&text).unwrap_or_default();
    for line in lines {
        match line.level.as_str() {
            "error" => tracing::error!(target: "stave::script", "{}", line.message),
            "warn" => tracing::warn!(target: "stave::script", "{}", line.message),
            "debug" => tracing::debug!(target: "stave::script", "{}", line.message),
            _ => tracing::info!(target: "stave::script", "{}", line.message),
        }
    }
}
