//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;

use serde_json::{Value, json};
use stave_fs::NormalizedPath;
use stave_plugins::{EngineError, EvalInput, EvaluationEngine, NativeDispatcher, PluginHost};
use stave_script::ScriptLoader;
use stave_test_utils::TestProject;

/// Stand-in for a template engine: a snippet is a JSON list of
/// `{"call": name, "args": [...]}` requests, evaluated in order.
#[derive(Default)]
pub struct RecordingEngine {
    pub natives: HashMap<String, (Vec<String>, NativeDispatcher)>,
    pub import_paths: Vec<NormalizedPath>,
    pub evaluations: usize,
}

impl EvaluationEngine for RecordingEngine {
    fn register_native_function(&mut self, name: &str, params: &[String], dispatcher: NativeDispatcher) {
        self.natives.insert(name.to_string(), (params.to_vec(), dispatcher));
    }

    fn add_import_path(&mut self, dir: &NormalizedPath) {
        self.import_paths.push(dir.clone());
    }

    fn evaluate(&mut self, input: &EvalInput) -> Result<Value, EngineError> {
        self.evaluations += 1;
        let EvalInput::Snippet { code, .. } = input else {
            return Err(EngineError::new("only snippets are supported"));
        };
        let requests: Vec<Value> = serde_json::from_str(code).map_err(|e| EngineError::new(e.to_string()))?;
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let name = request["call"].as_str().unwrap_or_default();
            let args = request["args"].as_array().cloned().unwrap_or_default();
            let (_, dispatcher) = self
                .natives
                .get(name)
                .ok_or_else(|| EngineError::new(format!("unknown native function {name}")))?;
            results.push(dispatcher(&args)?);
        }
        Ok(Value::Array(results))
    }
}

pub fn calls(requests: &[(&str, Value)]) -> EvalInput {
    let body: Vec<Value> = requests
        .iter()
        .map(|(name, args)| json!({"call": name, "args": args}))
        .collect();
    EvalInput::snippet("test", Value::Array(body).to_string())
}

pub fn open_host(project: &TestProject) -> PluginHost {
    PluginHost::open(&project.root(), Box::new(ScriptLoader::new().unwrap())).unwrap()
}
