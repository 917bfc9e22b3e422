//! Generated libraries evaluated by a Jsonnet interpreter, with every native
//! function dispatched back into the host.

mod support;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use jrsonnet_evaluator::error::{Error as JsonnetError, LocError};
use jrsonnet_evaluator::native::{NativeCallback, NativeCallbackHandler};
use jrsonnet_evaluator::{EvaluationState, FileImportResolver, Val};
use jrsonnet_gc::{Finalize, Gc, Trace, unsafe_empty_trace};
use jrsonnet_parser::{Param, ParamsDesc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use stave_fs::NormalizedPath;
use stave_plugins::{EngineError, EvalInput, EvaluationEngine, NativeDispatcher};
use stave_test_utils::TestProject;

use support::open_host;

struct Dispatch(NativeDispatcher);

impl Finalize for Dispatch {}

unsafe impl Trace for Dispatch {
    unsafe_empty_trace!();
}

impl NativeCallbackHandler for Dispatch {
    fn call(&self, _from: Option<Rc<Path>>, args: &[Val]) -> Result<Val, LocError> {
        let args = args.iter().map(to_json).collect::<Result<Vec<_>, _>>()?;
        let result = (self.0)(&args).map_err(|e| runtime_error(e.message))?;
        from_json(&result)
    }
}

fn runtime_error(message: impl Into<String>) -> LocError {
    let message: String = message.into();
    JsonnetError::RuntimeError(message.as_str().into()).into()
}

fn to_json(value: &Val) -> Result<Value, LocError> {
    match value {
        Val::Null => Ok(Value::Null),
        Val::Bool(b) => Ok(Value::Bool(*b)),
        Val::Num(n) if n.fract() == 0.0 && n.abs() < 9e15 => Ok(json!(*n as i64)),
        Val::Num(n) => Ok(json!(n)),
        Val::Str(s) => Ok(Value::String(s.to_string())),
        _ => Err(runtime_error("only scalar arguments are supported")),
    }
}

fn from_json(value: &Value) -> Result<Val, LocError> {
    match value {
        Value::Null => Ok(Val::Null),
        Value::Bool(b) => Ok(Val::Bool(*b)),
        Value::Number(n) => Ok(Val::Num(n.as_f64().unwrap_or_default())),
        Value::String(s) => Ok(Val::Str(s.as_str().into())),
        _ => Err(runtime_error("only scalar results are supported")),
    }
}

/// Jsonnet engine that installs host dispatchers as `std.native` functions.
#[derive(Default)]
struct JsonnetEngine {
    natives: Vec<(String, Vec<String>, NativeDispatcher)>,
    import_paths: Vec<PathBuf>,
}

impl EvaluationEngine for JsonnetEngine {
    fn register_native_function(&mut self, name: &str, params: &[String], dispatcher: NativeDispatcher) {
        self.natives.push((name.to_string(), params.to_vec(), dispatcher));
    }

    fn add_import_path(&mut self, dir: &NormalizedPath) {
        self.import_paths.push(dir.to_native());
    }

    fn evaluate(&mut self, input: &EvalInput) -> Result<Value, EngineError> {
        let EvalInput::Snippet { name, code } = input else {
            return Err(EngineError::new("only snippets are supported"));
        };

        let state = EvaluationState::default();
        state.with_stdlib();
        state.set_import_resolver(Box::new(FileImportResolver {
            library_paths: self.import_paths.clone(),
        }));
        for (native, params, dispatcher) in &self.natives {
            let params = params.iter().map(|p| Param(p.as_str().into(), None)).collect();
            let callback = NativeCallback::new(
                ParamsDesc(Rc::new(params)),
                Box::new(Dispatch(dispatcher.clone())),
            );
            state.add_native(native.as_str().into(), Gc::new(callback));
        }

        let source: Rc<Path> = match self.import_paths.first() {
            Some(dir) => dir.join(name).into(),
            None => PathBuf::from(name).into(),
        };
        state.run_in_state(|| {
            let value = state
                .evaluate_snippet_raw(source, code.as_str().into())
                .map_err(|e| EngineError::new(format!("{e:?}")))?;
            let manifest = state
                .manifest(value)
                .map_err(|e| EngineError::new(format!("{e:?}")))?;
            serde_json::from_str(&manifest).map_err(|e| EngineError::new(e.to_string()))
        })
    }
}

fn render(project: &TestProject, code: &str) -> Value {
    let mut host = open_host(project);
    let mut engine = JsonnetEngine::default();
    host.render(&mut engine, &EvalInput::snippet("main.jsonnet", code))
        .unwrap()
}

#[test]
fn test_aggregator_add_evaluates_to_sum() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);
    project.local_module("utils.js", "exports.add = (a, b) => a + b;");

    let result = render(
        &project,
        "local modules = import 'modules.libsonnet';\n\
         { sum: modules.utils.add(2, 3), equal: modules.utils.add(2, 3) == 5 }",
    );

    assert_eq!(result, json!({"sum": 5, "equal": true}));
}

#[test]
fn test_plugin_library_extends_generated_wrappers() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"@acme/dns": "*"}}"#);
    project.extension(
        "@acme/dns",
        json!({"stave": {"libraryFile": "lib/dns.libsonnet"}}),
        "exports.lookup = function (host) { return 'A ' + host; };",
    );
    project.write(
        "node_modules/@acme/dns/lib/dns.libsonnet",
        "{ record(host):: self.lookup(host) + ' 300' }",
    );

    let result = render(
        &project,
        "local dns = import 'plugins/@acme/dns.libsonnet';\n\
         [dns.lookup('example.org'), dns.record('example.org')]",
    );

    assert_eq!(result, json!(["A example.org", "A example.org 300"]));
}

#[test]
fn test_colliding_fallback_parameter_names_still_evaluate() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);
    project.local_module("k.js", "exports.f = function (arg1, self) { return arg1 * 10 + self; };");

    let result = render(
        &project,
        "local modules = import 'modules.libsonnet';\nmodules.k.f(4, 2)",
    );

    assert_eq!(result, json!(42));
    project.assert_file_contains(
        ".stave/modules.libsonnet",
        "f(arg1, arg1_1):: std.native('local_k_f')(arg1, arg1_1),",
    );
}
