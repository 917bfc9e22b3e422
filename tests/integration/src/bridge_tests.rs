//! The native-function bridge as seen by an evaluation engine.

mod support;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use stave_plugins::{ContextObject, Error, EvalInput};
use stave_test_utils::TestProject;

use support::{RecordingEngine, calls, open_host};

#[test]
fn test_local_add_forwards_to_native_function() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);
    project.local_module("utils.js", "exports.add = (a, b) => a + b;");

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let bridged = host
        .render(&mut engine, &calls(&[("local_utils_add", json!([2, 3]))]))
        .unwrap();

    let direct = host.registry().get("local_utils_add").unwrap().callable.call(
        &mut ContextObject::new(),
        &[json!(2), json!(3)],
    );
    assert_eq!(bridged, json!([5]));
    assert_eq!(Ok(json!(5)), direct);
    project.assert_file_contains(
        ".stave/modules.libsonnet",
        "add(a, b):: std.native('local_utils_add')(a, b),",
    );
    assert_eq!(engine.import_paths, vec![project.path(".stave")]);
}

#[rstest]
#[case::default_value("(a, b = 5) => a + b", &["a", "b"])]
#[case::plain_function("function (host, port) { return host + ':' + port; }", &["host", "port"])]
#[case::single_bare_arrow("name => 'hi ' + name", &["name"])]
#[case::no_params("() => 42", &[])]
fn test_introspected_parameters(#[case] source: &str, #[case] expected: &[&str]) {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);
    project.local_module("sample.js", &format!("exports.f = {source};"));

    let mut host = open_host(&project);
    host.initialize().unwrap();

    let params = &host.registry().get("local_sample_f").unwrap().params;
    assert_eq!(params, &expected.iter().map(|p| p.to_string()).collect::<Vec<_>>());
}

#[test]
fn test_explicit_params_bridge_equals_direct_call() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);
    project.local_module(
        "math.js",
        "exports.mul = [function () { return arguments[0] * arguments[1]; }, 'x', 'y'];",
    );

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let bridged = host
        .render(&mut engine, &calls(&[("local_math_mul", json!([2, 3]))]))
        .unwrap();

    assert_eq!(engine.natives["local_math_mul"].0, vec!["x", "y"]);
    assert_eq!(bridged, json!([host.invoke("local_math_mul", &[json!(2), json!(3)]).unwrap()]));
    assert_eq!(bridged, json!([6]));
}

#[test]
fn test_identical_invocations_run_once() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"vault": "*"}}"#);
    project.extension(
        "vault",
        json!({}),
        "exports.secret = function (path) { this.reads = (this.reads || 0) + 1; return 's3cr3t:' + path; };",
    );

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let result = host
        .render(
            &mut engine,
            &calls(&[
                ("vault:secret", json!(["kv/app"])),
                ("vault:secret", json!(["kv/app"])),
                ("vault:secret", json!(["kv/other"])),
            ]),
        )
        .unwrap();

    assert_eq!(result, json!(["s3cr3t:kv/app", "s3cr3t:kv/app", "s3cr3t:kv/other"]));
    assert_eq!(host.context().borrow().get("reads"), Some(&json!(2)));
    assert_eq!(host.registry().cache_stats().hits, 1);
}

#[test]
fn test_bypassed_function_runs_every_time() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);
    project.write("stave.toml", "[cache]\nbypass = [\"local_*\"]\n");
    project.local_module(
        "clock.js",
        "exports.tick = function () { this.ticks = (this.ticks || 0) + 1; return this.ticks; };",
    );

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let result = host
        .render(&mut engine, &calls(&[("local_clock_tick", json!([])), ("local_clock_tick", json!([]))]))
        .unwrap();

    assert_eq!(result, json!([1, 2]));
}

#[test]
fn test_thrown_error_message_is_preserved() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"dns": "*"}}"#);
    project.extension(
        "dns",
        json!({}),
        "exports.lookup = function (zone) { throw new Error('zone not found: ' + zone); };",
    );

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let err = host
        .render(&mut engine, &calls(&[("dns:lookup", json!(["example.org"]))]))
        .unwrap_err();

    assert_eq!(err.to_string(), "evaluation failed: zone not found: example.org");
}

#[test]
fn test_unmet_requirement_stops_before_evaluation() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);
    project.local_module(
        "deploy.js",
        "exports.__stave__ = { requires: ['k8s'] };\nexports.apply = function () { return true; };",
    );

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let err = host.render(&mut engine, &calls(&[])).unwrap_err();

    assert!(matches!(err, Error::RequirementUnmet { ref requirement, .. } if requirement == "k8s"));
    assert_eq!(engine.evaluations, 0);
}

#[test]
fn test_init_hooks_run_before_evaluation() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"env": "*"}}"#);
    project.extension(
        "env",
        json!({"stave": {"context": {"stage": "dev"}}}),
        "exports.__stave__ = { init: function () { this.stage = this.stage.toUpperCase(); } };\n\
         exports.stage = function () { return this.stage; };",
    );

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let result = host.render(&mut engine, &calls(&[("env:stage", json!([]))])).unwrap();

    assert_eq!(result, json!(["DEV"]));
}

#[test]
fn test_file_input_is_passed_through() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app"}"#);

    let mut host = open_host(&project);
    let mut engine = RecordingEngine::default();
    let err = host
        .render(&mut engine, &EvalInput::File(project.path("main.jsonnet")))
        .unwrap_err();

    assert_eq!(err.to_string(), "evaluation failed: only snippets are supported");
    assert_eq!(engine.evaluations, 1);
}
