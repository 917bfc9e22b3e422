//! End-to-end tests for the stave binary

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use stave_test_utils::TestProject;

/// Get a Command for the stave binary rooted at `project`
fn stave_cmd(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("stave").expect("Failed to find stave binary");
    cmd.env_remove("RUST_LOG")
        .arg("--root")
        .arg(project.root().as_str());
    cmd
}

fn dns_project() -> TestProject {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"dns": "*", "left-pad": "*"}}"#);
    project.extension(
        "dns",
        json!({}),
        "exports.lookup = function (host) { return 'A ' + host; };\n\
         exports.__stave__ = { fileTypes: { zone: function (v, file) { return '; ' + file + '\\n' + v.join('\\n'); } } };",
    );
    project.package("node_modules/left-pad", r#"{"name": "left-pad"}"#);
    project.local_module("utils.js", "exports.add = function (a, b) { return a + b; };");
    project
}

#[test]
fn test_no_command_shows_hint() {
    let mut cmd = Command::cargo_bin("stave").unwrap();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("stave --help"));
}

#[test]
fn test_plugins_lists_loaded_extensions() {
    let project = dns_project();
    stave_cmd(&project)
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("dns"))
        .stdout(predicate::str::contains("1 functions"))
        .stdout(predicate::str::contains("left-pad").not());
}

#[test]
fn test_plugins_json() {
    let project = dns_project();
    let output = stave_cmd(&project).args(["plugins", "--json"]).output().unwrap();
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["plugins"][0]["identity"], json!("dns"));
    assert_eq!(report["plugins"][0]["functions"][0]["qualified"], json!("dns:lookup"));
    assert_eq!(report["skipped"], json!([]));
}

#[test]
fn test_plugins_reports_missing_dependency() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"ghost": "*"}}"#);
    stave_cmd(&project)
        .arg("plugins")
        .assert()
        .success()
        .stdout(predicate::str::contains("ghost"))
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn test_functions_json_lists_plugin_and_local_functions() {
    let project = dns_project();
    let output = stave_cmd(&project).args(["functions", "--json"]).output().unwrap();
    assert!(output.status.success());

    let functions: Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = functions
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["dns:lookup", "local_utils_add"]);
    assert_eq!(functions[1]["cache"], json!("memoize"));
}

#[test]
fn test_modules_regenerates_aggregator() {
    let project = dns_project();
    stave_cmd(&project)
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("utils"))
        .stdout(predicate::str::contains("local_utils_add"));
    project.assert_file_contains(".stave/modules.libsonnet", "utils: {");
}

#[test]
fn test_broken_local_module_is_skipped() {
    let project = dns_project();
    project.local_module("bad.js", "exports.x = ;");
    stave_cmd(&project)
        .arg("modules")
        .assert()
        .success()
        .stdout(predicate::str::contains("local_utils_add"))
        .stdout(predicate::str::contains("skipped"));
    project.assert_file_contains(".stave/modules.libsonnet", "utils: {");
}

#[test]
fn test_call_local_function() {
    let project = dns_project();
    stave_cmd(&project)
        .args(["call", "local_utils_add", "2", "3"])
        .assert()
        .success()
        .stdout(predicate::str::diff("5\n"));
}

#[test]
fn test_call_plugin_function_with_string_arg() {
    let project = dns_project();
    stave_cmd(&project)
        .args(["call", "dns:lookup", "example.org"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"A example.org\""));
}

#[test]
fn test_call_unknown_function_fails() {
    let project = dns_project();
    stave_cmd(&project)
        .args(["call", "dns:nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown function 'dns:nope'"));
}

#[test]
fn test_missing_requirement_is_fatal() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"k8s": "*"}}"#);
    project.extension("k8s", json!({"stave": {"requires": ["helm"]}}), "");
    stave_cmd(&project)
        .arg("functions")
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires 'helm'"))
        .stderr(predicate::str::contains("npm install helm"));
}

#[test]
fn test_emit_uses_plugin_file_handler() {
    let project = dns_project();
    project.write(
        "tree.json",
        r#"{"example.zone": ["@ IN A 10.0.0.1"], "meta.json": {"serial": 1}}"#,
    );
    let out = project.path("out");

    stave_cmd(&project)
        .arg("emit")
        .arg(project.path("tree.json").as_str())
        .arg("--out")
        .arg(out.as_str())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 files written"));

    assert_eq!(project.read("out/example.zone"), "; example.zone\n@ IN A 10.0.0.1");
    assert_eq!(project.read("out/meta.json"), "{\n  \"serial\": 1\n}\n");
}

#[test]
fn test_cli_hooks_see_command() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"audit": "*"}}"#);
    project.extension(
        "audit",
        json!({}),
        "exports.__stave__ = { cli: function (p) { if (p.command === 'call' && p.args[0] === 'audit:deny') { throw new Error('blocked by audit'); } } };\n\
         exports.deny = function () { return 1; };",
    );

    stave_cmd(&project)
        .args(["call", "audit:deny"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("blocked by audit"));
}
