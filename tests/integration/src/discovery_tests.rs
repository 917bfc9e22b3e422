//! Discovery across real on-disk dependency graphs with script extensions.

mod support;

use pretty_assertions::assert_eq;
use serde_json::json;
use stave_plugins::{Error, SkipReason};
use stave_test_utils::TestProject;

use support::open_host;

/// Entry that counts its own evaluations in a global shared by the runtime.
fn counting_entry(name: &str) -> String {
    format!(
        "globalThis.loads = globalThis.loads || {{}};\n\
         globalThis.loads['{name}'] = (globalThis.loads['{name}'] || 0) + 1;\n\
         exports.loads = [function () {{ return globalThis.loads['{name}']; }}];\n"
    )
}

#[test]
fn test_acyclic_graph_visits_each_manifest_once() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"a": "*", "b": "*"}}"#);
    project.extension("a", json!({"dependencies": {"c": "*"}}), &counting_entry("a"));
    project.extension("b", json!({"dependencies": {"c": "*"}}), &counting_entry("b"));
    project.extension("c", json!({}), &counting_entry("c"));

    let mut host = open_host(&project);
    host.initialize().unwrap();

    assert_eq!(host.report().manifests_visited, 4);
    let loaded: Vec<_> = host.plugins().loaded().map(|p| p.identity.as_str()).collect();
    assert_eq!(loaded, vec!["a", "c", "b"]);
    assert_eq!(host.invoke("c:loads", &[]).unwrap(), json!(1));
}

#[test]
fn test_cyclic_graph_terminates_and_loads_once() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"a": "*"}}"#);
    project.extension("a", json!({"dependencies": {"b": "*"}}), &counting_entry("a"));
    project.extension("b", json!({"dependencies": {"a": "*"}}), &counting_entry("b"));

    let mut host = open_host(&project);
    host.initialize().unwrap();

    assert_eq!(host.invoke("a:loads", &[]).unwrap(), json!(1));
    assert_eq!(host.invoke("b:loads", &[]).unwrap(), json!(1));
    assert_eq!(host.plugins().loaded().count(), 2);
}

#[test]
fn test_same_short_name_gets_distinct_qualified_names() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"aws": "*", "gcp": "*"}}"#);
    project.extension("aws", json!({}), "exports.region = function () { return 'us-east-1'; };");
    project.extension("gcp", json!({}), "exports.region = function () { return 'europe-west1'; };");

    let mut host = open_host(&project);
    host.initialize().unwrap();

    assert_eq!(host.invoke("aws:region", &[]).unwrap(), json!("us-east-1"));
    assert_eq!(host.invoke("gcp:region", &[]).unwrap(), json!("europe-west1"));
}

#[test]
fn test_broken_extension_is_skipped_without_aborting_siblings() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"broken": "*", "ok": "*", "ghost": "*"}}"#);
    project.extension("broken", json!({}), "throw new Error('missing credentials');");
    project.extension("ok", json!({}), "exports.ping = function () { return 'pong'; };");

    let mut host = open_host(&project);
    host.initialize().unwrap();

    assert_eq!(host.invoke("ok:ping", &[]).unwrap(), json!("pong"));
    let skipped: Vec<_> = host
        .report()
        .skipped()
        .map(|(node, reason)| (node.dependency.clone(), reason.clone()))
        .collect();
    assert_eq!(skipped.len(), 2);
    assert!(matches!(&skipped[0].1, SkipReason::LoadFailed(m) if m.contains("missing credentials")));
    assert_eq!(skipped[1], ("ghost".to_string(), SkipReason::NotFound));
}

#[test]
fn test_nested_copy_with_same_identity_is_not_loaded_twice() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"lib": "*", "tool": "*"}}"#);
    project.extension("lib", json!({"version": "2.0.0"}), &counting_entry("lib"));
    project.extension("tool", json!({"dependencies": {"lib": "*"}}), "");
    project.package(
        "node_modules/tool/node_modules/lib",
        r#"{"name": "lib", "version": "1.0.0", "stave": {}}"#,
    );
    project.write("node_modules/tool/node_modules/lib/index.js", &counting_entry("lib"));

    let mut host = open_host(&project);
    host.initialize().unwrap();

    assert_eq!(host.invoke("lib:loads", &[]).unwrap(), json!(1));
    assert_eq!(
        host.plugin("lib").unwrap().manifest,
        project.path("node_modules/lib/package.json")
    );
    assert!(
        host.report()
            .skipped()
            .any(|(_, reason)| matches!(reason, SkipReason::Duplicate { .. }))
    );
}

#[test]
fn test_missing_requirement_names_the_requirement() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"k8s": "*"}}"#);
    project.extension("k8s", json!({}), "exports.__stave__ = { requires: ['helm'] };");

    let err = open_host(&project).initialize().unwrap_err();

    assert!(matches!(err, Error::RequirementUnmet { ref plugin, ref requirement } if plugin == "k8s" && requirement == "helm"));
}

#[test]
fn test_satisfied_requirement_passes() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"k8s": "*", "helm": "*"}}"#);
    project.extension("k8s", json!({"stave": {"requires": ["helm"]}}), "");
    project.extension("helm", json!({}), "");

    assert!(open_host(&project).initialize().is_ok());
}

#[test]
fn test_plugin_library_extends_wrappers() {
    let project = TestProject::new();
    project.root_manifest(r#"{"name": "app", "dependencies": {"@acme/k8s": "*"}}"#);
    project.extension(
        "@acme/k8s",
        json!({"stave": {"libraryFile": "lib/k8s.libsonnet"}}),
        "exports.deployment = [function (spec) { return spec; }, 'spec'];",
    );
    project.write("node_modules/@acme/k8s/lib/k8s.libsonnet", "{ version: 1 }\n");

    let mut host = open_host(&project);
    host.initialize().unwrap();

    let library = project.read(".stave/plugins/@acme/k8s.libsonnet");
    assert!(library.contains("deployment(spec):: std.native('@acme/k8s:deployment')(spec),"));
    assert!(library.contains(&format!(
        "+ (import '{}')",
        project.path("node_modules/@acme/k8s/lib/k8s.libsonnet")
    )));
}
