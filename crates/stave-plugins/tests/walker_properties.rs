//! Property tests for dependency graph traversal over generated graphs.

use std::collections::{BTreeSet, HashSet, VecDeque};

use proptest::prelude::*;
use serde_json::json;
use stave_plugins::memory::{MemoryLoader, MemoryModule};
use stave_plugins::{ExtensionState, GraphWalker, PluginLoader, PluginTable, native};
use stave_test_utils::TestProject;

/// Adjacency lists over `pkg0..pkgN`, plus the root's direct dependencies.
#[derive(Debug, Clone)]
struct Graph {
    edges: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

fn graph() -> impl Strategy<Value = Graph> {
    (1usize..7).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(0..n, 0..4), n),
            prop::collection::vec(0..n, 0..4),
        )
            .prop_map(|(edges, roots)| Graph { edges, roots })
    })
}

fn name(index: usize) -> String {
    format!("pkg{index}")
}

fn dependencies(targets: &[usize]) -> serde_json::Value {
    let map: serde_json::Map<_, _> = targets.iter().map(|&t| (name(t), json!("*"))).collect();
    serde_json::Value::Object(map)
}

fn reachable(graph: &Graph) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<usize> = graph.roots.iter().copied().collect();
    while let Some(node) = queue.pop_front() {
        if seen.insert(node) {
            queue.extend(graph.edges[node].iter().copied());
        }
    }
    seen
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_each_reachable_extension_loads_once(graph in graph()) {
        let project = TestProject::new();
        project.root_manifest(
            &json!({"name": "app", "dependencies": dependencies(&graph.roots)}).to_string(),
        );
        let mut modules = MemoryLoader::new();
        for (index, targets) in graph.edges.iter().enumerate() {
            project.extension(&name(index), json!({"dependencies": dependencies(targets)}), "");
            modules.insert(
                project.path(&format!("node_modules/{}/index.js", name(index))),
                MemoryModule::new().function("id", native(|_, args| Ok(args.first().cloned().unwrap_or_default()))),
            );
        }

        let mut state = ExtensionState::default();
        let mut plugins = PluginTable::new();
        let loader = PluginLoader::new(&mut modules, &mut state, &mut plugins);
        let report = GraphWalker::new(loader)
            .walk(&project.path("package.json"))
            .unwrap();

        let expected = reachable(&graph);
        for index in 0..graph.edges.len() {
            let loads = modules.load_count(project.path(&format!("node_modules/{}/index.js", name(index))));
            let want = usize::from(expected.contains(&index));
            prop_assert_eq!(loads, want, "load count of {}", name(index));
        }

        let manifests: Vec<_> = report.nodes.iter().filter_map(|n| n.manifest.clone()).collect();
        let distinct: HashSet<_> = manifests.iter().collect();
        prop_assert_eq!(manifests.len(), distinct.len());
        prop_assert_eq!(report.manifests_visited, expected.len() + 1);
        prop_assert_eq!(plugins.loaded().count(), expected.len());
        for index in &expected {
            let qualified = format!("{}:id", name(*index));
            prop_assert!(state.registry.contains(&qualified));
        }
    }
}
