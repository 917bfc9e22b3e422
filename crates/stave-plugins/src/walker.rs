//! Depth-first traversal of the project's dependency graph.
//!
//! Starting from the root manifest, every declared dependency is resolved
//! relative to the manifest that declared it. Extensions are loaded and their
//! own dependencies walked in turn; other packages end the branch. Each
//! manifest is scanned at most once per walk, which makes cycles and diamonds
//! harmless.
//!
//! Resolution and load failures never stop the walk. They are logged at
//! `warn` and recorded in the [`WalkReport`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use stave_fs::NormalizedPath;
use stave_manifest::{ManifestReader, ManifestRecord};

use crate::error::{Error, Result};
use crate::loader::{LoadOutcome, PluginLoader};
use crate::resolver::DependencyResolver;

/// Why a node did not end up loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    NotFound,
    /// The declared name is not a valid package name.
    InvalidName(String),
    InvalidManifest(String),
    NotAnExtension,
    LoadFailed(String),
    /// Another copy of the same plugin identity was loaded first.
    Duplicate { existing: NormalizedPath },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::InvalidName(message) => write!(f, "invalid name: {message}"),
            Self::InvalidManifest(message) => write!(f, "invalid manifest: {message}"),
            Self::NotAnExtension => write!(f, "not an extension"),
            Self::LoadFailed(message) => write!(f, "load failed: {message}"),
            Self::Duplicate { existing } => write!(f, "duplicate of {existing}"),
        }
    }
}

/// Per-manifest state within one walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Scanning,
    Loaded,
    Skipped(SkipReason),
}

/// Canonical manifest paths seen during one walk.
#[derive(Debug, Default)]
pub struct VisitedSet {
    states: HashMap<NormalizedPath, NodeState>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `manifest` as being scanned. Returns `false` if it was already
    /// seen.
    pub fn enter(&mut self, manifest: &NormalizedPath) -> bool {
        if self.states.contains_key(manifest) {
            return false;
        }
        self.states.insert(manifest.clone(), NodeState::Scanning);
        true
    }

    pub fn finish(&mut self, manifest: &NormalizedPath, state: NodeState) {
        self.states.insert(manifest.clone(), state);
    }

    pub fn state(&self, manifest: &NormalizedPath) -> Option<&NodeState> {
        self.states.get(manifest)
    }

    pub fn contains(&self, manifest: &NormalizedPath) -> bool {
        self.states.contains_key(manifest)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// What happened to one declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeOutcome {
    pub dependency: String,
    /// Name of the declaring manifest; empty for an unnamed root.
    pub declared_by: String,
    /// Resolved manifest path, when resolution succeeded.
    pub manifest: Option<NormalizedPath>,
    pub state: NodeState,
    /// 1 for the root's own dependencies.
    pub depth: usize,
}

/// Outcomes in the order nodes were first reached.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkReport {
    pub nodes: Vec<NodeOutcome>,
    /// Distinct manifests scanned, including the root.
    pub manifests_visited: usize,
}

impl WalkReport {
    pub fn loaded(&self) -> impl Iterator<Item = &NodeOutcome> {
        self.nodes.iter().filter(|n| n.state == NodeState::Loaded)
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&NodeOutcome, &SkipReason)> {
        self.nodes.iter().filter_map(|n| match &n.state {
            NodeState::Skipped(reason) => Some((n, reason)),
            _ => None,
        })
    }
}

/// Walks dependencies and feeds extensions to a [`PluginLoader`].
pub struct GraphWalker<'a> {
    resolver: DependencyResolver,
    loader: PluginLoader<'a>,
    visited: VisitedSet,
    report: WalkReport,
    dev_dependencies: bool,
}

impl<'a> GraphWalker<'a> {
    pub fn new(loader: PluginLoader<'a>) -> Self {
        Self {
            resolver: DependencyResolver::new(),
            loader,
            visited: VisitedSet::new(),
            report: WalkReport::default(),
            dev_dependencies: true,
        }
    }

    /// Whether the root's `devDependencies` are walked. Nested manifests
    /// never contribute theirs.
    pub fn dev_dependencies(mut self, enabled: bool) -> Self {
        self.dev_dependencies = enabled;
        self
    }

    /// Walk from the manifest at `root_manifest`. Only an unreadable root
    /// manifest is an error.
    pub fn walk(mut self, root_manifest: &NormalizedPath) -> Result<WalkReport> {
        let root_manifest = root_manifest.canonicalize()?;
        let root = ManifestReader::new().read(&root_manifest)?;
        let root_dir = root_manifest
            .parent()
            .ok_or_else(|| Error::Manifest(stave_manifest::Error::ManifestNotFound(root_manifest.to_native())))?;
        self.visited.enter(&root_manifest);

        let mut names: Vec<&str> = root.dependencies.names().collect();
        if self.dev_dependencies {
            for name in root.dev_dependencies.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        for name in names {
            self.visit(name, &root_dir, &root.name, 1);
        }
        self.visited.finish(&root_manifest, NodeState::Loaded);

        self.report.manifests_visited = self.visited.len();
        tracing::info!(
            manifests = self.report.manifests_visited,
            loaded = self.report.loaded().count(),
            skipped = self.report.skipped().count(),
            "dependency walk complete"
        );
        Ok(self.report)
    }

    fn visit(&mut self, name: &str, anchor: &NormalizedPath, declared_by: &str, depth: usize) {
        let manifest_path = match self.resolver.locate(name, anchor) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(dependency = name, declared_by, error = %err, "dependency not resolved, skipping");
                let reason = match err {
                    Error::Manifest(invalid @ stave_manifest::Error::InvalidName { .. }) => {
                        SkipReason::InvalidName(invalid.to_string())
                    }
                    _ => SkipReason::NotFound,
                };
                self.record(name, declared_by, None, NodeState::Skipped(reason), depth);
                return;
            }
        };

        if !self.visited.enter(&manifest_path) {
            tracing::trace!(dependency = name, manifest = %manifest_path, "already visited");
            return;
        }

        let dependency = match self.resolver.read(name, manifest_path.clone()) {
            Ok(dependency) => dependency,
            Err(err) => {
                tracing::warn!(dependency = name, manifest = %manifest_path, error = %err, "unreadable manifest, skipping");
                let state = NodeState::Skipped(SkipReason::InvalidManifest(err.to_string()));
                self.finish(name, declared_by, manifest_path, state, depth);
                return;
            }
        };

        if !dependency.manifest.is_extension() {
            tracing::trace!(dependency = name, "not an extension");
            let state = NodeState::Skipped(SkipReason::NotAnExtension);
            self.finish(name, declared_by, manifest_path, state, depth);
            return;
        }

        let state = match self.loader.load(&dependency) {
            LoadOutcome::Loaded => NodeState::Loaded,
            LoadOutcome::AlreadyLoaded { existing } => {
                tracing::warn!(
                    plugin = dependency.identity(),
                    manifest = %manifest_path,
                    existing = %existing,
                    "plugin already loaded from another location, skipping this copy"
                );
                NodeState::Skipped(SkipReason::Duplicate { existing })
            }
            LoadOutcome::Failed(message) => NodeState::Skipped(SkipReason::LoadFailed(message)),
        };
        self.finish(name, declared_by, manifest_path, state, depth);

        // Dependencies are walked even when this copy was not loaded.
        self.visit_children(&dependency.manifest, &dependency.package_dir, depth);
    }

    fn visit_children(&mut self, manifest: &ManifestRecord, package_dir: &NormalizedPath, depth: usize) {
        for child in manifest.dependencies.names() {
            self.visit(child, package_dir, &manifest.name, depth + 1);
        }
    }

    fn finish(
        &mut self,
        name: &str,
        declared_by: &str,
        manifest: NormalizedPath,
        state: NodeState,
        depth: usize,
    ) {
        self.visited.finish(&manifest, state.clone());
        self.record(name, declared_by, Some(manifest), state, depth);
    }

    fn record(
        &mut self,
        name: &str,
        declared_by: &str,
        manifest: Option<NormalizedPath>,
        state: NodeState,
        depth: usize,
    ) {
        tracing::debug!(dependency = name, depth, state = ?state, "visited node");
        self.report.nodes.push(NodeOutcome {
            dependency: name.to_string(),
            declared_by: declared_by.to_string(),
            manifest,
            state,
            depth,
        });
    }
}
