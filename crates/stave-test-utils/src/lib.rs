//! Shared test fixtures for the Stave workspace.
//!
//! [`TestProject`] builds an on-disk project tree (root manifest, installed
//! packages under `node_modules`, local modules) in a temporary directory.
//! It is a dev-dependency only, never published.

use std::fs;

use serde_json::Value;
use stave_fs::NormalizedPath;
use tempfile::TempDir;

/// A temporary project directory with helpers for setup and assertions.
///
/// # Example
///
/// ```rust,no_run
/// use stave_test_utils::TestProject;
///
/// let project = TestProject::new();
/// project.root_manifest(r#"{"name": "app", "dependencies": {"dns": "*"}}"#);
/// project.extension("dns", serde_json::json!({}), "exports.lookup = (host) => host;");
/// project.assert_file_exists("node_modules/dns/index.js");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    root: NormalizedPath,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        // Canonical so paths compare equal to what the resolver returns.
        let root = NormalizedPath::new(dunce::canonicalize(temp_dir.path()).unwrap());
        Self { temp_dir, root }
    }

    /// Canonical project root.
    pub fn root(&self) -> NormalizedPath {
        self.root.clone()
    }

    /// Absolute path of `relative` inside the project.
    pub fn path(&self, relative: &str) -> NormalizedPath {
        self.root.join(relative)
    }

    /// Write `content` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.temp_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("could not write {}: {e}", path.display()));
    }

    /// Read `relative` as text.
    pub fn read(&self, relative: &str) -> String {
        let path = self.temp_dir.path().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("could not read {}: {e}", path.display()))
    }

    /// Write the root `package.json`.
    pub fn root_manifest(&self, manifest: &str) {
        self.write("package.json", manifest);
    }

    /// Write `<dir>/package.json` with raw manifest text.
    pub fn package(&self, dir: &str, manifest: &str) {
        self.write(&format!("{dir}/package.json"), manifest);
    }

    /// Install an extension package at `node_modules/<name>`.
    ///
    /// `manifest` is merged over `{"name": name, "stave": {}}`; `entry` is
    /// written to the manifest's `main` or `index.js`.
    pub fn extension(&self, name: &str, manifest: Value, entry: &str) {
        let mut merged = serde_json::json!({ "name": name, "stave": {} });
        if let (Value::Object(target), Value::Object(fields)) = (&mut merged, manifest) {
            target.extend(fields);
        }
        let main = merged
            .get("main")
            .and_then(Value::as_str)
            .unwrap_or("index.js")
            .to_string();
        let dir = format!("node_modules/{name}");
        self.package(&dir, &merged.to_string());
        self.write(&format!("{dir}/{main}"), entry);
    }

    /// Write a script into the local modules folder.
    pub fn local_module(&self, file: &str, source: &str) {
        self.write(&format!("modules/{file}"), source);
    }

    /// # Panics
    /// Panics if `relative` does not exist.
    pub fn assert_file_exists(&self, relative: &str) {
        let path = self.temp_dir.path().join(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// # Panics
    /// Panics if `relative` exists.
    pub fn assert_file_not_exists(&self, relative: &str) {
        let path = self.temp_dir.path().join(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }

    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, relative: &str, content: &str) {
        let actual = self.read(relative);
        assert!(
            actual.contains(content),
            "File {relative} does not contain expected content.\nExpected: {content}\nActual: {actual}"
        );
    }
}
