//! Cross-plugin requirement checks.

use crate::error::{Error, Result};
use crate::loader::PluginTable;

/// Verifies that every loaded plugin's requirements are loaded too.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequirementValidator;

impl RequirementValidator {
    pub fn new() -> Self {
        Self
    }

    /// Fails on the first unmet requirement, checking plugins in load order.
    pub fn validate(&self, plugins: &PluginTable) -> Result<()> {
        for record in plugins.loaded() {
            check_requirements(&record.identity, &record.requires, plugins)?;
        }
        tracing::debug!(plugins = plugins.loaded().count(), "plugin requirements satisfied");
        Ok(())
    }
}

/// Check `requires` declared by `owner` against the loaded plugins.
pub fn check_requirements(owner: &str, requires: &[String], plugins: &PluginTable) -> Result<()> {
    match requires.iter().find(|required| !plugins.is_loaded(required)) {
        Some(missing) => Err(Error::RequirementUnmet {
            plugin: owner.to_string(),
            requirement: missing.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::PluginRecord;
    use stave_fs::NormalizedPath;

    fn record(identity: &str, requires: &[&str], loaded: bool) -> PluginRecord {
        PluginRecord {
            identity: identity.to_string(),
            entry: NormalizedPath::new(format!("/p/node_modules/{identity}/index.js")),
            manifest: NormalizedPath::new(format!("/p/node_modules/{identity}/package.json")),
            requires: requires.iter().map(|r| r.to_string()).collect(),
            library: None,
            functions: Vec::new(),
            loaded,
            error: None,
        }
    }

    #[test]
    fn test_satisfied_requirements() {
        let mut plugins = PluginTable::new();
        plugins.upsert(record("base", &[], true));
        plugins.upsert(record("k8s", &["base"], true));
        assert!(RequirementValidator::new().validate(&plugins).is_ok());
    }

    #[test]
    fn test_missing_requirement_names_both_sides() {
        let mut plugins = PluginTable::new();
        plugins.upsert(record("k8s", &["base"], true));

        let err = RequirementValidator::new().validate(&plugins).unwrap_err();
        let message = err.to_string();
        assert!(matches!(
            err,
            Error::RequirementUnmet { ref plugin, ref requirement } if plugin == "k8s" && requirement == "base"
        ));
        assert!(message.contains("npm install base"), "{message}");
    }

    #[test]
    fn test_failed_plugin_does_not_satisfy() {
        let mut plugins = PluginTable::new();
        plugins.upsert(record("base", &[], false));
        plugins.upsert(record("k8s", &["base"], true));
        assert!(RequirementValidator::new().validate(&plugins).is_err());
    }

    #[test]
    fn test_failed_plugin_requirements_are_ignored() {
        let mut plugins = PluginTable::new();
        plugins.upsert(record("broken", &["ghost"], false));
        assert!(RequirementValidator::new().validate(&plugins).is_ok());
    }

    #[test]
    fn test_first_unmet_in_load_order() {
        let mut plugins = PluginTable::new();
        plugins.upsert(record("first", &["x"], true));
        plugins.upsert(record("second", &["y"], true));
        let err = RequirementValidator::new().validate(&plugins).unwrap_err();
        assert!(matches!(err, Error::RequirementUnmet { plugin, .. } if plugin == "first"));
    }
}
