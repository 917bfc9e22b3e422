//! Package manifest parsing for Stave extensions.
//!
//! A package becomes a Stave extension by carrying a [`EXTENSION_KEY`]
//! object in its `package.json`. This crate reads manifests, preserves
//! dependency declaration order, and validates the extension marker.

pub mod dependencies;
pub mod error;
pub mod manifest;

/// The `package.json` key that marks a package as a Stave extension.
pub const EXTENSION_KEY: &str = "stave";

/// Entry file used when a manifest declares no `main`.
pub const DEFAULT_ENTRY: &str = "index.js";

pub use dependencies::DependencyList;
pub use error::{Error, Result};
pub use manifest::{ExtensionMetadata, ManifestReader, ManifestRecord, validate_package_name};
