use std::path::PathBuf;

/// Errors that can occur while reading manifests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Manifest file not found at the expected path.
    #[error("manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    /// Failed to parse manifest JSON.
    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid package name.
    #[error("invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A path declared in the manifest escapes the package directory.
    #[error("invalid {field} '{path}' in package '{package}': must be relative and stay inside the package")]
    InvalidPath {
        package: String,
        field: &'static str,
        path: String,
    },

    /// Filesystem error.
    #[error(transparent)]
    Fs(#[from] stave_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
