//! Error types for stave-plugins

use stave_fs::NormalizedPath;

use crate::callable::CallError;

/// Result type for stave-plugins operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while discovering, loading, and dispatching extensions.
///
/// Resolution and load failures are recovered inside the walker and the
/// local compiler, and only surface here when a caller asks for them
/// directly. The remaining variants end the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] stave_manifest::Error),

    #[error(transparent)]
    Fs(#[from] stave_fs::Error),

    /// A declared dependency could not be found from its anchor directory.
    #[error("dependency '{name}' not found from {anchor}")]
    DependencyNotFound {
        name: String,
        anchor: NormalizedPath,
    },

    /// A loaded plugin requires another plugin that is not loaded.
    #[error(
        "plugin '{plugin}' requires '{requirement}', which is not installed\n  hint: run `npm install {requirement}` in the project root"
    )]
    RequirementUnmet { plugin: String, requirement: String },

    #[error("invalid {key} in stave.toml: {message}")]
    InvalidConfig { key: String, message: String },

    /// A native function raised an error.
    #[error("native function '{name}' failed: {source}")]
    Call {
        name: String,
        #[source]
        source: CallError,
    },

    #[error("unknown native function '{0}'")]
    UnknownFunction(String),

    #[error("native function '{0}' is already registered")]
    DuplicateFunction(String),

    /// A generated artifact could not be written or removed.
    #[error("failed to write generated artifact {path}: {source}")]
    ArtifactWrite {
        path: NormalizedPath,
        #[source]
        source: stave_fs::Error,
    },

    #[error("init hook from '{owner}' failed: {source}")]
    InitHook {
        owner: String,
        #[source]
        source: CallError,
    },

    #[error("cli hook from '{owner}' failed: {source}")]
    CliHook {
        owner: String,
        #[source]
        source: CallError,
    },

    #[error("no handler for output file '{file}'")]
    NoFileHandler { file: String },

    #[error("output file name '{file}' must be relative and stay inside the output directory")]
    InvalidOutputPath { file: String },

    #[error("output must be an object mapping file names to values, got {found}")]
    InvalidOutputTree { found: String },

    #[error("file handler for '{file}' returned {found}, expected a string")]
    HandlerOutput { file: String, found: String },

    #[error("failed to serialize '{file}': {message}")]
    Serialize { file: String, message: String },

    /// The evaluation engine reported an error.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Short JSON type name for error messages.
pub(crate) fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
