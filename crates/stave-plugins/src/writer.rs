//! Writing evaluated output trees to disk.
//!
//! An output tree is a JSON object mapping file names to values. Each value
//! is serialized according to the file's extension: plugin file-type handlers
//! first, then the built-in `json` and `yaml`/`yml` serializers. Strings with
//! no handler are written verbatim.

use std::path::{Component, Path};

use serde_json::Value;
use stave_fs::{NormalizedPath, io};

use crate::callable::SharedContext;
use crate::error::{Error, Result, value_kind};
use crate::hooks::HookTable;

/// Serializes output values using built-in and plugin file handlers.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    hooks: HookTable,
    context: SharedContext,
}

impl OutputWriter {
    pub fn new(hooks: HookTable, context: SharedContext) -> Self {
        Self { hooks, context }
    }

    /// Serialize `value` for the file named `file`.
    pub fn render_file(&self, file: &str, value: &Value) -> Result<String> {
        let extension = NormalizedPath::new(file)
            .extension()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if let Some(handler) = self.hooks.file_handler(&extension) {
            let args = [value.clone(), Value::String(file.to_string())];
            let output = handler
                .callable
                .call(&mut self.context.borrow_mut(), &args)
                .map_err(|source| Error::Call {
                    name: format!("{} file handler for .{extension}", handler.owner),
                    source,
                })?;
            return match output {
                Value::String(text) => Ok(text),
                other => Err(Error::HandlerOutput {
                    file: file.to_string(),
                    found: value_kind(&other).to_string(),
                }),
            };
        }

        let serialize_error = |message: String| Error::Serialize {
            file: file.to_string(),
            message,
        };
        match extension.as_str() {
            "json" => serde_json::to_string_pretty(value)
                .map(|text| text + "\n")
                .map_err(|e| serialize_error(e.to_string())),
            "yaml" | "yml" => serde_yaml::to_string(value).map_err(|e| serialize_error(e.to_string())),
            _ => match value {
                Value::String(text) => Ok(text.clone()),
                _ => Err(Error::NoFileHandler {
                    file: file.to_string(),
                }),
            },
        }
    }

    /// Write every file of `tree` under `out_dir`. Returns the written paths
    /// in file-name order.
    pub fn write_tree(&self, tree: &Value, out_dir: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
        let Value::Object(files) = tree else {
            return Err(Error::InvalidOutputTree {
                found: value_kind(tree).to_string(),
            });
        };

        // Render everything before touching the disk.
        let mut rendered = Vec::with_capacity(files.len());
        for (file, value) in files {
            ensure_relative(file)?;
            rendered.push((out_dir.join(file), self.render_file(file, value)?));
        }

        let mut written = Vec::with_capacity(rendered.len());
        for (path, content) in rendered {
            io::write_text(&path, &content)?;
            tracing::debug!(path = %path, bytes = content.len(), "wrote output file");
            written.push(path);
        }
        tracing::info!(files = written.len(), out_dir = %out_dir, "wrote output tree");
        Ok(written)
    }
}

fn ensure_relative(file: &str) -> Result<()> {
    let path = Path::new(file);
    let confined = !file.is_empty()
        && !file.contains('\\')
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if confined {
        Ok(())
    } else {
        Err(Error::InvalidOutputPath {
            file: file.to_string(),
        })
    }
}
