//! Write-file tool — create or overwrite a file under the project root.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::atomic::atomic_write;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFileParams {
    /// File path relative to the project root.
    pub path: String,
    /// Full file content.
    pub content: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "write_file".to_owned(),
        description: "Write or overwrite a file at path (relative to the project root). \
            Parent directories are created as needed."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the project root"
                },
                "content": {
                    "type": "string",
                    "description": "Full content to write"
                }
            },
            "required": ["path", "content"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: WriteFileParams =
        serde_json::from_value(arguments).context("invalid write_file parameters")?;

    tracing::info!(path = params.path, "write_file");

    let resolved = match paths::resolve_file_path(project_root, &params.path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    if let Some(parent) = resolved.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    atomic_write(&resolved, &params.content)?;

    Ok(ToolCallResult::text(format!("Wrote {}", resolved.display())))
}
