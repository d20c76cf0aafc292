//! Read-file tool — return a file's content verbatim.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadFileParams {
    /// File path relative to the project root.
    pub path: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "read_file".to_owned(),
        description: "Read a file's content (relative to the project root).".to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the project root"
                }
            },
            "required": ["path"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: ReadFileParams =
        serde_json::from_value(arguments).context("invalid read_file parameters")?;

    let resolved = match paths::resolve_file_path(project_root, &params.path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    if !resolved.exists() {
        return Ok(ToolCallResult::error(format!(
            "Error: File not found: {}",
            params.path
        )));
    }
    if resolved.is_dir() {
        return Ok(ToolCallResult::error(format!(
            "Error: Path is a directory, not a file: {}",
            params.path
        )));
    }

    let bytes = std::fs::read(&resolved)
        .with_context(|| format!("failed to read {}", resolved.display()))?;
    Ok(ToolCallResult::text(
        String::from_utf8_lossy(&bytes).into_owned(),
    ))
}
