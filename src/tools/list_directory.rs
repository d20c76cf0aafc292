//! List-directory tool — one level of entries with type and size.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDirectoryParams {
    /// Directory path relative to the project root.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    ".".to_owned()
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_directory".to_owned(),
        description: "List directory entries with type and size (relative to the project root)."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path relative to the project root (default: \".\")",
                    "default": "."
                }
            }
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: ListDirectoryParams =
        serde_json::from_value(arguments).context("invalid list_directory parameters")?;

    let resolved = match paths::resolve_project_path(project_root, &params.path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    if !resolved.exists() {
        return Ok(ToolCallResult::error(format!(
            "Error: Path does not exist: {}",
            params.path
        )));
    }
    if !resolved.is_dir() {
        return Ok(ToolCallResult::error(format!(
            "Error: Not a directory: {}",
            params.path
        )));
    }

    let entries = std::fs::read_dir(&resolved)
        .with_context(|| format!("failed to read directory {}", resolved.display()))?;

    let mut names: Vec<(String, bool, u64)> = Vec::new();
    for entry in entries {
        let entry = entry.context("failed to read directory entry")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let meta = entry
            .metadata()
            .with_context(|| format!("failed to stat {name}"))?;
        names.push((name, meta.is_dir(), meta.len()));
    }
    names.sort();

    let mut lines = vec![format!("Path: {}", resolved.display())];
    for (name, is_dir, size) in names {
        if is_dir {
            lines.push(format!("  dir: {name}"));
        } else {
            lines.push(format!("  file: {name} ({size} bytes)"));
        }
    }

    Ok(ToolCallResult::text(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonicalize");
        (dir, root)
    }

    #[test]
    fn test_lists_entries_with_type_and_size() {
        let (_dir, root) = root();
        std::fs::write(root.join("a.txt"), "hi").expect("seed");
        std::fs::create_dir(root.join("subdir")).expect("mkdir");

        let result = execute(&root, serde_json::json!({ "path": "." })).expect("execute");
        assert!(!result.is_error);
        let text = &result.content[0].text;
        assert!(text.contains("Path:"));
        assert!(text.contains("file: a.txt"));
        assert!(text.contains("(2 bytes)"));
        assert!(text.contains("dir: subdir"));
    }

    #[test]
    fn test_missing_path() {
        let (_dir, root) = root();
        let result = execute(&root, serde_json::json!({ "path": "nonexistent" })).expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("does not exist"));
    }

    #[test]
    fn test_file_rejected() {
        let (_dir, root) = root();
        std::fs::write(root.join("f.txt"), "x").expect("seed");
        let result = execute(&root, serde_json::json!({ "path": "f.txt" })).expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("Not a directory"));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, root) = root();
        let result = execute(&root, serde_json::json!({ "path": "../../../etc" })).expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("root"));
    }
}
