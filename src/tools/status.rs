//! Status tool — detected project type plus a top-level listing.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};

/// Cap on listed top-level entries.
const MAX_ENTRIES: usize = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusParams {
    /// Project directory relative to the project root.
    pub project_path: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "status".to_owned(),
        description: "Return project status: detected type, key files, and a top-level listing."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectPath": {
                    "type": "string",
                    "description": "Project directory relative to the project root"
                }
            },
            "required": ["projectPath"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: StatusParams =
        serde_json::from_value(arguments).context("invalid status parameters")?;

    let root = match paths::resolve_project_path(project_root, &params.project_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    if !root.exists() {
        return Ok(ToolCallResult::text("Project path does not exist"));
    }

    let mut lines = vec![format!("Path: {}", root.display()), "Detected:".to_owned()];
    if root.join("pyproject.toml").exists() {
        lines.push("  - Python (pyproject.toml)".to_owned());
    }
    if root.join("package.json").exists() {
        lines.push("  - Node (package.json)".to_owned());
    }
    if root.join("Dockerfile").exists() {
        lines.push("  - Dockerfile present".to_owned());
    }

    lines.push("Top-level files:".to_owned());
    let entries = std::fs::read_dir(&root)
        .with_context(|| format!("failed to read directory {}", root.display()))?;
    let mut names: Vec<(String, bool)> = Vec::new();
    for entry in entries.filter_map(std::result::Result::ok) {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        names.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
    }
    names.sort();
    for (name, is_dir) in names.into_iter().take(MAX_ENTRIES) {
        let kind = if is_dir { "dir" } else { "file" };
        lines.push(format!("  {kind}: {name}"));
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
    fn test_detects_python_project() {
        let (_dir, root) = root();
        std::fs::write(
            root.join("pyproject.toml"),
            "[project]\nname = \"p\"\nversion = \"0.1.0\"\n",
        )
        .expect("seed");

        let result = execute(&root, serde_json::json!({ "projectPath": "." })).expect("execute");
        assert!(!result.is_error);
        let text = &result.content[0].text;
        assert!(text.contains("Path:"));
        assert!(text.contains("Python (pyproject.toml)"));
        assert!(text.contains("file: pyproject.toml"));
    }

    #[test]
    fn test_detects_node_and_dockerfile() {
        let (_dir, root) = root();
        std::fs::write(root.join("package.json"), "{}").expect("seed");
        std::fs::write(root.join("Dockerfile"), "FROM scratch\n").expect("seed");

        let result = execute(&root, serde_json::json!({ "projectPath": "." })).expect("execute");
        let text = &result.content[0].text;
        assert!(text.contains("Node (package.json)"));
        assert!(text.contains("Dockerfile present"));
    }

    #[test]
    fn test_nonexistent_path() {
        let (_dir, root) = root();
        let result = execute(&root, serde_json::json!({ "projectPath": "nonexistent-dir-xyz" }))
            .expect("execute");
        assert_eq!(result.content[0].text, "Project path does not exist");
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, root) = root();
        let result = execute(&root, serde_json::json!({ "projectPath": "../.." }))
            .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("root"));
    }
}
