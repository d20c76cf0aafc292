//! Edit-file tool — exact string replacement with a diff summary.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use similar::{Algorithm, TextDiff};

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::atomic::atomic_write;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditFileParams {
    /// File path relative to the project root.
    pub path: String,
    /// Exact text to replace.
    pub old_string: String,
    /// Replacement text.
    pub new_string: String,
    /// Replace every occurrence instead of just the first.
    #[serde(default)]
    pub replace_all: bool,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "edit_file".to_owned(),
        description: "Replace an exact string in a file. Replaces the first occurrence \
            unless replaceAll is set."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the project root"
                },
                "oldString": {
                    "type": "string",
                    "description": "Exact text to replace"
                },
                "newString": {
                    "type": "string",
                    "description": "Replacement text"
                },
                "replaceAll": {
                    "type": "boolean",
                    "description": "Replace all occurrences (default: false)",
                    "default": false
                }
            },
            "required": ["path", "oldString", "newString"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: EditFileParams =
        serde_json::from_value(arguments).context("invalid edit_file parameters")?;

    let resolved = match paths::resolve_file_path(project_root, &params.path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    if !resolved.is_file() {
        return Ok(ToolCallResult::error(format!(
            "Error: File not found: {}",
            params.path
        )));
    }
    if params.old_string.is_empty() {
        return Ok(ToolCallResult::error("Error: old_string must not be empty"));
    }

    let bytes = std::fs::read(&resolved)
        .with_context(|| format!("failed to read {}", resolved.display()))?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    let occurrences = content.matches(&params.old_string).count();
    if occurrences == 0 {
        return Ok(ToolCallResult::error(format!(
            "Error: old_string not found in {}",
            params.path
        )));
    }

    let (updated, replaced) = if params.replace_all {
        (
            content.replace(&params.old_string, &params.new_string),
            occurrences,
        )
    } else {
        (
            content.replacen(&params.old_string, &params.new_string, 1),
            1,
        )
    };

    atomic_write(&resolved, &updated)?;

    // Patience diff reads better than Myers for source edits.
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Patience)
        .diff_lines(&content, &updated)
        .unified_diff()
        .header(&format!("a/{}", params.path), &format!("b/{}", params.path))
        .to_string();

    Ok(ToolCallResult::text(format!(
        "Replaced {replaced} occurrence(s) in {}\n\n{diff}",
        params.path
    )))
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
    fn test_replaces_first_occurrence() {
        let (_dir, root) = root();
        std::fs::write(root.join("f.txt"), "a a a").expect("seed");
        let result = execute(
            &root,
            serde_json::json!({ "path": "f.txt", "oldString": "a", "newString": "b" }),
        )
        .expect("execute");
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("Replaced 1 occurrence"));
        assert_eq!(std::fs::read_to_string(root.join("f.txt")).expect("read"), "b a a");
    }

    #[test]
    fn test_replace_all() {
        let (_dir, root) = root();
        std::fs::write(root.join("f.txt"), "x x x").expect("seed");
        let result = execute(
            &root,
            serde_json::json!({
                "path": "f.txt",
                "oldString": "x",
                "newString": "y",
                "replaceAll": true
            }),
        )
        .expect("execute");
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("Replaced 3 occurrence"));
        assert_eq!(std::fs::read_to_string(root.join("f.txt")).expect("read"), "y y y");
    }

    #[test]
    fn test_includes_diff() {
        let (_dir, root) = root();
        std::fs::write(root.join("f.txt"), "hello world\n").expect("seed");
        let result = execute(
            &root,
            serde_json::json!({ "path": "f.txt", "oldString": "world", "newString": "there" }),
        )
        .expect("execute");
        assert!(result.content[0].text.contains("-hello world"));
        assert!(result.content[0].text.contains("+hello there"));
    }

    #[test]
    fn test_old_string_not_found_leaves_file_unchanged() {
        let (_dir, root) = root();
        std::fs::write(root.join("f.txt"), "hello").expect("seed");
        let result = execute(
            &root,
            serde_json::json!({ "path": "f.txt", "oldString": "xyz", "newString": "y" }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("not found"));
        assert_eq!(std::fs::read_to_string(root.join("f.txt")).expect("read"), "hello");
    }

    #[test]
    fn test_missing_file() {
        let (_dir, root) = root();
        let result = execute(
            &root,
            serde_json::json!({ "path": "nope.txt", "oldString": "x", "newString": "y" }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("File not found"));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, root) = root();
        let result = execute(
            &root,
            serde_json::json!({
                "path": "../../../etc/passwd",
                "oldString": "x",
                "newString": "y"
            }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("root"));
    }
}
