//! Update-config tool — set name or version in pyproject.toml or
//! package.json.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::atomic::atomic_write;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConfigParams {
    /// Project directory relative to the project root.
    pub project_path: String,
    /// Config key; only `name` and `version` are supported.
    pub key: String,
    /// New value.
    pub value: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "update_config".to_owned(),
        description: "Update name or version in pyproject.toml or package.json.".to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectPath": {
                    "type": "string",
                    "description": "Project directory relative to the project root"
                },
                "key": {
                    "type": "string",
                    "description": "Config key (\"name\" or \"version\")"
                },
                "value": {
                    "type": "string",
                    "description": "New value"
                }
            },
            "required": ["projectPath", "key", "value"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: UpdateConfigParams =
        serde_json::from_value(arguments).context("invalid update_config parameters")?;

    let root = match paths::resolve_project_path(project_root, &params.project_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    let key = params.key.to_lowercase();
    if key != "name" && key != "version" {
        return Ok(ToolCallResult::error(
            "Only name and version are supported for update_config",
        ));
    }

    let pyproject = root.join("pyproject.toml");
    if pyproject.exists() {
        let content = std::fs::read_to_string(&pyproject)
            .with_context(|| format!("failed to read {}", pyproject.display()))?;

        // Line-based replace of the first `name = "..."` / `version = "..."`.
        let pattern = format!(r#"(?m)^(\s*{key}\s*=\s*)["'].*?["']"#);
        let re = regex::Regex::new(&pattern).context("invalid config pattern")?;
        let updated = re.replace(&content, |caps: &regex::Captures| {
            format!("{}\"{}\"", &caps[1], params.value)
        });

        if updated == content {
            return Ok(ToolCallResult::error(format!(
                "Could not find {} in pyproject.toml",
                params.key
            )));
        }
        atomic_write(&pyproject, &updated)?;
        return Ok(ToolCallResult::text(format!(
            "Updated {}={} in pyproject.toml",
            params.key, params.value
        )));
    }

    let package_json = root.join("package.json");
    if package_json.exists() {
        let text = std::fs::read_to_string(&package_json)
            .with_context(|| format!("failed to read {}", package_json.display()))?;
        let mut data: serde_json::Value =
            serde_json::from_str(&text).context("invalid package.json")?;
        let Some(map) = data.as_object_mut() else {
            return Ok(ToolCallResult::error("Error: package.json is not a JSON object"));
        };
        map.insert(key, serde_json::Value::String(params.value.clone()));
        let rendered = format!("{}\n", serde_json::to_string_pretty(&data)?);
        atomic_write(&package_json, &rendered)?;
        return Ok(ToolCallResult::text(format!(
            "Updated {}={} in package.json",
            params.key, params.value
        )));
    }

    Ok(ToolCallResult::error("No pyproject.toml or package.json found"))
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
    fn test_updates_pyproject_name() {
        let (_dir, root) = root();
        std::fs::write(
            root.join("pyproject.toml"),
            "[project]\nname = \"old\"\nversion = \"0.1.0\"\n",
        )
        .expect("seed");
        let result = execute(
            &root,
            serde_json::json!({ "projectPath": ".", "key": "name", "value": "new-name" }),
        )
        .expect("execute");
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("Updated"));
        let text = std::fs::read_to_string(root.join("pyproject.toml")).expect("read");
        assert!(text.contains("name = \"new-name\""));
        assert!(text.contains("version = \"0.1.0\""));
    }

    #[test]
    fn test_updates_only_first_match() {
        let (_dir, root) = root();
        std::fs::write(
            root.join("pyproject.toml"),
            "[project]\nversion = \"1.0\"\n\n[tool.other]\nversion = \"9.9\"\n",
        )
        .expect("seed");
        execute(
            &root,
            serde_json::json!({ "projectPath": ".", "key": "version", "value": "2.0" }),
        )
        .expect("execute");
        let text = std::fs::read_to_string(root.join("pyproject.toml")).expect("read");
        assert!(text.contains("version = \"2.0\""));
        assert!(text.contains("version = \"9.9\""));
    }

    #[test]
    fn test_updates_package_json() {
        let (_dir, root) = root();
        std::fs::write(root.join("package.json"), r#"{"name": "old", "version": "1.0.0"}"#)
            .expect("seed");
        let result = execute(
            &root,
            serde_json::json!({ "projectPath": ".", "key": "version", "value": "2.0.0" }),
        )
        .expect("execute");
        assert!(result.content[0].text.contains("Updated version=2.0.0 in package.json"));
        let data: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(root.join("package.json")).expect("read"),
        )
        .expect("parse");
        assert_eq!(data["version"], "2.0.0");
        assert_eq!(data["name"], "old");
    }

    #[test]
    fn test_rejects_unsupported_key() {
        let (_dir, root) = root();
        std::fs::write(root.join("pyproject.toml"), "[project]\nname = \"p\"\n").expect("seed");
        let result = execute(
            &root,
            serde_json::json!({ "projectPath": ".", "key": "dependencies", "value": "[]" }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("Only name and version"));
    }

    #[test]
    fn test_key_not_present_in_pyproject() {
        let (_dir, root) = root();
        std::fs::write(root.join("pyproject.toml"), "[project]\nname = \"p\"\n").expect("seed");
        let result = execute(
            &root,
            serde_json::json!({ "projectPath": ".", "key": "version", "value": "1.0" }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("Could not find version"));
    }

    #[test]
    fn test_no_config_files() {
        let (_dir, root) = root();
        let result = execute(
            &root,
            serde_json::json!({ "projectPath": ".", "key": "name", "value": "x" }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("No pyproject.toml or package.json"));
    }
}
