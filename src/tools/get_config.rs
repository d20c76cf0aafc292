//! Get-config tool — read project metadata from pyproject.toml or
//! package.json.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigParams {
    /// Project directory relative to the project root.
    pub project_path: String,
    /// Config key (case-insensitive; pyproject supports name/version).
    pub key: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_config".to_owned(),
        description: "Read a config value from the project (e.g. pyproject name, \
            package.json name)."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectPath": {
                    "type": "string",
                    "description": "Project directory relative to the project root"
                },
                "key": {
                    "type": "string",
                    "description": "Config key (e.g. \"name\", \"version\")"
                }
            },
            "required": ["projectPath", "key"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: GetConfigParams =
        serde_json::from_value(arguments).context("invalid get_config parameters")?;

    let root = match paths::resolve_project_path(project_root, &params.project_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    let key = params.key.to_lowercase();

    let pyproject = root.join("pyproject.toml");
    if pyproject.exists() && (key == "name" || key == "version") {
        let text = std::fs::read_to_string(&pyproject)
            .with_context(|| format!("failed to read {}", pyproject.display()))?;
        return Ok(ToolCallResult::text(project_table_field(&text, &key)?));
    }

    let package_json = root.join("package.json");
    if package_json.exists() {
        let text = std::fs::read_to_string(&package_json)
            .with_context(|| format!("failed to read {}", package_json.display()))?;
        let data: serde_json::Value =
            serde_json::from_str(&text).context("invalid package.json")?;
        let value = match data.get(&key) {
            None => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        return Ok(ToolCallResult::text(value));
    }

    Ok(ToolCallResult::text(format!(
        "Unknown key or no supported config file: {}",
        params.key
    )))
}

/// Extract `field = "..."` from the `[project]` table. Missing fields
/// yield an empty string, matching what clients expect to interpolate.
fn project_table_field(text: &str, field: &str) -> Result<String> {
    let pattern = format!(r#"(?s)\[project\]\s*\n.*?{field}\s*=\s*["']([^"']+)["']"#);
    let re = regex::Regex::new(&pattern).context("invalid config pattern")?;
    Ok(re
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default())
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
    fn test_pyproject_name() {
        let (_dir, root) = root();
        std::fs::write(
            root.join("pyproject.toml"),
            "[project]\nname = \"my-app\"\nversion = \"1.0.0\"\n",
        )
        .expect("seed");
        let result = execute(&root, serde_json::json!({ "projectPath": ".", "key": "name" }))
            .expect("execute");
        assert_eq!(result.content[0].text, "my-app");
    }

    #[test]
    fn test_pyproject_version() {
        let (_dir, root) = root();
        std::fs::write(
            root.join("pyproject.toml"),
            "[project]\nname = \"my-app\"\nversion = \"1.0.0\"\n",
        )
        .expect("seed");
        let result = execute(&root, serde_json::json!({ "projectPath": ".", "key": "version" }))
            .expect("execute");
        assert_eq!(result.content[0].text, "1.0.0");
    }

    #[test]
    fn test_package_json_key() {
        let (_dir, root) = root();
        std::fs::write(
            root.join("package.json"),
            r#"{"name": "my-node-app", "version": "2.0.0"}"#,
        )
        .expect("seed");
        let result = execute(&root, serde_json::json!({ "projectPath": ".", "key": "name" }))
            .expect("execute");
        assert_eq!(result.content[0].text, "my-node-app");
    }

    #[test]
    fn test_missing_field_is_empty() {
        let (_dir, root) = root();
        std::fs::write(root.join("pyproject.toml"), "[project]\nname = \"x\"\n").expect("seed");
        let result = execute(&root, serde_json::json!({ "projectPath": ".", "key": "version" }))
            .expect("execute");
        assert_eq!(result.content[0].text, "");
    }

    #[test]
    fn test_no_config_file() {
        let (_dir, root) = root();
        let result = execute(&root, serde_json::json!({ "projectPath": ".", "key": "name" }))
            .expect("execute");
        assert!(result.content[0].text.contains("no supported config file"));
    }
}
