//! Create-project tool — materialize a template into the project root.
//!
//! Copies `artifacts/{context}/templates/{templateId}` to the target
//! directory. When `variables` are given, `{{key}}` placeholders are
//! substituted in both file paths and the contents of text files;
//! unknown keys are left untouched.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::artifacts;
use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};

/// Extensions treated as text for variable substitution; everything
/// else is copied byte-for-byte.
const TEXT_EXTENSIONS: &[&str] = &[
    "py", "ts", "tsx", "js", "jsx", "json", "toml", "yaml", "yml", "md", "html", "css", "sh",
    "txt", "cfg", "ini",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectParams {
    /// Template directory name under `{context}/templates/`.
    pub template_id: String,
    /// Target directory (relative to the project root).
    pub target_path: String,
    /// Artifact context to pull the template from.
    #[serde(default = "default_context")]
    pub context: String,
    /// `{{key}}` → value substitutions.
    #[serde(default)]
    pub variables: HashMap<String, String>,
}

fn default_context() -> String {
    "default".to_owned()
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "create_project".to_owned(),
        description: "Create a project from a template. Use variables for {{key}} substitution."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "templateId": {
                    "type": "string",
                    "description": "Template name (e.g. \"fastapi-app\")"
                },
                "targetPath": {
                    "type": "string",
                    "description": "Target directory relative to the project root"
                },
                "context": {
                    "type": "string",
                    "description": "Artifact context (default: \"default\")",
                    "default": "default"
                },
                "variables": {
                    "type": "object",
                    "description": "Values substituted for {{key}} placeholders",
                    "additionalProperties": { "type": "string" }
                }
            },
            "required": ["templateId", "targetPath"]
        }),
    }
}

pub fn execute(
    project_root: &Path,
    artifacts_root: &Path,
    arguments: serde_json::Value,
) -> Result<ToolCallResult> {
    let params: CreateProjectParams =
        serde_json::from_value(arguments).context("invalid create_project parameters")?;

    tracing::info!(
        template_id = params.template_id,
        target_path = params.target_path,
        context = params.context,
        "create_project"
    );

    let target = match paths::resolve_file_path(project_root, &params.target_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    let template_ref = format!("{}/templates/{}", params.context, params.template_id);
    let template_dir = match paths::resolve_project_path(artifacts_root, &template_ref) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };
    if !template_dir.is_dir() {
        return Ok(ToolCallResult::error(format!(
            "Template not found: {}/{}",
            params.context, params.template_id
        )));
    }

    std::fs::create_dir_all(&target)
        .with_context(|| format!("failed to create target directory {}", target.display()))?;

    let mut files = Vec::new();
    artifacts::collect_files(&template_dir, &template_dir, 0, &mut files);
    files.sort();

    for rel in files {
        let rel_out = if params.variables.is_empty() {
            rel.clone()
        } else {
            substitute_vars(&rel, &params.variables)
        };

        // Substituted names still have to land inside the target.
        let dest = match paths::resolve_file_path(&target, &rel_out) {
            Ok(p) => p,
            Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
        };
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let src = template_dir.join(&rel);
        if !params.variables.is_empty() && is_text_file(&rel) {
            let bytes = std::fs::read(&src)
                .with_context(|| format!("failed to read template file {}", src.display()))?;
            let content = substitute_vars(&String::from_utf8_lossy(&bytes), &params.variables);
            std::fs::write(&dest, content)
                .with_context(|| format!("failed to write {}", dest.display()))?;
        } else {
            std::fs::copy(&src, &dest).with_context(|| {
                format!("failed to copy {} to {}", src.display(), dest.display())
            })?;
        }
    }

    Ok(ToolCallResult::text(format!(
        "Created project at {} from template {}/{}",
        target.display(),
        params.context,
        params.template_id
    )))
}

/// Replace `{{key}}` with `variables[key]`; unknown keys stay as-is.
fn substitute_vars(text: &str, variables: &HashMap<String, String>) -> String {
    let mut out = text.to_owned();
    for (key, value) in variables {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

fn is_text_file(rel: &str) -> bool {
    Path::new(rel)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str())
        })
}
