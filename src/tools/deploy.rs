//! Deploy tool — run the project's deploy script or make/npm target.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::process::{self, ExecOutcome};

/// Deploys are killed after 10 minutes.
const DEPLOY_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    /// Explicit deploy program; overrides Makefile/package.json detection.
    #[serde(default)]
    pub script: Option<String>,
    /// Extra environment for the deploy process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployParams {
    /// Project directory relative to the project root.
    pub project_path: String,
    /// Deployment target label (echoed back in the output).
    pub target: String,
    #[serde(default)]
    pub options: DeployOptions,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "deploy".to_owned(),
        description: "Trigger deployment for a project (runs deploy script, make deploy, \
            or npm run deploy)."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectPath": {
                    "type": "string",
                    "description": "Project directory relative to the project root"
                },
                "target": {
                    "type": "string",
                    "description": "Deployment target label (e.g. \"staging\", \"prod\")"
                },
                "options": {
                    "type": "object",
                    "properties": {
                        "script": {
                            "type": "string",
                            "description": "Explicit deploy program to run"
                        },
                        "env": {
                            "type": "object",
                            "description": "Extra environment variables",
                            "additionalProperties": { "type": "string" }
                        }
                    }
                }
            },
            "required": ["projectPath", "target"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: DeployParams =
        serde_json::from_value(arguments).context("invalid deploy parameters")?;

    let root = match paths::resolve_project_path(project_root, &params.project_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    // Prefer an explicit script; else make deploy, else npm run deploy.
    let (program, args): (String, Vec<String>) = if let Some(script) = &params.options.script {
        (script.clone(), Vec::new())
    } else if root.join("Makefile").exists() {
        ("make".to_owned(), vec!["deploy".to_owned()])
    } else if root.join("package.json").exists() {
        ("npm".to_owned(), vec!["run".to_owned(), "deploy".to_owned()])
    } else {
        return Ok(ToolCallResult::text(
            "No deploy script found (set options.script or add Makefile/package.json deploy target)",
        ));
    };

    tracing::info!(project = %root.display(), target = params.target, program, "deploy");

    match process::run_with_timeout(&program, &args, &root, DEPLOY_TIMEOUT, &params.options.env)? {
        ExecOutcome::Completed {
            stdout,
            stderr,
            exit_code,
        } => {
            let text = format!(
                "Target: {}\n{}",
                params.target,
                process::render_output(&stdout, &stderr, exit_code)
            );
            Ok(if exit_code == 0 {
                ToolCallResult::text(text)
            } else {
                ToolCallResult::error(text)
            })
        }
        ExecOutcome::TimedOut => Ok(ToolCallResult::error("Error: deploy timed out (600s)")),
        ExecOutcome::CommandNotFound => Ok(ToolCallResult::error(format!(
            "Error: command not found ({program})"
        ))),
    }
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
    fn test_no_deploy_script() {
        let (_dir, root) = root();
        std::fs::create_dir(root.join("empty")).expect("mkdir");
        let result = execute(
            &root,
            serde_json::json!({ "projectPath": "empty", "target": "prod" }),
        )
        .expect("execute");
        assert!(!result.is_error);
        assert!(result.content[0].text.contains("No deploy script found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_explicit_script_runs_with_env() {
        let (_dir, root) = root();
        let script = root.join("deploy.sh");
        std::fs::write(&script, "#!/bin/sh\nprintf 'deployed %s' \"$DEPLOY_REGION\"\n")
            .expect("seed");
        let mut perms = std::fs::metadata(&script).expect("stat").permissions();
        std::os::unix::fs::PermissionsExt::set_mode(&mut perms, 0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");

        let result = execute(
            &root,
            serde_json::json!({
                "projectPath": ".",
                "target": "staging",
                "options": {
                    "script": script.display().to_string(),
                    "env": { "DEPLOY_REGION": "eu-1" }
                }
            }),
        )
        .expect("execute");
        assert!(!result.is_error, "output: {}", result.content[0].text);
        let text = &result.content[0].text;
        assert!(text.starts_with("Target: staging\n"));
        assert!(text.contains("deployed eu-1"));
    }

    #[test]
    fn test_missing_script_program() {
        let (_dir, root) = root();
        let result = execute(
            &root,
            serde_json::json!({
                "projectPath": ".",
                "target": "prod",
                "options": { "script": "no-such-deploy-program-xyz" }
            }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("command not found"));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, root) = root();
        let result = execute(
            &root,
            serde_json::json!({ "projectPath": "../..", "target": "prod" }),
        )
        .expect("execute");
        assert!(result.is_error);
        assert!(result.content[0].text.contains("root"));
    }
}
