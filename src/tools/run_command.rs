//! Run-command tool — allowlisted single commands in the project dir.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};
use crate::util::process::{self, ExecOutcome};

/// Commands are killed after 2 minutes.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Programs a command may start with. The command is split on
/// whitespace and executed without a shell, so there is no pipe or
/// redirection surface.
const ALLOWED_COMMANDS: &[&str] = &["python", "npm", "npx", "uv", "pip", "node", "pytest", "make"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCommandParams {
    /// Project directory relative to the project root.
    pub project_path: String,
    /// Command line, split on whitespace.
    pub command: String,
    /// Extra environment for the process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "run_command".to_owned(),
        description: format!(
            "Run a single command in the project directory (e.g. python main.py, npm start). \
             The command must start with one of: {}.",
            ALLOWED_COMMANDS.join(", ")
        ),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectPath": {
                    "type": "string",
                    "description": "Project directory relative to the project root"
                },
                "command": {
                    "type": "string",
                    "description": "Command line (no shell; split on whitespace)"
                },
                "env": {
                    "type": "object",
                    "description": "Extra environment variables",
                    "additionalProperties": { "type": "string" }
                }
            },
            "required": ["projectPath", "command"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: RunCommandParams =
        serde_json::from_value(arguments).context("invalid run_command parameters")?;

    let root = match paths::resolve_project_path(project_root, &params.project_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    let parts: Vec<&str> = params.command.split_whitespace().collect();
    let allowed = parts
        .first()
        .is_some_and(|p| ALLOWED_COMMANDS.contains(&p.to_lowercase().as_str()));
    if !allowed {
        return Ok(ToolCallResult::error(format!(
            "Command must start with one of: {}",
            ALLOWED_COMMANDS.join(", ")
        )));
    }

    let program = parts[0];
    let args: Vec<String> = parts[1..].iter().map(|s| (*s).to_owned()).collect();

    tracing::info!(project = %root.display(), command = params.command, "run_command");

    match process::run_with_timeout(program, &args, &root, COMMAND_TIMEOUT, &params.env)? {
        ExecOutcome::Completed {
            stdout,
            stderr,
            exit_code,
        } => {
            let text = process::render_output(&stdout, &stderr, exit_code);
            Ok(if exit_code == 0 {
                ToolCallResult::text(text)
            } else {
                ToolCallResult::error(text)
            })
        }
        ExecOutcome::TimedOut => Ok(ToolCallResult::error("Error: command timed out (120s)")),
        ExecOutcome::CommandNotFound => Ok(ToolCallResult::error(format!(
            "Error: command not found ({program})"
        ))),
    }
}
