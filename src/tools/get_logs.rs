//! Get-logs tool — tail `.log` files found under the project.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};

/// At most this many log files are reported per call.
const MAX_LOG_FILES: usize = 5;
/// Hard cap on tail length, whatever the client asks for.
const MAX_TAIL_LINES: usize = 500;
/// Recursion cap for the log file walk.
const MAX_WALK_DEPTH: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLogsParams {
    /// Project directory relative to the project root.
    pub project_path: String,
    /// Log source; accepted for API compatibility (files are the only
    /// source today).
    #[serde(default = "default_source")]
    pub source: String,
    /// Tail length per file (default 50, capped at 500).
    #[serde(default)]
    pub lines: Option<usize>,
}

fn default_source() -> String {
    "stdout".to_owned()
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "get_logs".to_owned(),
        description: "Read recent log content from the project (tails up to five .log files)."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectPath": {
                    "type": "string",
                    "description": "Project directory relative to the project root"
                },
                "source": {
                    "type": "string",
                    "description": "Log source (default: \"stdout\")",
                    "default": "stdout"
                },
                "lines": {
                    "type": "integer",
                    "description": "Tail length per file (default: 50, max: 500)",
                    "default": 50
                }
            },
            "required": ["projectPath"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: GetLogsParams =
        serde_json::from_value(arguments).context("invalid get_logs parameters")?;

    let root = match paths::resolve_project_path(project_root, &params.project_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    let n = params.lines.unwrap_or(50).min(MAX_TAIL_LINES);

    let mut log_files = Vec::new();
    collect_log_files(&root, 0, &mut log_files);
    log_files.sort();
    log_files.truncate(MAX_LOG_FILES);

    if log_files.is_empty() {
        return Ok(ToolCallResult::text("No .log files found in project"));
    }

    let mut sections = Vec::new();
    for log_path in log_files {
        let rel = log_path
            .strip_prefix(&root)
            .unwrap_or(&log_path)
            .display()
            .to_string();
        match std::fs::read(&log_path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                let all: Vec<&str> = content.lines().collect();
                let tail = &all[all.len().saturating_sub(n)..];
                sections.push(format!("## {rel}\n{}", tail.join("\n")));
            }
            Err(_) => sections.push(format!("## {rel} (unreadable)")),
        }
    }

    Ok(ToolCallResult::text(sections.join("\n\n")))
}

fn collect_log_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_WALK_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        let Ok(ft) = entry.file_type() else { continue };
        if ft.is_dir() {
            collect_log_files(&path, depth + 1, out);
        } else if ft.is_file() && path.extension().is_some_and(|e| e == "log") {
            out.push(path);
        }
    }
}
