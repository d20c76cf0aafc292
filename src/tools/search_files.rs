//! Search-files tool — regex search across project files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::paths;
use crate::server::{ToolCallResult, ToolDefinition};

/// Maximum recursion depth for the search walker.
const MAX_WALK_DEPTH: usize = 50;

const fn default_max_results() -> usize { 100 }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilesParams {
    /// Directory to search, relative to the project root.
    pub project_path: String,
    /// Regex pattern matched against each line.
    pub pattern: String,
    /// Optional filename glob (e.g. "*.py").
    #[serde(default)]
    pub include: Option<String>,
    /// Maximum number of matching lines.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "search_files".to_owned(),
        description: "Search project files for a regex pattern. Returns path:line:content \
            matches."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "projectPath": {
                    "type": "string",
                    "description": "Directory to search, relative to the project root"
                },
                "pattern": {
                    "type": "string",
                    "description": "Regex pattern matched against each line"
                },
                "include": {
                    "type": "string",
                    "description": "Filename glob filter (e.g. \"*.py\")"
                },
                "maxResults": {
                    "type": "integer",
                    "description": "Maximum number of matching lines (default: 100)",
                    "default": 100
                }
            },
            "required": ["projectPath", "pattern"]
        }),
    }
}

pub fn execute(project_root: &Path, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: SearchFilesParams =
        serde_json::from_value(arguments).context("invalid search_files parameters")?;

    let root = match paths::resolve_project_path(project_root, &params.project_path) {
        Ok(p) => p,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: {e}"))),
    };

    let re = match regex::Regex::new(&params.pattern) {
        Ok(re) => re,
        Err(e) => return Ok(ToolCallResult::error(format!("Error: invalid regex: {e}"))),
    };

    let include = match &params.include {
        None => None,
        Some(glob) => match globset::GlobBuilder::new(glob)
            .literal_separator(false)
            .build()
        {
            Ok(g) => Some(g.compile_matcher()),
            Err(e) => {
                return Ok(ToolCallResult::error(format!(
                    "Error: invalid include glob: {e}"
                )));
            }
        },
    };

    let mut files = Vec::new();
    collect_candidates(&root, &root, 0, &mut files);
    files.sort();

    let mut matches = Vec::new();
    'outer: for rel in files {
        if let Some(matcher) = &include {
            if !matcher.is_match(&rel) {
                continue;
            }
        }
        let Ok(bytes) = std::fs::read(root.join(&rel)) else {
            continue;
        };
        // Binary files (NUL bytes) are skipped.
        if bytes.contains(&0) {
            continue;
        }
        let content = String::from_utf8_lossy(&bytes);
        for (idx, line) in content.lines().enumerate() {
            if re.is_match(line) {
                matches.push(format!("{rel}:{}:{line}", idx + 1));
                if matches.len() >= params.max_results {
                    break 'outer;
                }
            }
        }
    }

    if matches.is_empty() {
        return Ok(ToolCallResult::text("(no matches)"));
    }
    Ok(ToolCallResult::text(matches.join("\n")))
}

/// Collect relative file paths, skipping hidden entries and common
/// build noise. `entry.file_type()` does not follow symlinks, and the
/// depth limit prevents loops.
fn collect_candidates(root: &Path, dir: &Path, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_WALK_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(std::result::Result::ok) {
        let path = entry.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') || name == "node_modules" || name == "target" {
                continue;
            }
        }
        let Ok(ft) = entry.file_type() else { continue };
        if ft.is_dir() {
            collect_candidates(root, &path, depth + 1, out);
        } else if ft.is_file() {
            if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.display().to_string());
            }
        }
        // Symlinks are skipped.
    }
}
