//! MCP tools — project lifecycle operations.
//!
//! One module per tool. Each module exposes `tool_definition()` (the
//! name/description/JSON-schema triple for `tools/list`) and
//! `execute()` (the `tools/call` body). Every tool that touches the
//! filesystem resolves client paths through [`crate::paths`] first;
//! user-facing failures come back as `isError` results, not protocol
//! errors.

pub mod create_project;
pub mod deploy;
pub mod edit_file;
pub mod get_config;
pub mod get_logs;
pub mod list_artifacts;
pub mod list_directory;
pub mod read_file;
pub mod run_command;
pub mod search_files;
pub mod status;
pub mod update_config;
pub mod write_file;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::artifacts::ArtifactStore;
use crate::server::{ToolCallResult, ToolDefinition};

/// Routes tool calls to implementations.
///
/// Holds the project root (the jail for all project-facing tools), the
/// artifact root (templates for `create_project`), and the artifact
/// store shared with the resource provider.
pub struct ToolRouter {
    project_root: PathBuf,
    artifacts_root: PathBuf,
    store: Arc<dyn ArtifactStore>,
}

impl ToolRouter {
    pub fn new(project_root: PathBuf, artifacts_root: PathBuf, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            project_root,
            artifacts_root,
            store,
        }
    }

    /// All tool definitions, in the order clients see them.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        vec![
            create_project::tool_definition(),
            write_file::tool_definition(),
            read_file::tool_definition(),
            edit_file::tool_definition(),
            list_directory::tool_definition(),
            search_files::tool_definition(),
            run_tests::tool_definition(),
            deploy::tool_definition(),
            run_command::tool_definition(),
            status::tool_definition(),
            get_logs::tool_definition(),
            get_config::tool_definition(),
            update_config::tool_definition(),
            list_artifacts::tool_definition(),
        ]
    }

    /// Execute a tool by name.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tool names or invalid parameter
    /// shapes; the caller turns these into `isError` results.
    pub fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolCallResult> {
        match name {
            "create_project" => {
                create_project::execute(&self.project_root, &self.artifacts_root, arguments)
            }
            "write_file" => write_file::execute(&self.project_root, arguments),
            "read_file" => read_file::execute(&self.project_root, arguments),
            "edit_file" => edit_file::execute(&self.project_root, arguments),
            "list_directory" => list_directory::execute(&self.project_root, arguments),
            "search_files" => search_files::execute(&self.project_root, arguments),
            "run_tests" => run_tests::execute(&self.project_root, arguments),
            "deploy" => deploy::execute(&self.project_root, arguments),
            "run_command" => run_command::execute(&self.project_root, arguments),
            "status" => status::execute(&self.project_root, arguments),
            "get_logs" => get_logs::execute(&self.project_root, arguments),
            "get_config" => get_config::execute(&self.project_root, arguments),
            "update_config" => update_config::execute(&self.project_root, arguments),
            "list_artifacts" => list_artifacts::execute(self.store.as_ref(), arguments),
            _ => anyhow::bail!("unknown tool: {name}"),
        }
    }
}
