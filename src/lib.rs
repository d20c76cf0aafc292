//! `project-mcp` — MCP server for project scaffolding and operations.
//!
//! Exposes project management tools and a read-only artifact registry via
//! the Model Context Protocol (MCP, JSON-RPC 2.0). Runs over HTTP
//! (`POST /mcp`) or newline-delimited stdio, selected by `MCP_TRANSPORT`.
//!
//! # Tools
//!
//! - `create_project` — Scaffold a project from an artifact template
//! - `write_file` / `read_file` / `edit_file` — File manipulation under the
//!   project root, with unified diffs on edit
//! - `list_directory` / `search_files` — Directory listing and regex search
//! - `run_tests` / `deploy` / `run_command` — Allowlisted subprocess
//!   execution with timeouts
//! - `status` / `get_logs` — Project inspection
//! - `get_config` / `update_config` — `pyproject.toml` / `package.json`
//!   name and version access
//! - `list_artifacts` — Enumerate the artifact registry
//!
//! # Resources
//!
//! Artifacts live on disk under `<artifacts_root>/{context}/{type}/...`
//! and are addressed as `artifact://{context}/{type}/{path}` via
//! `resources/list`, `resources/read`, and `resources/templates/list`.
//!
//! # Architecture
//!
//! ```text
//! HTTP POST /mcp ─┐
//!                 ├→ McpHandler ─┬→ ToolRouter → Tool implementations
//! stdin (stdio) ──┘              └→ ResourceProvider → ArtifactStore
//! ```
//!
//! Every filesystem path from a client resolves through [`paths`], which
//! canonicalizes and rejects anything escaping the configured root.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod http;
pub mod paths;
pub mod resources;
pub mod server;
pub mod tools;
pub mod util;

pub use error::{ServerError, ServerResult};
pub use http::run_http_server;
pub use server::run_stdio_server;
