//! MCP server core — JSON-RPC 2.0 dispatch shared by both transports.
//!
//! Implements the Model Context Protocol (spec 2025-06-18): lifecycle
//! (`initialize`, `notifications/initialized`, `ping`), the tool surface
//! (`tools/list`, `tools/call`), and the artifact resource surface
//! (`resources/list`, `resources/read`, `resources/templates/list`).
//!
//! [`McpHandler`] owns the tool router and the resource provider and is
//! transport-agnostic. [`run_stdio_server`] drives it over newline-
//! delimited stdin/stdout; the HTTP transport in [`crate::http`] drives
//! the same handler from POST bodies.
//!
//! Protocol flow:
//! 1. Client sends `initialize` → server responds with capabilities
//! 2. Client sends `notifications/initialized`
//! 3. Client lists tools/resources and calls/reads them
//! 4. Client closes the transport → server exits

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::artifacts::{ArtifactStore, FsArtifactStore};
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::resources::ResourceProvider;
use crate::tools::ToolRouter;

/// Maximum size of a single JSON-RPC line (10 MiB).
const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Guidance string sent to clients in the initialize result.
const SERVER_INSTRUCTIONS: &str = "Use this server to create, update, deploy, debug, test, \
    monitor, and configure projects. Fetch artifacts via Resources: \
    artifact://{context}/{type}/{path} (e.g. artifact://default/configs/pyproject.toml, \
    artifact://fastapi/templates/fastapi-app). Context: flexible grouping chosen by the \
    maintainer (technology, project type, etc.). Examples: default (generic), fastapi, \
    react, internal-admin, data-pipeline. Type: templates, configs, snippets, assets, \
    components, iac.";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// MCP protocol types
// ---------------------------------------------------------------------------

/// MCP server info returned in initialize response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    name: String,
    version: String,
}

/// MCP server capabilities.
#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ToolsCapability,
    resources: ResourcesCapability,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolsCapability {
    list_changed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourcesCapability {
    subscribe: bool,
    list_changed: bool,
}

/// MCP initialize result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: String,
    capabilities: ServerCapabilities,
    server_info: ServerInfo,
    instructions: String,
}

/// MCP tool definition for tools/list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// MCP tools/list result.
#[derive(Debug, Serialize)]
struct ToolsListResult {
    tools: Vec<ToolDefinition>,
}

/// MCP tools/call params.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// MCP resources/list params.
#[derive(Debug, Default, Deserialize)]
struct ResourcesListParams {
    #[serde(default)]
    cursor: Option<String>,
}

/// MCP resources/read params.
#[derive(Debug, Deserialize)]
struct ResourceReadParams {
    uri: String,
}

/// MCP content item in tools/call response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// MCP tools/call result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Successful result with a single text content item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem {
                content_type: "text".to_owned(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    /// Failed result with a single text content item and `isError` set.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem {
                content_type: "text".to_owned(),
                text: text.into(),
            }],
            is_error: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// Transport-agnostic MCP request handler.
///
/// Both the stdio loop and the HTTP transport feed raw JSON-RPC text
/// into [`McpHandler::handle_line`] and forward whatever response comes
/// back (`None` for notifications).
pub struct McpHandler {
    router: ToolRouter,
    resources: ResourceProvider,
}

impl McpHandler {
    pub fn new(config: &ServerConfig) -> Self {
        let store: Arc<dyn ArtifactStore> =
            Arc::new(FsArtifactStore::new(config.artifacts_root.clone()));
        Self {
            router: ToolRouter::new(
                config.project_root.clone(),
                config.artifacts_root.clone(),
                Arc::clone(&store),
            ),
            resources: ResourceProvider::new(store),
        }
    }

    /// Parse and dispatch one raw JSON-RPC message.
    ///
    /// Returns `None` when the message is a notification (no response
    /// per JSON-RPC 2.0). Malformed JSON yields a `-32700` response
    /// with a null id.
    pub fn handle_line(&self, raw: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(raw) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                return Some(error_response(None, -32700, &format!("parse error: {e}")));
            }
        };

        // JSON-RPC 2.0 spec: "jsonrpc" MUST be exactly "2.0".
        if request.jsonrpc != "2.0" {
            warn!(
                version = request.jsonrpc,
                "invalid JSON-RPC version (expected \"2.0\")"
            );
            return Some(error_response(
                request.id.clone(),
                -32600,
                &format!(
                    "invalid request: jsonrpc version must be \"2.0\", got \"{}\"",
                    request.jsonrpc
                ),
            ));
        }

        let is_notification = request.id.is_none();
        let response = self.dispatch(&request);

        if is_notification {
            // Per JSON-RPC 2.0 spec, notifications MUST NOT receive a response.
            debug!(method = request.method, "notification handled (no response)");
            return None;
        }

        response
    }

    /// Dispatch a parsed JSON-RPC request to the appropriate handler.
    pub fn dispatch(&self, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        match req.method.as_str() {
            "initialize" => Some(handle_initialize(req)),
            "notifications/initialized" => {
                info!("client initialized");
                None // notification, no response
            }
            "tools/list" => Some(self.handle_tools_list(req)),
            "tools/call" => Some(self.handle_tools_call(req)),
            "resources/list" => Some(self.handle_resources_list(req)),
            "resources/read" => Some(self.handle_resources_read(req)),
            "resources/templates/list" => {
                Some(success_response(req.id.clone(), &self.resources.templates()))
            }
            "ping" => Some(handle_ping(req)),
            _ => {
                warn!(method = req.method, "unknown method");
                Some(error_response(
                    req.id.clone(),
                    -32601,
                    &format!("method not found: {}", req.method),
                ))
            }
        }
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.router.list_tools(),
        };
        success_response(req.id.clone(), &result)
    }

    fn handle_tools_call(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params: ToolCallParams = match serde_json::from_value(req.params.clone()) {
            Ok(p) => p,
            Err(e) => {
                return error_response(
                    req.id.clone(),
                    -32602,
                    &format!("invalid tools/call params: {e}"),
                );
            }
        };

        match self.router.call_tool(&params.name, params.arguments) {
            Ok(result) => success_response(req.id.clone(), &result),
            Err(e) => {
                error!(tool = params.name, error = %e, "tool call failed");
                success_response(req.id.clone(), &ToolCallResult::error(format!("Error: {e}")))
            }
        }
    }

    fn handle_resources_list(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params: ResourcesListParams = match optional_params(&req.params) {
            Ok(p) => p,
            Err(e) => {
                return error_response(
                    req.id.clone(),
                    -32602,
                    &format!("invalid resources/list params: {e}"),
                );
            }
        };

        match self.resources.list(params.cursor.as_deref()) {
            Ok(result) => success_response(req.id.clone(), &result),
            Err(e) => error_response(req.id.clone(), error_code_for(&e), &e.to_string()),
        }
    }

    fn handle_resources_read(&self, req: &JsonRpcRequest) -> JsonRpcResponse {
        let params: ResourceReadParams = match serde_json::from_value(req.params.clone()) {
            Ok(p) => p,
            Err(e) => {
                return error_response(
                    req.id.clone(),
                    -32602,
                    &format!("invalid resources/read params: {e}"),
                );
            }
        };

        match self.resources.read(&params.uri) {
            Ok(result) => success_response(req.id.clone(), &result),
            Err(e) => {
                warn!(uri = params.uri, error = %e, "resource read failed");
                error_response(req.id.clone(), error_code_for(&e), &e.to_string())
            }
        }
    }
}

/// JSON-RPC error code for a [`ServerError`] surfaced through the
/// resource methods. Out-of-bounds paths and malformed requests are the
/// client's fault (`-32602`); missing artifacts use the MCP resource
/// code (`-32002`); everything else is internal.
const fn error_code_for(err: &ServerError) -> i64 {
    match err {
        ServerError::OutOfBounds { .. } | ServerError::Protocol(_) => -32602,
        ServerError::NotFound(_) => -32002,
        _ => -32603,
    }
}

/// Deserialize params that may be absent (`null`) entirely.
fn optional_params<T: serde::de::DeserializeOwned + Default>(
    params: &serde_json::Value,
) -> Result<T, serde_json::Error> {
    if params.is_null() {
        Ok(T::default())
    } else {
        serde_json::from_value(params.clone())
    }
}

fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
    let result = InitializeResult {
        protocol_version: "2025-06-18".to_owned(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
            resources: ResourcesCapability {
                subscribe: false,
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: "project-mcp".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        },
        instructions: SERVER_INSTRUCTIONS.to_owned(),
    };

    success_response(req.id.clone(), &result)
}

fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
    success_response(req.id.clone(), &serde_json::json!({}))
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub fn success_response(id: Option<serde_json::Value>, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: Some(v),
            error: None,
        },
        Err(e) => {
            error!(error = %e, "failed to serialize success response");
            JsonRpcResponse {
                jsonrpc: "2.0".to_owned(),
                id,
                result: None,
                error: Some(JsonRpcError {
                    code: -32603,
                    message: format!("internal error: failed to serialize result: {e}"),
                    data: None,
                }),
            }
        }
    }
}

pub fn error_response(id: Option<serde_json::Value>, code: i64, message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_owned(),
            data: None,
        }),
    }
}

// ---------------------------------------------------------------------------
// Stdio transport
// ---------------------------------------------------------------------------

/// Run the MCP server on stdin/stdout.
///
/// Reads JSON-RPC 2.0 requests line-by-line from stdin, dispatches
/// through [`McpHandler`], and writes responses to stdout. Exits when
/// stdin is closed.
///
/// # Errors
///
/// Returns an error if stdin/stdout I/O fails fatally.
pub fn run_stdio_server(config: &ServerConfig) -> Result<()> {
    info!(
        project_root = %config.project_root.display(),
        artifacts_root = %config.artifacts_root.display(),
        "project-mcp server starting (stdio)"
    );

    let handler = McpHandler::new(config);
    let stdin = std::io::stdin();
    let mut reader = std::io::BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout().lock();
    let mut line_buf = String::new();

    loop {
        line_buf.clear();
        let bytes_read = read_line_limited(&mut reader, &mut line_buf, MAX_LINE_BYTES)
            .context("failed to read from stdin")?;

        // EOF — client closed stdin, clean exit.
        if bytes_read == 0 {
            info!("stdin closed, shutting down");
            break;
        }

        let trimmed = line_buf.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!(raw = trimmed, "received request");

        if let Some(resp) = handler.handle_line(trimmed) {
            write_response(&mut stdout, &resp)?;
        }
    }

    info!("project-mcp server stopped");
    Ok(())
}

/// Write a JSON-RPC response as a single line to stdout.
fn write_response(out: &mut impl Write, resp: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(resp).context("failed to serialize response")?;
    debug!(response = json, "sending response");
    out.write_all(json.as_bytes())
        .context("failed to write to stdout")?;
    out.write_all(b"\n")
        .context("failed to write newline to stdout")?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}

/// Read a line from `reader` into `buf`, stopping at newline or `max_bytes`.
///
/// Returns the number of bytes read (0 = EOF). If the line exceeds `max_bytes`,
/// the excess is consumed and discarded, and an error is returned.
fn read_line_limited(reader: &mut impl BufRead, buf: &mut String, max_bytes: usize) -> Result<usize> {
    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().context("stdin fill_buf failed")?;
        if available.is_empty() {
            return Ok(total); // EOF
        }
        // Find newline position in available data.
        let (consumed, found_newline) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        if total + consumed > max_bytes {
            // Consume everything up to the newline (or buffer end) and error out.
            reader.consume(consumed);
            // Keep consuming until we find a newline or EOF.
            if !found_newline {
                loop {
                    let rest = reader.fill_buf().context("stdin fill_buf failed")?;
                    if rest.is_empty() {
                        break;
                    }
                    let eat = match rest.iter().position(|&b| b == b'\n') {
                        Some(pos) => { let n = pos + 1; reader.consume(n); break; }
                        None => rest.len(),
                    };
                    reader.consume(eat);
                }
            }
            anyhow::bail!("line exceeds maximum size ({max_bytes} bytes)");
        }
        let chunk = std::str::from_utf8(&available[..consumed])
            .context("non-UTF-8 data on stdin")?;
        buf.push_str(chunk);
        total += consumed;
        reader.consume(consumed);
        if found_newline {
            return Ok(total);
        }
    }
}
