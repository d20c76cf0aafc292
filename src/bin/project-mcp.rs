//! project-mcp -- MCP server for project tools and artifact resources.
//!
//! Configuration is read from the environment (`PROJECT_MCP_ROOT`,
//! `PROJECT_MCP_ARTIFACTS`, `MCP_TRANSPORT`, `MCP_PORT`).

use project_mcp::config::{ServerConfig, Transport};

fn main() -> anyhow::Result<()> {
    // Initialize tracing to stderr so it does not interfere with MCP stdio.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env()?;

    match config.transport {
        Transport::Http => project_mcp::run_http_server(&config),
        Transport::Stdio => project_mcp::run_stdio_server(&config),
    }
}
