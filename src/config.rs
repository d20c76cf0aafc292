//! Server configuration from environment variables.
//!
//! All configuration is read once at process start into an immutable
//! [`ServerConfig`] that is passed by reference to the transports and
//! the tool router. Components never read the environment themselves,
//! so tests can construct configs directly without touching process
//! state.
//!
//! Variables:
//! - `PROJECT_MCP_ROOT` — root for project paths (default: current dir)
//! - `PROJECT_MCP_ARTIFACTS` — artifacts tree root (default: `artifacts`
//!   under the current dir)
//! - `MCP_TRANSPORT` — `http` selects the HTTP transport; any other
//!   value selects stdio (default: `http`)
//! - `MCP_PORT` — HTTP listen port (default: 8000)

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default HTTP port when `MCP_PORT` is unset.
const DEFAULT_PORT: u16 = 8000;

/// Default artifacts directory name under the current dir.
const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Which transport carries the JSON-RPC traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// `POST /mcp` + `GET /health` over an axum server.
    Http,
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
}

/// Immutable server configuration, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Root directory for project paths; every tool path resolves
    /// under this.
    pub project_root: PathBuf,
    /// Root of the artifacts tree (`<artifacts_root>/{context}/{type}/...`).
    pub artifacts_root: PathBuf,
    /// Selected transport.
    pub transport: Transport,
    /// HTTP listen port (unused for stdio).
    pub port: u16,
}

impl ServerConfig {
    /// Build the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Fails if the project root does not exist or `MCP_PORT` is not a
    /// valid port number.
    pub fn from_env() -> Result<Self> {
        Self::from_values(
            std::env::var("PROJECT_MCP_ROOT").ok(),
            std::env::var("PROJECT_MCP_ARTIFACTS").ok(),
            std::env::var("MCP_TRANSPORT").ok(),
            std::env::var("MCP_PORT").ok(),
        )
    }

    /// Build the configuration from plain values (the testable core of
    /// [`from_env`](Self::from_env)).
    ///
    /// # Errors
    ///
    /// Fails if the project root cannot be canonicalized or the port
    /// string does not parse.
    pub fn from_values(
        root: Option<String>,
        artifacts: Option<String>,
        transport: Option<String>,
        port: Option<String>,
    ) -> Result<Self> {
        let project_root = match root {
            Some(r) => PathBuf::from(r),
            None => std::env::current_dir().context("failed to determine current dir")?,
        };
        // Fail fast on a missing root: every path resolution would
        // fail against it anyway.
        let project_root = project_root
            .canonicalize()
            .with_context(|| format!("project root does not exist: {}", project_root.display()))?;

        let artifacts_root = match artifacts {
            Some(a) => PathBuf::from(a),
            None => std::env::current_dir()
                .context("failed to determine current dir")?
                .join(DEFAULT_ARTIFACTS_DIR),
        };
        // A missing artifacts tree is legal: listings are empty and
        // reads return NotFound. Canonicalize only when present.
        let artifacts_root = artifacts_root
            .canonicalize()
            .unwrap_or(artifacts_root);

        // Only the literal "http" selects HTTP; anything else is stdio.
        let transport = match transport.as_deref() {
            None | Some("http") => Transport::Http,
            Some(_) => Transport::Stdio,
        };

        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .with_context(|| format!("invalid MCP_PORT: {p}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            project_root,
            artifacts_root,
            transport,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServerConfig::from_values(
            Some(dir.path().display().to_string()),
            None,
            None,
            None,
        )
        .expect("config");
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.port, 8000);
        assert!(config.artifacts_root.ends_with("artifacts"));
    }

    #[test]
    fn test_transport_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().display().to_string();

        let http = ServerConfig::from_values(
            Some(root.clone()),
            None,
            Some("http".to_owned()),
            None,
        )
        .expect("config");
        assert_eq!(http.transport, Transport::Http);

        // Anything that is not the literal "http" runs stdio.
        let stdio = ServerConfig::from_values(
            Some(root),
            None,
            Some("stdio".to_owned()),
            None,
        )
        .expect("config");
        assert_eq!(stdio.transport, Transport::Stdio);
    }

    #[test]
    fn test_port_parsing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().display().to_string();

        let config = ServerConfig::from_values(
            Some(root.clone()),
            None,
            None,
            Some("9100".to_owned()),
        )
        .expect("config");
        assert_eq!(config.port, 9100);

        let bad = ServerConfig::from_values(Some(root), None, None, Some("not-a-port".to_owned()));
        assert!(bad.is_err());
    }

    #[test]
    fn test_missing_root_rejected() {
        let result = ServerConfig::from_values(
            Some("/nonexistent/project-mcp-test-root".to_owned()),
            None,
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_artifacts_root_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifacts = dir.path().join("my-artifacts");
        std::fs::create_dir_all(&artifacts).expect("mkdir");

        let config = ServerConfig::from_values(
            Some(dir.path().display().to_string()),
            Some(artifacts.display().to_string()),
            None,
            None,
        )
        .expect("config");
        assert_eq!(
            config.artifacts_root,
            artifacts.canonicalize().expect("canonicalize")
        );
    }
}
