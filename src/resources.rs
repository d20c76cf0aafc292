//! MCP resource surface for the artifact registry.
//!
//! Every artifact is addressed as `artifact://{context}/{type}/{path}`.
//! `resources/list` enumerates concrete artifacts (paginated),
//! `resources/templates/list` advertises the URI template, and
//! `resources/read` resolves one URI through the [`ArtifactStore`].

use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::artifacts::{ArtifactStore, mime_for};
use crate::error::{ServerError, ServerResult};

/// URI scheme prefix for artifact resources.
pub const ARTIFACT_SCHEME: &str = "artifact://";

/// Page size for `resources/list`.
const RESOURCE_PAGE_SIZE: usize = 50;

/// Render the canonical URI for one artifact.
pub fn format_artifact_uri(context: &str, kind: &str, path: &str) -> String {
    format!("{ARTIFACT_SCHEME}{context}/{kind}/{path}")
}

/// Parse `artifact://{context}/{type}/{path}` into its three segments.
///
/// The path part may contain further slashes and may be empty (the
/// type directory itself). Returns `None` for a foreign scheme or a
/// URI with fewer than two segments.
pub fn parse_artifact_uri(uri: &str) -> Option<(String, String, String)> {
    let rest = uri.strip_prefix(ARTIFACT_SCHEME)?;
    let mut segments = rest.splitn(3, '/');
    let context = segments.next()?;
    let kind = segments.next()?;
    if context.is_empty() || kind.is_empty() {
        return None;
    }
    let path = segments.next().unwrap_or("");
    Some((context.to_owned(), kind.to_owned(), path.to_owned()))
}

/// Serves the MCP `resources/*` methods from an [`ArtifactStore`].
pub struct ResourceProvider {
    store: Arc<dyn ArtifactStore>,
}

impl ResourceProvider {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// `resources/list`: one page of concrete artifact resources.
    ///
    /// The cursor is an opaque decimal offset handed back verbatim by
    /// the client; `nextCursor` is present only when more pages exist.
    pub fn list(&self, cursor: Option<&str>) -> ServerResult<Value> {
        let offset = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| ServerError::Protocol(format!("invalid cursor: {c}")))?,
        };

        let all = self.all_resources();
        let end = all.len().min(offset.saturating_add(RESOURCE_PAGE_SIZE));
        let page: Vec<Value> = all.get(offset..end).unwrap_or(&[]).to_vec();

        let mut result = json!({ "resources": page });
        if end < all.len() {
            result["nextCursor"] = Value::String(end.to_string());
        }
        Ok(result)
    }

    /// `resources/templates/list`: the single artifact URI template.
    pub fn templates(&self) -> Value {
        json!({
            "resourceTemplates": [{
                "uriTemplate": "artifact://{context}/{type}/{path}",
                "name": "artifact",
                "description": "Read-only project artifacts (templates, configs, snippets) organized by context and type",
            }]
        })
    }

    /// `resources/read`: resolve one artifact URI to its contents.
    pub fn read(&self, uri: &str) -> ServerResult<Value> {
        let (context, kind, path) = parse_artifact_uri(uri)
            .ok_or_else(|| ServerError::Protocol(format!("unknown resource URI: {uri}")))?;
        let artifact = self.store.read(&context, &kind, &path)?;
        Ok(json!({
            "contents": [{
                "uri": uri,
                "mimeType": artifact.mime,
                "text": artifact.text,
            }]
        }))
    }

    fn all_resources(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for (context, kind) in self.store.list_kinds() {
            for path in self.store.list_paths(&context, &kind) {
                out.push(json!({
                    "uri": format_artifact_uri(&context, &kind, &path),
                    "name": format!("{context}/{kind}/{path}"),
                    "mimeType": mime_for(Path::new(&path)),
                }));
            }
        }
        out
    }
}
