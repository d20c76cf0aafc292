//! List-artifacts tool — JSON inventory of the artifact registry.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactStore;
use crate::resources::format_artifact_uri;
use crate::server::{ToolCallResult, ToolDefinition};

#[derive(Debug, Default, Deserialize)]
pub struct ListArtifactsParams {
    /// Restrict to one context.
    #[serde(default)]
    pub context: Option<String>,
    /// Restrict to one type.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct ArtifactEntry {
    context: String,
    #[serde(rename = "type")]
    kind: String,
    path: String,
    uri: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_artifacts".to_owned(),
        description: "List artifacts; filter by context/type. Returns JSON with a uri per \
            artifact."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "context": {
                    "type": "string",
                    "description": "Only list artifacts from this context"
                },
                "type": {
                    "type": "string",
                    "description": "Only list artifacts of this type"
                }
            }
        }),
    }
}

pub fn execute(store: &dyn ArtifactStore, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: ListArtifactsParams = if arguments.is_null() {
        ListArtifactsParams::default()
    } else {
        serde_json::from_value(arguments).context("invalid list_artifacts parameters")?
    };

    let mut entries = Vec::new();
    for (context, kind) in store.list_kinds() {
        if params.context.as_deref().is_some_and(|c| c != context) {
            continue;
        }
        if params.kind.as_deref().is_some_and(|t| t != kind) {
            continue;
        }
        for path in store.list_paths(&context, &kind) {
            entries.push(ArtifactEntry {
                uri: format_artifact_uri(&context, &kind, &path),
                context: context.clone(),
                kind: kind.clone(),
                path,
            });
        }
    }

    Ok(ToolCallResult::text(serde_json::to_string_pretty(&entries)?))
}
