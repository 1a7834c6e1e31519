use crate::dispatcher::{
    CONTENT_DISPOSITION, CONTENT_TYPE, Dispatcher, ESTIMATED_DURATION, TOOL_METADATA, TransportResponse,
};
use crate::engine::ToolInput;
use crate::error::{ErrorKind, ToolError};
use crate::router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const AGENT_TOOL_ID: &str = "X-Agent-Tool-Id";
pub const AGENT_MODE: &str = "X-Agent-Mode";

/// Agent invocation: either free-text intent (auto) or an explicit tool id (manual).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub mode: Option<String>,
    pub prompt: Option<String>,
    pub tool_id: Option<String>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

impl AgentRequest {
    /// Explicit mode, else `manual` when a tool id is given, else `auto`.
    pub fn effective_mode(&self) -> &str {
        match (present(&self.mode), present(&self.tool_id)) {
            (Some(mode), _) => mode,
            (None, Some(_)) => "manual",
            (None, None) => "auto",
        }
    }
}

/// Resolves the tool for an agent request, then forwards to the dispatcher.
pub async fn handle(
    dispatcher: &Dispatcher,
    req: &AgentRequest,
    input: ToolInput,
    options_json: Option<&str>,
) -> TransportResponse {
    let mode = req.effective_mode().to_string();
    let mut tool_id = present(&req.tool_id).map(str::to_string);

    if mode == "auto" {
        let Some(prompt) = present(&req.prompt) else {
            return TransportResponse::error(
                ErrorKind::MissingPrompt,
                "A prompt is required for automatic tool selection.",
            );
        };

        let tools = dispatcher.registry().list_ai_exposed();
        if tools.is_empty() {
            return TransportResponse::error(
                ErrorKind::NoToolsAvailable,
                "No tools are currently available to the agent.",
            );
        }

        match router::route(prompt, &tools) {
            Ok(id) => {
                info!("agent routed prompt to {id}");
                tool_id = Some(id);
            }
            Err(err) => return TransportResponse::from_error(&err),
        }
    }

    let Some(tool_id) = tool_id else {
        return TransportResponse::error(
            ErrorKind::MissingToolId,
            "No toolId was given and automatic planning is not enabled.",
        );
    };

    let exposed = dispatcher
        .registry()
        .descriptor(&tool_id)
        .is_some_and(|d| d.ai_exposed);
    if !exposed {
        return TransportResponse::from_error(&ToolError::ToolNotAvailable(tool_id));
    }

    let forwarded = dispatcher.execute(&tool_id, input, options_json).await;

    if !forwarded.is_success() {
        let body = forwarded.json_body().cloned().unwrap_or(Value::Null);
        warn!("agent call to {tool_id} failed with status {}", forwarded.status);
        return TransportResponse::from_error(&ToolError::UpstreamCall {
            status: forwarded.status,
            body,
        });
    }

    let mut headers = BTreeMap::new();
    headers.insert(
        CONTENT_TYPE.to_string(),
        forwarded
            .header(CONTENT_TYPE)
            .unwrap_or("application/octet-stream")
            .to_string(),
    );
    for name in [TOOL_METADATA, ESTIMATED_DURATION, CONTENT_DISPOSITION] {
        if let Some(value) = forwarded.header(name) {
            headers.insert(name.to_string(), value.to_string());
        }
    }
    headers.insert(AGENT_TOOL_ID.to_string(), tool_id);
    headers.insert(AGENT_MODE.to_string(), mode);

    TransportResponse {
        status: 200,
        headers,
        body: forwarded.body,
    }
}
