use crate::engine::types::collect_bytes;
use crate::engine::{ByteStream, ToolInput};
use crate::error::{ErrorKind, ToolError};
use crate::registry::ToolRegistry;
use crate::report::{ExecutionReport, ExecutionSink, TracingSink};
use crate::util::format_seconds;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const TOOL_METADATA: &str = "X-Tool-Metadata";
pub const ESTIMATED_DURATION: &str = "X-Estimated-Duration";
pub const CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";

pub enum ResponseBody {
    Stream(ByteStream),
    Json(Value),
}

/// What a transport adapter relays to its caller: a status, a header set, and a body.
pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// `{ error, message }` with the status of `kind`.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::json(kind.status(), json!({ "error": kind.as_str(), "message": message.into() }))
    }

    pub fn from_error(err: &ToolError) -> Self {
        let kind = err.kind();
        let body = match err {
            ToolError::UpstreamCall { status, body } => json!({
                "error": kind.as_str(),
                "status": status,
                "toolError": body,
            }),
            ToolError::InvalidOptions { .. } | ToolError::Processing(_) => json!({
                "error": kind.as_str(),
                "message": err.to_string(),
                "retryable": kind.retryable(),
            }),
            _ => json!({ "error": kind.as_str(), "message": err.to_string() }),
        };
        Self::json(kind.status(), body)
    }

    fn json(status: u16, body: Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            body: ResponseBody::Json(body),
        }
    }

    /// JSON body of an error response, if any.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Stream(_) => None,
        }
    }

    /// Drains the body. Stream errors after delivery began surface here.
    pub async fn into_bytes(self) -> Result<Vec<u8>, ToolError> {
        match self.body {
            ResponseBody::Stream(s) => collect_bytes(s).await,
            ResponseBody::Json(v) => serde_json::to_vec(&v).map_err(|e| ToolError::failed("encode body", e)),
        }
    }
}

/// Parses the raw options string. Absent or blank means `{}`.
pub fn parse_options(raw: Option<&str>) -> Result<Value, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Value::Object(Map::new())),
        Some(s) => serde_json::from_str(s).map_err(|e| format!("options are not valid JSON: {e}")),
    }
}

/// Resolves, validates and runs one tool invocation.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    sink: Arc<dyn ExecutionSink>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_sink(registry, Arc::new(TracingSink))
    }

    pub fn with_sink(registry: Arc<ToolRegistry>, sink: Arc<dyn ExecutionSink>) -> Self {
        Self { registry, sink }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Telemetry is recorded exactly once, whatever the outcome.
    pub async fn execute(&self, tool_id: &str, input: ToolInput, options_json: Option<&str>) -> TransportResponse {
        let started = Instant::now();
        let outcome = self.run(tool_id, input, options_json).await;
        let elapsed = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                self.sink.record(&ExecutionReport::success(tool_id, elapsed));
                response
            }
            Err(err) => {
                warn!("Tool execution failed [{tool_id}]: {err}");
                self.sink
                    .record(&ExecutionReport::failure(tool_id, elapsed, err.to_string()));
                TransportResponse::from_error(&err)
            }
        }
    }

    async fn run(&self, tool_id: &str, input: ToolInput, options_json: Option<&str>) -> Result<TransportResponse, ToolError> {
        let tool = self
            .registry
            .get(tool_id)
            .ok_or_else(|| ToolError::ToolNotFound(tool_id.to_string()))?;
        let engine = &tool.engine;

        let size_mb = input.size_mb();
        let raw = parse_options(options_json).map_err(|m| ToolError::invalid(tool_id, m))?;
        let opts = engine.validate(&raw)?;
        debug!(?opts, mode = ?engine.mode(), size_mb, "dispatching {tool_id}");

        let result = engine.process(input, opts).await?;

        let content_type = result
            .metadata
            .get("mimeType")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(tool.descriptor.category.default_content_type());
        let metadata_json = serde_json::to_string(&result.metadata)
            .map_err(|e| ToolError::failed("Failed to encode metadata", e))?;

        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), content_type.to_string());
        headers.insert(TOOL_METADATA.to_string(), metadata_json);
        headers.insert(
            ESTIMATED_DURATION.to_string(),
            format_seconds(engine.estimate_duration(size_mb)),
        );
        headers.insert(CONTENT_TYPE_OPTIONS.to_string(), "nosniff".to_string());
        if let Some(name) = result.metadata.get("fileName").and_then(Value::as_str) {
            headers.insert(
                CONTENT_DISPOSITION.to_string(),
                format!("attachment; filename=\"{name}\""),
            );
        }

        Ok(TransportResponse {
            status: 200,
            headers,
            body: ResponseBody::Stream(result.output),
        })
    }
}
