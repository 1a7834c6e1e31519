use crate::util::now_rfc3339;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// One telemetry record per dispatched invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub tool: String,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionReport {
    pub fn success(tool: &str, duration_ms: u64) -> Self {
        Self {
            tool: tool.to_string(),
            duration_ms,
            status: ExecutionStatus::Success,
            timestamp: now_rfc3339(),
            error: None,
        }
    }

    pub fn failure(tool: &str, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            tool: tool.to_string(),
            duration_ms,
            status: ExecutionStatus::Failed,
            timestamp: now_rfc3339(),
            error: Some(error.into()),
        }
    }
}

/// Receives execution telemetry.
pub trait ExecutionSink: Send + Sync {
    fn record(&self, report: &ExecutionReport);
}

/// Emits reports as structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ExecutionSink for TracingSink {
    fn record(&self, report: &ExecutionReport) {
        match report.status {
            ExecutionStatus::Success => info!(
                tool = %report.tool,
                duration_ms = report.duration_ms,
                status = "SUCCESS",
                timestamp = %report.timestamp,
                "Tool Execution Report"
            ),
            ExecutionStatus::Failed => error!(
                tool = %report.tool,
                duration_ms = report.duration_ms,
                status = "FAILED",
                timestamp = %report.timestamp,
                error = report.error.as_deref().unwrap_or_default(),
                "Tool Execution Failed"
            ),
        }
    }
}
