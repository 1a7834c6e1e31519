use super::command::{expand_args, run_tool_command};
use super::options::OptionsReader;
use super::scratch::{scratch_file, scratch_file_with};
use super::types::{ExecutionResult, Metadata, ToolInput};
use crate::config::Background;
use crate::error::ToolError;
use crate::util::{file_extension, file_stem};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::info;

pub const TOOL_ID: &str = "bg-remover";

const LABEL: &str = "Failed to remove background";

#[derive(Debug, Clone, Default)]
pub struct BgRemoverOptions {}

/// Delegates segmentation to an external command that reads `{input}` and writes an alpha PNG to `{output}`.
#[derive(Debug, Clone)]
pub struct BgRemover {
    background: Background,
    scratch_dir: PathBuf,
}

impl BgRemover {
    pub fn new(background: Background, scratch_dir: PathBuf) -> Self {
        Self {
            background,
            scratch_dir,
        }
    }

    pub fn validate(&self, raw: &Value) -> Result<BgRemoverOptions, ToolError> {
        OptionsReader::new(TOOL_ID, raw)?;
        Ok(BgRemoverOptions {})
    }

    pub async fn process(&self, input: ToolInput, _opts: BgRemoverOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("Background Remover")?;
        let file = form
            .file("files")
            .ok_or_else(|| ToolError::processing("No image file provided"))?;

        if !file.is_image() {
            return Err(ToolError::processing("Invalid file type. Please upload an image."));
        }

        let suffix = file_extension(&file.name).unwrap_or(".img");
        let input_path = scratch_file_with(&self.scratch_dir, "bg-in", suffix, &file.data).await?;
        let output_path = scratch_file(&self.scratch_dir, "bg-out", ".png")?;

        let args = expand_args(&self.background.args, &input_path, &output_path);
        run_tool_command(&self.background.command, &args, LABEL).await?;

        let output = tokio::fs::read(&output_path)
            .await
            .map_err(|e| ToolError::failed(LABEL, e))?;
        if output.is_empty() {
            return Err(ToolError::failed(LABEL, "segmentation produced no output"));
        }

        info!("removed background {} -> {} bytes", file.name, output.len());

        let mut metadata = Metadata::new();
        metadata.insert("originalName".into(), json!(file.name));
        metadata.insert("outputSize".into(), json!(output.len()));
        metadata.insert("mimeType".into(), json!("image/png"));
        metadata.insert(
            "fileName".into(),
            json!(format!("bg-removed-{}.png", file_stem(&file.name))),
        );

        Ok(ExecutionResult::buffered(output, metadata))
    }
}
