use super::archive::{ArchiveEntry, zip_stream};
use super::options::OptionsReader;
use super::types::{ExecutionResult, Metadata, ToolInput, UploadedFile};
use crate::config::Archive;
use crate::error::ToolError;
use serde_json::{Value, json};
use tracing::info;

pub const TOOL_ID: &str = "file-archiver";

#[derive(Debug, Clone)]
pub struct FileArchiverOptions {
    pub filename: String,
}

#[derive(Debug, Clone, Default)]
pub struct FileArchiver {
    archive: Archive,
}

impl FileArchiver {
    pub fn new(archive: Archive) -> Self {
        Self { archive }
    }

    pub fn validate(&self, raw: &Value) -> Result<FileArchiverOptions, ToolError> {
        let opts = OptionsReader::new(TOOL_ID, raw)?;
        let filename = opts.string("filename", "archive")?;
        Ok(FileArchiverOptions {
            filename: if filename.is_empty() { "archive".into() } else { filename },
        })
    }

    pub async fn process(&self, input: ToolInput, opts: FileArchiverOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("File Archiver")?;
        let files: Vec<UploadedFile> = form.files().cloned().collect();

        if files.is_empty() {
            return Err(ToolError::processing("No files provided for archiving"));
        }

        info!(
            "archiving {} files ({} bytes) as {}.zip",
            files.len(),
            form.total_file_bytes(),
            opts.filename
        );

        let mut metadata = Metadata::new();
        metadata.insert("fileCount".into(), json!(files.len()));
        metadata.insert("fileName".into(), json!(format!("{}.zip", opts.filename)));
        metadata.insert("mimeType".into(), json!("application/zip"));

        let entries = files.into_iter().map(|f| -> Result<ArchiveEntry, ToolError> {
            Ok(ArchiveEntry {
                name: f.name,
                data: f.data.to_vec(),
            })
        });

        Ok(ExecutionResult {
            output: zip_stream(entries, &self.archive),
            metadata,
        })
    }
}
