use super::options::OptionsReader;
use super::types::{ExecutionResult, Metadata, ToolInput, UploadedFile};
use crate::error::ToolError;
use bytes::Bytes;
use super::pdf_tree::{install_page_tree, standalone_page, type_name};
use lopdf::{Dictionary, Document, ObjectId};
use serde_json::{Value, json};
use tracing::info;

pub const TOOL_ID: &str = "pdf-merger";

#[derive(Debug, Clone, Default)]
pub struct PdfMergerOptions {}

#[derive(Debug, Clone, Default)]
pub struct PdfMerger;

impl PdfMerger {
    pub fn validate(&self, raw: &Value) -> Result<PdfMergerOptions, ToolError> {
        OptionsReader::new(TOOL_ID, raw)?;
        Ok(PdfMergerOptions {})
    }

    pub async fn process(&self, input: ToolInput, _opts: PdfMergerOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("PDF Merger")?;
        let files: Vec<UploadedFile> = form.files().filter(|f| f.is_pdf()).cloned().collect();

        if files.len() < 2 {
            return Err(ToolError::processing("At least 2 PDF files are required for merging"));
        }

        let file_count = files.len();
        let sources: Vec<Bytes> = files.into_iter().map(|f| f.data).collect();
        let merged = tokio::task::spawn_blocking(move || merge_documents(&sources))
            .await?
            .map_err(|e| ToolError::failed("Failed to merge PDFs", e))?;

        info!("merged {file_count} PDFs into {} bytes", merged.len());

        let mut metadata = Metadata::new();
        metadata.insert("fileCount".into(), json!(file_count));
        metadata.insert("outputSize".into(), json!(merged.len()));
        metadata.insert("fileName".into(), json!("merged-document.pdf"));

        Ok(ExecutionResult::buffered(merged, metadata))
    }
}

/// Concatenates every page of every source, preserving source order and per-source page order.
/// Each page carries its inherited attributes, so the sources' page trees are discarded.
pub fn merge_documents(sources: &[Bytes]) -> Result<Vec<u8>, String> {
    let mut merged = Document::with_version("1.5");
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut max_id = 1;

    for (i, bytes) in sources.iter().enumerate() {
        let mut doc = Document::load_mem(bytes).map_err(|e| format!("input {}: {e}", i + 1))?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for page_id in doc.get_pages().into_values() {
            let page = standalone_page(&doc, page_id).map_err(|e| format!("input {}: {e}", i + 1))?;
            pages.push((page_id, page));
        }

        for (id, object) in doc.objects {
            let tree_node = matches!(
                type_name(&object),
                Some(b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline")
            );
            if !tree_node {
                merged.objects.insert(id, object);
            }
        }
    }

    merged.max_id = max_id;
    install_page_tree(&mut merged, pages);
    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    let mut out = Vec::new();
    merged.save_to(&mut out).map_err(|e| e.to_string())?;
    Ok(out)
}

/// Page count of a PDF byte slice.
pub fn page_count(bytes: &[u8]) -> Result<u32, String> {
    let doc = Document::load_mem(bytes).map_err(|e| e.to_string())?;
    Ok(doc.get_pages().len() as u32)
}
