use super::archive::{ArchiveEntry, zip_stream};
use super::options::OptionsReader;
use super::pdf_tree::{collect_references, install_page_tree, standalone_page, type_name};
use super::types::{ExecutionResult, Metadata, ToolInput, UploadedFile};
use crate::config::Archive;
use crate::error::ToolError;
use crate::page_plan::{PagePlan, PageRange, is_valid_expression};
use crate::util::date_stamp;
use lopdf::{Document, Object, ObjectId};
use serde_json::{Value, json};
use std::collections::HashSet;
use tracing::{debug, info};

pub const TOOL_ID: &str = "pdf-splitter";

#[derive(Debug, Clone, Default)]
pub struct PdfSplitterOptions {
    pub ranges: String,
}

#[derive(Debug, Clone, Default)]
pub struct PdfSplitter {
    archive: Archive,
}

impl PdfSplitter {
    pub fn new(archive: Archive) -> Self {
        Self { archive }
    }

    pub fn validate(&self, raw: &Value) -> Result<PdfSplitterOptions, ToolError> {
        let opts = OptionsReader::new(TOOL_ID, raw)?;
        let ranges = opts.string("ranges", "")?.trim().to_string();
        if !is_valid_expression(&ranges) {
            return Err(ToolError::invalid(
                TOOL_ID,
                "Invalid page ranges format. Use numbers, commas, and dashes only (e.g. 1-3,5,8-10).",
            ));
        }
        Ok(PdfSplitterOptions { ranges })
    }

    pub async fn process(&self, input: ToolInput, opts: PdfSplitterOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("PDF Splitter")?;
        let files: Vec<&UploadedFile> = form.files().filter(|f| f.is_pdf()).collect();

        if files.len() != 1 {
            return Err(ToolError::processing("Exactly 1 PDF file is required for splitting"));
        }
        let file = files[0].clone();

        let data = file.data.clone();
        let doc = tokio::task::spawn_blocking(move || Document::load_mem(&data))
            .await?
            .map_err(|e| ToolError::failed("Failed to load PDF", e))?;

        let total_pages = doc.get_pages().len() as u32;
        let plan = PagePlan::parse(&opts.ranges, total_pages);
        debug!(?plan, "page plan");

        if plan.is_empty() {
            return Err(ToolError::processing("No valid page ranges found"));
        }

        info!(
            "splitting {} pages={} outputs={}",
            file.name,
            total_pages,
            plan.ranges.len()
        );

        let extracted: Vec<[u32; 2]> = plan
            .ranges
            .iter()
            .map(|r| [r.start_page, r.end_page])
            .collect();

        let mut metadata = Metadata::new();
        metadata.insert("originalName".into(), json!(file.name));
        metadata.insert("pageCount".into(), json!(total_pages));
        metadata.insert("extractedRanges".into(), json!(extracted));
        metadata.insert("fileCount".into(), json!(plan.ranges.len()));
        metadata.insert("mimeType".into(), json!("application/zip"));
        metadata.insert("fileName".into(), json!(format!("Pdfsplit_{}.zip", date_stamp())));

        let source = doc;
        let entries = plan.ranges.into_iter().enumerate().map(move |(i, range)| -> Result<ArchiveEntry, ToolError> {
            let data = extract_range(&source, range)?;
            Ok(ArchiveEntry {
                name: format!("page_{}.pdf", i + 1),
                data,
            })
        });

        Ok(ExecutionResult {
            output: zip_stream(entries, &self.archive),
            metadata,
        })
    }
}

/// New document containing only the pages of `range` and the objects they reach.
pub fn extract_range(source: &Document, range: PageRange) -> Result<Vec<u8>, ToolError> {
    let write_failed = |e: &dyn std::fmt::Display| {
        ToolError::failed(
            "Failed to write split PDF",
            format!("pages {}-{}: {e}", range.start_page, range.end_page),
        )
    };

    let mut doc = Document::with_version(source.version.clone());
    doc.max_id = source.max_id;

    let mut pages = Vec::new();
    let mut pending = Vec::new();
    for (_, &page_id) in source.get_pages().range(range.start_page..=range.end_page) {
        let page = standalone_page(source, page_id).map_err(|e| write_failed(&e))?;
        collect_references(&Object::Dictionary(page.clone()), &mut pending);
        pages.push((page_id, page));
    }
    let selected: HashSet<ObjectId> = pages.iter().map(|(id, _)| *id).collect();

    while let Some(id) = pending.pop() {
        if selected.contains(&id) || doc.objects.contains_key(&id) {
            continue;
        }
        let Ok(object) = source.get_object(id) else {
            continue;
        };
        // Pages outside the range stay out even when an annotation points at them.
        if matches!(type_name(object), Some(b"Page" | b"Pages" | b"Catalog")) {
            continue;
        }
        collect_references(object, &mut pending);
        doc.objects.insert(id, object.clone());
    }

    install_page_tree(&mut doc, pages);
    doc.renumber_objects();
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(|e| write_failed(&e))?;
    Ok(out)
}
