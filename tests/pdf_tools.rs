mod common;

use common::{
    form_with, output_bytes, page_boxes, pages_have_resources, pdf_file, pdf_with_page_widths, pdf_with_tree_box,
    png_file, zip_entries,
};
use serde_json::json;
use versa_tools::config::Archive;
use versa_tools::engine::pdf_merger::page_count;
use versa_tools::engine::{PdfMerger, PdfSplitter, UploadedFile};
use versa_tools::error::ErrorKind;

#[tokio::test]
async fn merge_sums_page_counts() {
    let merger = PdfMerger;
    let opts = merger.validate(&json!({})).unwrap();
    let form = form_with(vec![pdf_file("a.pdf", 2), pdf_file("b.pdf", 3), pdf_file("c.pdf", 1)]);

    let result = merger.process(form.into(), opts).await.unwrap();
    assert_eq!(result.metadata["fileCount"], json!(3));
    assert_eq!(result.metadata["fileName"], json!("merged-document.pdf"));

    let merged = output_bytes(result).await;
    assert_eq!(page_count(&merged).unwrap(), 6);
}

#[tokio::test]
async fn merge_keeps_source_and_page_order() {
    let merger = PdfMerger;
    let opts = merger.validate(&json!({})).unwrap();
    let form = form_with(vec![
        UploadedFile::new("a.pdf", "application/pdf", pdf_with_page_widths(&[101, 102])),
        UploadedFile::new("b.pdf", "application/pdf", pdf_with_page_widths(&[201])),
        UploadedFile::new("c.pdf", "application/pdf", pdf_with_page_widths(&[301, 302])),
    ]);

    let merged = output_bytes(merger.process(form.into(), opts).await.unwrap()).await;
    let widths: Vec<i64> = page_boxes(&merged).iter().map(|b| b[2]).collect();
    assert_eq!(widths, vec![101, 102, 201, 301, 302]);
}

#[tokio::test]
async fn merge_resolves_attributes_inherited_from_page_tree() {
    let merger = PdfMerger;
    let opts = merger.validate(&json!({})).unwrap();
    let form = form_with(vec![
        UploadedFile::new("a4.pdf", "application/pdf", pdf_with_tree_box(1, 595, 842)),
        UploadedFile::new("letter.pdf", "application/pdf", pdf_with_tree_box(2, 612, 792)),
    ]);

    let merged = output_bytes(merger.process(form.into(), opts).await.unwrap()).await;
    assert_eq!(
        page_boxes(&merged),
        vec![vec![0, 0, 595, 842], vec![0, 0, 612, 792], vec![0, 0, 612, 792]]
    );
    assert!(pages_have_resources(&merged));
}

#[tokio::test]
async fn merge_fails_when_an_input_is_not_a_pdf() {
    let merger = PdfMerger;
    let opts = merger.validate(&json!({})).unwrap();
    let form = form_with(vec![
        pdf_file("good.pdf", 1),
        UploadedFile::new("broken.pdf", "application/pdf", b"definitely not a pdf".to_vec()),
    ]);

    let err = merger.process(form.into(), opts).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProcessingFailed);
    let message = err.to_string();
    assert!(message.contains("Failed to merge PDFs"), "{message}");
    assert!(message.contains("input 2"), "{message}");
}

#[tokio::test]
async fn merge_ignores_non_pdf_and_needs_two() {
    let merger = PdfMerger;
    let opts = merger.validate(&json!({})).unwrap();
    let form = form_with(vec![pdf_file("a.pdf", 2), png_file("x.png", 4, 4)]);

    let err = merger.process(form.into(), opts).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProcessingFailed);
    assert!(err.to_string().contains("At least 2 PDF files"));
}

#[tokio::test]
async fn split_emits_one_document_per_plan_entry() {
    let splitter = PdfSplitter::new(Archive::default());
    let opts = splitter.validate(&json!({ "ranges": " 4-2,9 " })).unwrap();
    let form = form_with(vec![pdf_file("book.pdf", 5)]);

    let result = splitter.process(form.into(), opts).await.unwrap();
    assert_eq!(result.metadata["pageCount"], json!(5));
    assert_eq!(result.metadata["fileCount"], json!(3));
    assert_eq!(result.metadata["extractedRanges"], json!([[2, 2], [3, 3], [4, 4]]));
    assert_eq!(result.metadata["mimeType"], json!("application/zip"));
    let name = result.metadata["fileName"].as_str().unwrap().to_string();
    assert!(name.starts_with("Pdfsplit_") && name.ends_with(".zip"));
    assert_eq!(name.len(), "Pdfsplit_DDMMYYYY.zip".len());

    let entries = zip_entries(&output_bytes(result).await);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["page_1.pdf", "page_2.pdf", "page_3.pdf"]);
    for (_, data) in &entries {
        assert_eq!(page_count(data).unwrap(), 1);
    }
}

#[tokio::test]
async fn split_without_ranges_explodes() {
    let splitter = PdfSplitter::new(Archive::default());
    let opts = splitter.validate(&json!({})).unwrap();
    let form = form_with(vec![pdf_file("two.pdf", 2)]);

    let result = splitter.process(form.into(), opts).await.unwrap();
    let entries = zip_entries(&output_bytes(result).await);
    assert_eq!(entries.len(), 2);
}

#[test]
fn split_rejects_bad_range_characters() {
    let splitter = PdfSplitter::new(Archive::default());
    let err = splitter.validate(&json!({ "ranges": "1-3;5" })).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidOptions);
}

#[tokio::test]
async fn split_with_no_pages_in_range_fails() {
    let splitter = PdfSplitter::new(Archive::default());
    let opts = splitter.validate(&json!({ "ranges": "10-12" })).unwrap();
    let form = form_with(vec![pdf_file("short.pdf", 3)]);

    let err = splitter.process(form.into(), opts).await.err().unwrap();
    assert!(err.to_string().contains("No valid page ranges found"));
}

#[tokio::test]
async fn split_requires_exactly_one_pdf() {
    let splitter = PdfSplitter::new(Archive::default());
    let opts = splitter.validate(&json!({})).unwrap();
    let form = form_with(vec![pdf_file("a.pdf", 1), pdf_file("b.pdf", 1)]);

    let err = splitter.process(form.into(), opts).await.err().unwrap();
    assert!(err.to_string().contains("Exactly 1 PDF"));
}

#[tokio::test]
async fn split_outputs_hold_only_their_own_page() {
    let splitter = PdfSplitter::new(Archive::default());
    let opts = splitter.validate(&json!({ "ranges": "2-3,1" })).unwrap();
    let form = form_with(vec![UploadedFile::new(
        "widths.pdf",
        "application/pdf",
        pdf_with_page_widths(&[101, 102, 103]),
    )]);

    let entries = zip_entries(&output_bytes(splitter.process(form.into(), opts).await.unwrap()).await);
    let widths: Vec<Vec<i64>> = entries
        .iter()
        .map(|(_, data)| page_boxes(data).iter().map(|b| b[2]).collect())
        .collect();
    assert_eq!(widths, vec![vec![102], vec![103], vec![101]]);
}

#[tokio::test]
async fn split_pages_keep_inherited_attributes() {
    let splitter = PdfSplitter::new(Archive::default());
    let opts = splitter.validate(&json!({})).unwrap();
    let form = form_with(vec![UploadedFile::new(
        "tree.pdf",
        "application/pdf",
        pdf_with_tree_box(3, 612, 792),
    )]);

    let entries = zip_entries(&output_bytes(splitter.process(form.into(), opts).await.unwrap()).await);
    assert_eq!(entries.len(), 3);
    for (_, data) in &entries {
        assert_eq!(page_boxes(data), vec![vec![0, 0, 612, 792]]);
        assert!(pages_have_resources(data));
    }
}
