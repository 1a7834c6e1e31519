#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::{Dictionary, Document, Object, dictionary};
use std::io::Cursor;
use versa_tools::engine::pdf_tree::standalone_page;
use versa_tools::engine::types::collect_bytes;
use versa_tools::engine::{ExecutionResult, FormData, UploadedFile};
use versa_tools::report::{ExecutionReport, ExecutionSink};
use std::sync::Mutex;

/// Minimal PDF with `pages` blank A4 pages.
pub fn sample_pdf(pages: u32) -> Vec<u8> {
    let kids = (0..pages).map(|_| dictionary! { "MediaBox" => media_box(595, 842) }).collect();
    build_pdf(Dictionary::new(), kids)
}

/// One page per width, each with its own `MediaBox` of that width.
pub fn pdf_with_page_widths(widths: &[i64]) -> Vec<u8> {
    let kids = widths
        .iter()
        .map(|w| dictionary! { "MediaBox" => media_box(*w, 500) })
        .collect();
    build_pdf(Dictionary::new(), kids)
}

/// Pages that carry nothing themselves and inherit `MediaBox` and `Resources` from the `Pages` node.
pub fn pdf_with_tree_box(pages: u32, width: i64, height: i64) -> Vec<u8> {
    let tree = dictionary! {
        "MediaBox" => media_box(width, height),
        "Resources" => dictionary! { "ProcSet" => vec![Object::Name(b"PDF".to_vec())] },
    };
    build_pdf(tree, (0..pages).map(|_| Dictionary::new()).collect())
}

fn media_box(width: i64, height: i64) -> Vec<Object> {
    vec![0.into(), 0.into(), width.into(), height.into()]
}

fn build_pdf(mut tree: Dictionary, pages: Vec<Dictionary>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();
    let count = pages.len() as i64;
    for mut page in pages {
        page.set("Type", "Page");
        page.set("Parent", pages_id);
        kids.push(doc.add_object(page).into());
    }
    tree.set("Type", "Pages");
    tree.set("Kids", kids);
    tree.set("Count", count);
    doc.objects.insert(pages_id, Object::Dictionary(tree));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("save sample pdf");
    out
}

/// Effective `MediaBox` of every page, in page order.
pub fn page_boxes(bytes: &[u8]) -> Vec<Vec<i64>> {
    let doc = Document::load_mem(bytes).expect("load pdf");
    doc.get_pages()
        .values()
        .map(|&id| {
            let page = standalone_page(&doc, id).expect("page dictionary");
            page.get(b"MediaBox")
                .and_then(Object::as_array)
                .expect("media box")
                .iter()
                .map(|v| v.as_i64().expect("integer bound"))
                .collect()
        })
        .collect()
}

/// Whether every page resolves a `Resources` entry.
pub fn pages_have_resources(bytes: &[u8]) -> bool {
    let doc = Document::load_mem(bytes).expect("load pdf");
    doc.get_pages()
        .values()
        .all(|&id| standalone_page(&doc, id).expect("page dictionary").has(b"Resources"))
}

pub fn sample_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 5 % 256) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

pub fn pdf_file(name: &str, pages: u32) -> UploadedFile {
    UploadedFile::new(name, "application/pdf", sample_pdf(pages))
}

pub fn png_file(name: &str, width: u32, height: u32) -> UploadedFile {
    UploadedFile::new(name, "image/png", sample_png(width, height))
}

pub fn form_with(files: Vec<UploadedFile>) -> FormData {
    let mut form = FormData::new();
    for f in files {
        form.append_file("files", f);
    }
    form
}

pub async fn output_bytes(result: ExecutionResult) -> Vec<u8> {
    collect_bytes(result.output).await.expect("collect output")
}

/// Entry names and contents of a zip archive, in archive order.
pub fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open zip");
    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).expect("zip entry");
        let mut data = Vec::new();
        entry.read_to_end(&mut data).expect("read entry");
        out.push((entry.name().to_string(), data));
    }
    out
}

#[derive(Default)]
pub struct RecordingSink {
    pub reports: Mutex<Vec<ExecutionReport>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<ExecutionReport> {
        std::mem::take(&mut *self.reports.lock().expect("sink lock"))
    }
}

impl ExecutionSink for RecordingSink {
    fn record(&self, report: &ExecutionReport) {
        self.reports.lock().expect("sink lock").push(report.clone());
    }
}
