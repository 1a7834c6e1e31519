use versa_tools::config::Config;
use versa_tools::error::ToolError;
use versa_tools::registry::{ToolCategory, ToolDescriptor, ToolRegistry};
use versa_tools::router::route;

fn exposed() -> Vec<ToolDescriptor> {
    ToolRegistry::with_defaults(&Config::default()).list_ai_exposed()
}

fn descriptor(id: &str, category: ToolCategory) -> ToolDescriptor {
    ToolDescriptor {
        id: id.into(),
        name: id.into(),
        category,
        description: String::new(),
        ai_exposed: true,
    }
}

#[test]
fn merge_keyword_beats_generic_pdf() {
    assert_eq!(route("请帮我合并这些PDF", &exposed()).unwrap(), "pdf-merger");
}

#[test]
fn split_keyword_selects_splitter() {
    assert_eq!(route("Split this PDF into pages", &exposed()).unwrap(), "pdf-splitter");
    assert_eq!(route("pdf 拆分", &exposed()).unwrap(), "pdf-splitter");
}

#[test]
fn generic_pdf_goes_to_merger() {
    assert_eq!(route("do something with my pdf", &exposed()).unwrap(), "pdf-merger");
}

#[test]
fn no_match_uses_priority_list() {
    assert_eq!(route("asdkjasd", &exposed()).unwrap(), "pdf-merger");

    let tools = vec![
        descriptor("qr-generator", ToolCategory::Image),
        descriptor("file-archiver", ToolCategory::File),
    ];
    assert_eq!(route("asdkjasd", &tools).unwrap(), "file-archiver");
}

#[test]
fn compress_needs_an_image_word() {
    assert_eq!(route("compress this photo", &exposed()).unwrap(), "image-compressor");
    assert_eq!(route("compress these into a zip", &exposed()).unwrap(), "file-archiver");
}

#[test]
fn rule_order_is_preserved() {
    // Background intent wins over translation intent.
    assert_eq!(route("translate and remove background", &exposed()).unwrap(), "bg-remover");
    assert_eq!(route("去水印", &exposed()).unwrap(), "watermark-remover");
    assert_eq!(route("翻译成英文", &exposed()).unwrap(), "text-translator");
    assert_eq!(route("make a QR code", &exposed()).unwrap(), "qr-generator");
    assert_eq!(route("mp4 to gif please", &exposed()).unwrap(), "video-to-gif");
}

#[test]
fn missing_tool_falls_back_to_category() {
    let tools = vec![
        descriptor("text-translator", ToolCategory::Text),
        descriptor("image-compressor", ToolCategory::Image),
    ];
    assert_eq!(route("remove background", &tools).unwrap(), "image-compressor");
}

#[test]
fn missing_tool_and_category_falls_back_to_first() {
    let tools = vec![descriptor("custom", ToolCategory::Utility)];
    assert_eq!(route("merge pdf", &tools).unwrap(), "custom");
    assert_eq!(route("asdkjasd", &tools).unwrap(), "custom");
}

#[test]
fn empty_tool_set_fails() {
    assert!(matches!(route("merge pdf", &[]), Err(ToolError::NoToolsAvailable)));
}
