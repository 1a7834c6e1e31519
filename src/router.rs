use crate::error::ToolError;
use crate::registry::{ToolCategory, ToolDescriptor};
use tracing::debug;

/// Keyword rule: any trigger present selects `tool_id`, or the first tool of `category` when
/// that id is not offered.
struct Rule {
    triggers: &'static [&'static str],
    /// Additional words of which at least one must also appear.
    requires: &'static [&'static str],
    tool_id: &'static str,
    category: ToolCategory,
}

const PDF_MERGE: &[&str] = &["合并", "merge", "combine"];
const PDF_SPLIT: &[&str] = &["拆分", "分割", "split", "extract pages"];

/// Evaluated in order after the PDF branch; first match wins.
const RULES: &[Rule] = &[
    Rule {
        triggers: &["背景", "抠图", "remove background", "background remover"],
        requires: &[],
        tool_id: "bg-remover",
        category: ToolCategory::Image,
    },
    Rule {
        triggers: &["水印", "去水印", "remove watermark", "watermark remover"],
        requires: &[],
        tool_id: "watermark-remover",
        category: ToolCategory::Image,
    },
    Rule {
        triggers: &["翻译", "translate", "translation"],
        requires: &[],
        tool_id: "text-translator",
        category: ToolCategory::Text,
    },
    Rule {
        triggers: &["压缩", "缩小", "变小", "compress", "optimize"],
        requires: &["图", "image", "photo", "picture"],
        tool_id: "image-compressor",
        category: ToolCategory::Image,
    },
    Rule {
        triggers: &["打包", "压缩包", "zip", "archive"],
        requires: &[],
        tool_id: "file-archiver",
        category: ToolCategory::File,
    },
    Rule {
        triggers: &[
            "视频转gif",
            "视频 转 gif",
            "video to gif",
            "mp4 to gif",
            "gif from video",
        ],
        requires: &[],
        tool_id: "video-to-gif",
        category: ToolCategory::Image,
    },
    Rule {
        triggers: &["二维码", "qr code", "qrcode"],
        requires: &[],
        tool_id: "qr-generator",
        category: ToolCategory::Image,
    },
];

/// Used when no keyword rule matches.
pub const PRIORITY: &[&str] = &[
    "pdf-merger",
    "image-compressor",
    "bg-remover",
    "file-archiver",
    "watermark-remover",
    "text-translator",
    "qr-generator",
    "video-to-gif",
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Picks a tool id for free-text intent. Never fails when `tools` is non-empty.
pub fn route(prompt: &str, tools: &[ToolDescriptor]) -> Result<String, ToolError> {
    let Some(first) = tools.first() else {
        return Err(ToolError::NoToolsAvailable);
    };

    let lower = prompt.to_lowercase();

    let pick = |id: &str, category: ToolCategory| -> String {
        tools
            .iter()
            .find(|t| t.id == id)
            .or_else(|| tools.iter().find(|t| t.category == category))
            .unwrap_or(first)
            .id
            .clone()
    };

    if lower.contains("pdf") {
        let id = if contains_any(&lower, PDF_MERGE) {
            "pdf-merger"
        } else if contains_any(&lower, PDF_SPLIT) {
            "pdf-splitter"
        } else {
            "pdf-merger"
        };
        let chosen = pick(id, ToolCategory::Pdf);
        debug!("routed pdf intent to {chosen}");
        return Ok(chosen);
    }

    for rule in RULES {
        if !contains_any(&lower, rule.triggers) {
            continue;
        }
        if !rule.requires.is_empty() && !contains_any(&lower, rule.requires) {
            continue;
        }
        let chosen = pick(rule.tool_id, rule.category);
        debug!("routed by keyword to {chosen}");
        return Ok(chosen);
    }

    let fallback = PRIORITY
        .iter()
        .find_map(|id| tools.iter().find(|t| t.id == *id))
        .unwrap_or(first);
    debug!("no keyword matched, falling back to {}", fallback.id);
    Ok(fallback.id.clone())
}
