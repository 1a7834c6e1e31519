use crate::config::Config;
use crate::engine::{self, Engine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Pdf,
    Image,
    File,
    Text,
    Utility,
}

impl ToolCategory {
    /// Response content type when the engine does not report one.
    pub fn default_content_type(self) -> &'static str {
        match self {
            ToolCategory::Pdf => "application/pdf",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub id: String,
    pub name: String,
    pub category: ToolCategory,
    pub description: String,
    pub ai_exposed: bool,
}

/// Descriptor fields supplied at registration; the id comes from the engine.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: &'static str,
    pub category: ToolCategory,
    pub description: &'static str,
    pub ai_exposed: bool,
}

#[derive(Debug, Clone)]
pub struct RegisteredTool {
    pub engine: Engine,
    pub descriptor: ToolDescriptor,
}

/// Build-once, read-many table of tools. Share it behind an `Arc` once populated.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populated with every built-in tool.
    pub fn with_defaults(cfg: &Config) -> Self {
        let mut reg = Self::new();
        initialize_tools(&mut reg, cfg);
        reg
    }

    /// Re-registering an id replaces the earlier entry in place.
    pub fn register(&mut self, engine: Engine, info: ToolInfo) {
        let id = engine.tool_id().to_string();
        let descriptor = ToolDescriptor {
            id: id.clone(),
            name: info.name.to_string(),
            category: info.category,
            description: info.description.to_string(),
            ai_exposed: info.ai_exposed,
        };
        let entry = RegisteredTool { engine, descriptor };
        match self.index.get(&id) {
            Some(&i) => {
                debug!("tool {id} registered again, replacing");
                self.tools[i] = entry;
            }
            None => {
                self.index.insert(id, self.tools.len());
                self.tools.push(entry);
            }
        }
    }

    pub fn get(&self, tool_id: &str) -> Option<&RegisteredTool> {
        self.index.get(tool_id).map(|&i| &self.tools[i])
    }

    pub fn descriptor(&self, tool_id: &str) -> Option<&ToolDescriptor> {
        self.get(tool_id).map(|t| &t.descriptor)
    }

    /// Registration order.
    pub fn list_all(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor.clone()).collect()
    }

    pub fn list_ai_exposed(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .filter(|t| t.descriptor.ai_exposed)
            .map(|t| t.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

pub fn tool_info(tool_id: &str) -> ToolInfo {
    let (name, category, description) = match tool_id {
        engine::pdf_merger::TOOL_ID => (
            "PDF Merger",
            ToolCategory::Pdf,
            "Combine multiple PDF files into one document.",
        ),
        engine::pdf_splitter::TOOL_ID => (
            "PDF Splitter",
            ToolCategory::Pdf,
            "Extract pages or page ranges from a PDF into separate files.",
        ),
        engine::bg_remover::TOOL_ID => (
            "Background Remover",
            ToolCategory::Image,
            "Remove the background from an image and return a transparent PNG.",
        ),
        engine::image_compressor::TOOL_ID => (
            "Image Compressor",
            ToolCategory::Image,
            "Re-encode an image as JPEG, PNG, WebP or AVIF at a chosen quality.",
        ),
        engine::watermark_remover::TOOL_ID => (
            "Watermark Remover",
            ToolCategory::Image,
            "Blur a rectangular region of an image to hide a watermark.",
        ),
        engine::file_archiver::TOOL_ID => (
            "File Archiver",
            ToolCategory::File,
            "Package several files into a single zip archive.",
        ),
        engine::text_translator::TOOL_ID => (
            "Text Translator",
            ToolCategory::Text,
            "Translate text into one or two target languages.",
        ),
        engine::qr_generator::TOOL_ID => (
            "QR Code Generator",
            ToolCategory::Image,
            "Encode text or a link as a QR code PNG.",
        ),
        engine::video_to_gif::TOOL_ID => (
            "Video to GIF",
            ToolCategory::Image,
            "Convert a short clip of a video into a looping GIF.",
        ),
        _ => ("Unknown", ToolCategory::Utility, ""),
    };
    ToolInfo {
        name,
        category,
        description,
        ai_exposed: true,
    }
}

/// Registers every built-in tool. Does nothing when the registry already holds tools.
pub fn initialize_tools(reg: &mut ToolRegistry, cfg: &Config) {
    if !reg.is_empty() {
        return;
    }
    for engine in engine::build_engines(cfg) {
        let info = tool_info(engine.tool_id());
        reg.register(engine, info);
    }
    info!("registered {} tools", reg.len());
}
