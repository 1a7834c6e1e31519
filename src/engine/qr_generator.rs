use super::options::OptionsReader;
use super::types::{ExecutionResult, Metadata, ToolInput};
use crate::error::ToolError;
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use serde_json::{Value, json};
use std::io::Cursor;
use tracing::info;

pub const TOOL_ID: &str = "qr-generator";

const LEVELS: &[&str] = &["L", "M", "Q", "H"];

#[derive(Debug, Clone)]
pub struct QrGeneratorOptions {
    pub text: String,
    pub size: u32,
    pub margin: u32,
    pub error_correction_level: &'static str,
}

#[derive(Debug, Clone, Default)]
pub struct QrGenerator;

impl QrGenerator {
    pub fn validate(&self, raw: &Value) -> Result<QrGeneratorOptions, ToolError> {
        let opts = OptionsReader::new(TOOL_ID, raw)?;
        let text = opts.required_string("text")?;
        if text.is_empty() {
            return Err(ToolError::invalid(TOOL_ID, "text: must not be empty"));
        }
        Ok(QrGeneratorOptions {
            text,
            size: opts.integer("size", 384, 64, 1024)? as u32,
            margin: opts.integer("margin", 2, 0, 16)? as u32,
            error_correction_level: opts.one_of("errorCorrectionLevel", LEVELS, "M")?,
        })
    }

    pub async fn process(&self, input: ToolInput, opts: QrGeneratorOptions) -> Result<ExecutionResult, ToolError> {
        input.into_form("QR Generator")?;

        let (png, opts) = tokio::task::spawn_blocking(move || {
            let png = render_png(&opts)?;
            Ok::<_, ToolError>((png, opts))
        })
        .await??;
        info!("rendered QR code text_len={} -> {} bytes", opts.text.chars().count(), png.len());

        let mut metadata = Metadata::new();
        metadata.insert("mimeType".into(), json!("image/png"));
        metadata.insert("fileName".into(), json!("qrcode.png"));
        metadata.insert("textLength".into(), json!(opts.text.encode_utf16().count()));
        metadata.insert("size".into(), json!(opts.size));
        metadata.insert("margin".into(), json!(opts.margin));
        metadata.insert("errorCorrectionLevel".into(), json!(opts.error_correction_level));

        Ok(ExecutionResult::buffered(png, metadata))
    }
}

fn ec_level(level: &str) -> EcLevel {
    match level {
        "L" => EcLevel::L,
        "Q" => EcLevel::Q,
        "H" => EcLevel::H,
        _ => EcLevel::M,
    }
}

/// Square black-on-white raster with a `margin`-module quiet zone.
///
/// Each module is `floor(size / (modules + 2 * margin))` pixels wide (at least 1), so the image side is
/// a whole multiple of the total module count and may fall slightly short of `size`.
pub fn render(opts: &QrGeneratorOptions) -> Result<GrayImage, ToolError> {
    let code = QrCode::with_error_correction_level(opts.text.as_bytes(), ec_level(opts.error_correction_level))
        .map_err(|e| ToolError::failed("Failed to encode QR code", e))?;

    let modules = code.width() as u32;
    let total = modules + 2 * opts.margin;
    let scale = (opts.size / total).max(1);
    let side = total * scale;

    let mut img = GrayImage::from_pixel(side, side, Luma([255]));
    let colors = code.to_colors();
    for (i, color) in colors.iter().enumerate() {
        if *color != Color::Dark {
            continue;
        }
        let mx = (i as u32 % modules) + opts.margin;
        let my = (i as u32 / modules) + opts.margin;
        for dy in 0..scale {
            for dx in 0..scale {
                img.put_pixel(mx * scale + dx, my * scale + dy, Luma([0]));
            }
        }
    }
    Ok(img)
}

pub fn render_png(opts: &QrGeneratorOptions) -> Result<Vec<u8>, ToolError> {
    let img = render(opts)?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ToolError::failed("Failed to encode QR code", e))?;
    Ok(out.into_inner())
}
