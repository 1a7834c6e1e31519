use super::options::OptionsReader;
use super::types::{ExecutionResult, Metadata, ToolInput};
use crate::error::ToolError;
use crate::util::file_stem;
use bytes::Bytes;
use image::{GenericImageView, ImageFormat, imageops};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::io::Cursor;
use tracing::{debug, info};

pub const TOOL_ID: &str = "watermark-remover";

const BLUR_SIGMA: f32 = 20.0;

#[derive(Debug, Clone, Copy)]
pub struct WatermarkRemoverOptions {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Pixel rectangle inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Clamps the requested rectangle to an image of `image_width` x `image_height`.
/// Each edge is clamped independently; the result is never empty.
pub fn clamp_region(opts: &WatermarkRemoverOptions, image_width: u32, image_height: u32) -> Region {
    let iw = f64::from(image_width);
    let ih = f64::from(image_height);
    let x = opts.x.min(iw - 1.0).max(0.0);
    let y = opts.y.min(ih - 1.0).max(0.0);
    let w = opts.width.min(iw - x).max(1.0);
    let h = opts.height.min(ih - y).max(1.0);

    let x = (x.round() as u32).min(image_width.saturating_sub(1));
    let y = (y.round() as u32).min(image_height.saturating_sub(1));
    Region {
        x,
        y,
        width: (w.round() as u32).clamp(1, image_width - x),
        height: (h.round() as u32).clamp(1, image_height - y),
    }
}

#[derive(Debug, Clone, Default)]
pub struct WatermarkRemover;

impl WatermarkRemover {
    pub fn validate(&self, raw: &Value) -> Result<WatermarkRemoverOptions, ToolError> {
        let opts = OptionsReader::new(TOOL_ID, raw)?;
        Ok(WatermarkRemoverOptions {
            x: opts.required_number("x", Some(0.0), None)?,
            y: opts.required_number("y", Some(0.0), None)?,
            width: opts.required_number("width", Some(1.0), None)?,
            height: opts.required_number("height", Some(1.0), None)?,
        })
    }

    pub async fn process(&self, input: ToolInput, opts: WatermarkRemoverOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("Watermark Remover")?;
        let file = form
            .file("files")
            .ok_or_else(|| ToolError::processing("No image file provided"))?
            .clone();

        if !file.is_image() {
            return Err(ToolError::processing("Invalid file type. Please upload an image."));
        }

        let data = file.data.clone();
        let (output, region) = tokio::task::spawn_blocking(move || blur_region(&data, &opts)).await??;

        info!(
            "blurred {} region={}x{}+{}+{}",
            file.name, region.width, region.height, region.x, region.y
        );

        let mut metadata = Metadata::new();
        metadata.insert("originalName".into(), json!(file.name));
        metadata.insert("outputSize".into(), json!(output.len()));
        metadata.insert("mimeType".into(), json!("image/png"));
        metadata.insert(
            "fileName".into(),
            json!(format!("{}-watermark-removed.png", file_stem(&file.name))),
        );
        metadata.insert("region".into(), json!(region));

        Ok(ExecutionResult::buffered(output, metadata))
    }
}

fn blur_region(data: &Bytes, opts: &WatermarkRemoverOptions) -> Result<(Vec<u8>, Region), ToolError> {
    let mut img = image::load_from_memory(data).map_err(|e| ToolError::failed("Unable to read image", e))?;
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ToolError::processing("Unable to read image dimensions"));
    }

    let region = clamp_region(opts, width, height);
    debug!(?region, "clamped watermark region");

    let patch = img.crop_imm(region.x, region.y, region.width, region.height);
    let blurred = imageops::blur(&patch, BLUR_SIGMA);
    imageops::overlay(&mut img, &blurred, i64::from(region.x), i64::from(region.y));

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ToolError::failed("Failed to encode image", e))?;
    Ok((out.into_inner(), region))
}
