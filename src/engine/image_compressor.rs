use super::options::OptionsReader;
use super::types::{ExecutionResult, Metadata, ToolInput};
use crate::error::ToolError;
use crate::util::file_stem;
use bytes::Bytes;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use serde_json::{Value, json};
use tracing::info;

pub const TOOL_ID: &str = "image-compressor";

const FORMATS: &[&str] = &["jpeg", "png", "webp", "avif"];
const PALETTE_COLORS: usize = 256;
const AVIF_SPEED: u8 = 8;
const WEBP_MAX_DIMENSION: u32 = 16383;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    fn parse(s: &str) -> Self {
        match s {
            "png" => OutputFormat::Png,
            "webp" => OutputFormat::Webp,
            "avif" => OutputFormat::Avif,
            _ => OutputFormat::Jpeg,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            other => other.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageCompressorOptions {
    pub quality: u8,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default)]
pub struct ImageCompressor;

impl ImageCompressor {
    pub fn validate(&self, raw: &Value) -> Result<ImageCompressorOptions, ToolError> {
        let opts = OptionsReader::new(TOOL_ID, raw)?;
        let quality = opts.number("quality", 80.0, Some(1.0), Some(100.0))?;
        let format = opts.one_of("format", FORMATS, "jpeg")?;
        Ok(ImageCompressorOptions {
            quality: quality.round() as u8,
            format: OutputFormat::parse(format),
        })
    }

    pub async fn process(&self, input: ToolInput, opts: ImageCompressorOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("Image Compressor")?;
        let file = form
            .file("files")
            .ok_or_else(|| ToolError::processing("No image file provided"))?
            .clone();

        if !file.is_image() {
            return Err(ToolError::processing("Invalid file type. Please upload an image."));
        }

        let data = file.data.clone();
        let output = tokio::task::spawn_blocking(move || compress(&data, opts))
            .await?
            .map_err(|e| ToolError::failed("Failed to compress image", e))?;

        info!(
            "compressed {} {} -> {} bytes as {}",
            file.name,
            file.size(),
            output.len(),
            opts.format.as_str()
        );

        let mut metadata = Metadata::new();
        metadata.insert("originalName".into(), json!(file.name));
        metadata.insert("originalSize".into(), json!(file.size()));
        metadata.insert("outputSize".into(), json!(output.len()));
        metadata.insert("mimeType".into(), json!(format!("image/{}", opts.format.as_str())));
        metadata.insert(
            "fileName".into(),
            json!(format!("{}-compressed.{}", file_stem(&file.name), opts.format.extension())),
        );

        Ok(ExecutionResult::buffered(output, metadata))
    }
}

/// Decodes `data` and re-encodes it in the requested format.
pub fn compress(data: &Bytes, opts: ImageCompressorOptions) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(data).map_err(|e| e.to_string())?;
    match opts.format {
        OutputFormat::Jpeg => encode_jpeg(&img, opts.quality),
        OutputFormat::Png => encode_palette_png(&img, opts.quality),
        OutputFormat::Webp => encode_webp(&img, opts.quality),
        OutputFormat::Avif => encode_avif(&img, opts.quality),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    img.to_rgb8()
        .write_with_encoder(encoder)
        .map_err(|e| e.to_string())?;
    Ok(out)
}

/// 8-bit palette PNG: NeuQuant quantisation followed by maximum deflate.
/// Higher quality samples more pixels while training the palette.
fn encode_palette_png(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels = rgba.as_raw();

    let samplefac = 1 + (100 - i32::from(quality.min(100))) * 29 / 99;
    let quant = color_quant::NeuQuant::new(samplefac, PALETTE_COLORS, pixels);

    let indices: Vec<u8> = pixels
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();

    let map = quant.color_map_rgba();
    let mut palette = Vec::with_capacity(PALETTE_COLORS * 3);
    let mut alpha = Vec::with_capacity(PALETTE_COLORS);
    for entry in map.chunks_exact(4) {
        palette.extend_from_slice(&entry[..3]);
        alpha.push(entry[3]);
    }

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(palette);
        if alpha.iter().any(|a| *a != u8::MAX) {
            encoder.set_trns(alpha);
        }
        encoder.set_compression(png::Compression::Best);
        let mut writer = encoder.write_header().map_err(|e| e.to_string())?;
        writer.write_image_data(&indices).map_err(|e| e.to_string())?;
        writer.finish().map_err(|e| e.to_string())?;
    }
    Ok(out)
}

fn encode_webp(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
        return Err(format!(
            "{width}x{height} exceeds the WebP limit of {WEBP_MAX_DIMENSION} pixels per side"
        ));
    }
    let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        .encode_simple(false, f32::from(quality))
        .map_err(|e| format!("webp encoder: {e:?}"))?;
    Ok(encoded.to_vec())
}

fn encode_avif(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    let encoder = AvifEncoder::new_with_speed_quality(&mut out, AVIF_SPEED, quality);
    img.to_rgba8()
        .write_with_encoder(encoder)
        .map_err(|e| e.to_string())?;
    Ok(out)
}
