mod common;

use common::{form_with, output_bytes, png_file};
use image::GenericImageView;
use serde_json::json;
use versa_tools::engine::watermark_remover::{Region, clamp_region};
use versa_tools::engine::{FormData, ImageCompressor, UploadedFile, WatermarkRemover, WatermarkRemoverOptions};
use versa_tools::error::ErrorKind;

#[tokio::test]
async fn png_at_full_quality_keeps_dimensions() {
    let engine = ImageCompressor;
    let opts = engine.validate(&json!({ "quality": 100, "format": "png" })).unwrap();
    let form = form_with(vec![png_file("photo.png", 40, 30)]);

    let result = engine.process(form.into(), opts).await.unwrap();
    assert_eq!(result.metadata["mimeType"], json!("image/png"));
    assert_eq!(result.metadata["fileName"], json!("photo-compressed.png"));

    let out = output_bytes(result).await;
    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!(decoded.dimensions(), (40, 30));
}

#[tokio::test]
async fn jpeg_is_the_default_format() {
    let engine = ImageCompressor;
    let opts = engine.validate(&json!({ "quality": "55" })).unwrap();
    assert_eq!(opts.quality, 55);
    let form = form_with(vec![png_file("shot.final.png", 16, 16)]);

    let result = engine.process(form.into(), opts).await.unwrap();
    assert_eq!(result.metadata["mimeType"], json!("image/jpeg"));
    assert_eq!(result.metadata["fileName"], json!("shot.final-compressed.jpg"));
    let out = output_bytes(result).await;
    assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::Jpeg);
}

#[tokio::test]
async fn webp_output_is_webp() {
    let engine = ImageCompressor;
    let opts = engine.validate(&json!({ "quality": 70, "format": "webp" })).unwrap();
    let form = form_with(vec![png_file("tile.png", 24, 24)]);

    let result = engine.process(form.into(), opts).await.unwrap();
    assert_eq!(result.metadata["fileName"], json!("tile-compressed.webp"));
    let out = output_bytes(result).await;
    assert_eq!(image::guess_format(&out).unwrap(), image::ImageFormat::WebP);
}

#[tokio::test]
async fn webp_beyond_dimension_limit_is_a_processing_error() {
    let engine = ImageCompressor;
    let opts = engine.validate(&json!({ "format": "webp" })).unwrap();
    let form = form_with(vec![png_file("strip.png", 17000, 1)]);

    let err = engine.process(form.into(), opts).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProcessingFailed);
    let message = err.to_string();
    assert!(message.starts_with("Failed to compress image"), "{message}");
    assert!(message.contains("16383"), "{message}");
}

#[test]
fn compressor_option_bounds() {
    let engine = ImageCompressor;
    assert!(engine.validate(&json!({ "quality": 0 })).is_err());
    assert!(engine.validate(&json!({ "quality": 101 })).is_err());
    assert!(engine.validate(&json!({ "quality": "high" })).is_err());
    let err = engine.validate(&json!({ "format": "tiff" })).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidOptions);
}

#[tokio::test]
async fn compressor_rejects_non_images() {
    let engine = ImageCompressor;
    let opts = engine.validate(&json!({})).unwrap();
    let mut form = FormData::new();
    form.append_file("files", UploadedFile::new("notes.txt", "text/plain", b"hello".to_vec()));

    let err = engine.process(form.into(), opts).await.err().unwrap();
    assert!(err.to_string().contains("Invalid file type"));
}

#[test]
fn watermark_region_is_clamped_to_image() {
    let opts = WatermarkRemoverOptions {
        x: 90.0,
        y: 90.0,
        width: 50.0,
        height: 50.0,
    };
    assert_eq!(
        clamp_region(&opts, 100, 100),
        Region {
            x: 90,
            y: 90,
            width: 10,
            height: 10
        }
    );

    let far = WatermarkRemoverOptions {
        x: 500.0,
        y: 0.0,
        width: 1.0,
        height: 1000.0,
    };
    assert_eq!(
        clamp_region(&far, 100, 50),
        Region {
            x: 99,
            y: 0,
            width: 1,
            height: 50
        }
    );
}

#[test]
fn watermark_requires_a_rectangle() {
    let engine = WatermarkRemover;
    assert!(engine.validate(&json!({ "x": 1, "y": 1, "width": 5 })).is_err());
    assert!(engine.validate(&json!({ "x": -1, "y": 1, "width": 5, "height": 5 })).is_err());
    assert!(engine.validate(&json!({ "x": "3", "y": 1, "width": 5, "height": 5 })).is_ok());
}

#[tokio::test]
async fn watermark_output_is_png_with_region() {
    let engine = WatermarkRemover;
    let opts = engine
        .validate(&json!({ "x": 90, "y": 90, "width": 50, "height": 50 }))
        .unwrap();
    let form = form_with(vec![png_file("poster.png", 100, 100)]);

    let result = engine.process(form.into(), opts).await.unwrap();
    assert_eq!(result.metadata["region"], json!({ "x": 90, "y": 90, "width": 10, "height": 10 }));
    assert_eq!(result.metadata["fileName"], json!("poster-watermark-removed.png"));

    let out = output_bytes(result).await;
    let decoded = image::load_from_memory(&out).unwrap();
    assert_eq!(decoded.dimensions(), (100, 100));
}
