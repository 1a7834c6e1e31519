pub mod archive;
pub mod bg_remover;
pub mod command;
pub mod file_archiver;
pub mod image_compressor;
pub mod options;
pub mod pdf_merger;
pub mod pdf_splitter;
pub mod pdf_tree;
pub mod qr_generator;
pub mod scratch;
pub mod text_translator;
pub mod types;
pub mod video_to_gif;
pub mod watermark_remover;

use crate::config::Config;
use crate::error::ToolError;
use serde_json::Value;

pub use bg_remover::{BgRemover, BgRemoverOptions};
pub use file_archiver::{FileArchiver, FileArchiverOptions};
pub use image_compressor::{ImageCompressor, ImageCompressorOptions};
pub use pdf_merger::{PdfMerger, PdfMergerOptions};
pub use pdf_splitter::{PdfSplitter, PdfSplitterOptions};
pub use qr_generator::{QrGenerator, QrGeneratorOptions};
pub use text_translator::{Provider, TextTranslator, TextTranslatorOptions};
pub use types::{
    ByteStream, ExecutionMode, ExecutionResult, FormData, Metadata, StreamInput, ToolInput, UploadedFile,
};
pub use video_to_gif::{VideoToGif, VideoToGifOptions};
pub use watermark_remover::{WatermarkRemover, WatermarkRemoverOptions};

/// Lower bound for advisory duration estimates, in seconds.
pub const MIN_ESTIMATED_SECONDS: f64 = 2.0;

/// The closed set of processing engines. Each variant is stateless across invocations.
#[derive(Debug, Clone)]
pub enum Engine {
    PdfMerger(PdfMerger),
    PdfSplitter(PdfSplitter),
    ImageCompressor(ImageCompressor),
    BgRemover(BgRemover),
    WatermarkRemover(WatermarkRemover),
    FileArchiver(FileArchiver),
    VideoToGif(VideoToGif),
    QrGenerator(QrGenerator),
    TextTranslator(TextTranslator),
}

/// Engine-specific options, produced only by [`Engine::validate`].
#[derive(Debug, Clone)]
pub enum ValidatedOptions {
    PdfMerger(PdfMergerOptions),
    PdfSplitter(PdfSplitterOptions),
    ImageCompressor(ImageCompressorOptions),
    BgRemover(BgRemoverOptions),
    WatermarkRemover(WatermarkRemoverOptions),
    FileArchiver(FileArchiverOptions),
    VideoToGif(VideoToGifOptions),
    QrGenerator(QrGeneratorOptions),
    TextTranslator(TextTranslatorOptions),
}

impl Engine {
    pub fn tool_id(&self) -> &'static str {
        match self {
            Engine::PdfMerger(_) => pdf_merger::TOOL_ID,
            Engine::PdfSplitter(_) => pdf_splitter::TOOL_ID,
            Engine::ImageCompressor(_) => image_compressor::TOOL_ID,
            Engine::BgRemover(_) => bg_remover::TOOL_ID,
            Engine::WatermarkRemover(_) => watermark_remover::TOOL_ID,
            Engine::FileArchiver(_) => file_archiver::TOOL_ID,
            Engine::VideoToGif(_) => video_to_gif::TOOL_ID,
            Engine::QrGenerator(_) => qr_generator::TOOL_ID,
            Engine::TextTranslator(_) => text_translator::TOOL_ID,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        ExecutionMode::Batch
    }

    /// Estimated seconds of work per megabyte of input.
    pub fn rate(&self) -> f64 {
        match self {
            Engine::PdfMerger(_) | Engine::PdfSplitter(_) | Engine::FileArchiver(_) => 0.5,
            Engine::ImageCompressor(_) => 2.0,
            Engine::BgRemover(_) | Engine::VideoToGif(_) => 5.0,
            Engine::WatermarkRemover(_) => 3.0,
            Engine::QrGenerator(_) => 0.01,
            Engine::TextTranslator(_) => 0.1,
        }
    }

    pub fn estimate_duration(&self, input_size_mb: f64) -> f64 {
        (input_size_mb * self.rate()).max(MIN_ESTIMATED_SECONDS)
    }

    pub fn validate(&self, raw: &Value) -> Result<ValidatedOptions, ToolError> {
        Ok(match self {
            Engine::PdfMerger(e) => ValidatedOptions::PdfMerger(e.validate(raw)?),
            Engine::PdfSplitter(e) => ValidatedOptions::PdfSplitter(e.validate(raw)?),
            Engine::ImageCompressor(e) => ValidatedOptions::ImageCompressor(e.validate(raw)?),
            Engine::BgRemover(e) => ValidatedOptions::BgRemover(e.validate(raw)?),
            Engine::WatermarkRemover(e) => ValidatedOptions::WatermarkRemover(e.validate(raw)?),
            Engine::FileArchiver(e) => ValidatedOptions::FileArchiver(e.validate(raw)?),
            Engine::VideoToGif(e) => ValidatedOptions::VideoToGif(e.validate(raw)?),
            Engine::QrGenerator(e) => ValidatedOptions::QrGenerator(e.validate(raw)?),
            Engine::TextTranslator(e) => ValidatedOptions::TextTranslator(e.validate(raw)?),
        })
    }

    /// Runs the engine. Options must come from this engine's own `validate`.
    pub async fn process(&self, input: ToolInput, opts: ValidatedOptions) -> Result<ExecutionResult, ToolError> {
        match (self, opts) {
            (Engine::PdfMerger(e), ValidatedOptions::PdfMerger(o)) => e.process(input, o).await,
            (Engine::PdfSplitter(e), ValidatedOptions::PdfSplitter(o)) => e.process(input, o).await,
            (Engine::ImageCompressor(e), ValidatedOptions::ImageCompressor(o)) => e.process(input, o).await,
            (Engine::BgRemover(e), ValidatedOptions::BgRemover(o)) => e.process(input, o).await,
            (Engine::WatermarkRemover(e), ValidatedOptions::WatermarkRemover(o)) => e.process(input, o).await,
            (Engine::FileArchiver(e), ValidatedOptions::FileArchiver(o)) => e.process(input, o).await,
            (Engine::VideoToGif(e), ValidatedOptions::VideoToGif(o)) => e.process(input, o).await,
            (Engine::QrGenerator(e), ValidatedOptions::QrGenerator(o)) => e.process(input, o).await,
            (Engine::TextTranslator(e), ValidatedOptions::TextTranslator(o)) => e.process(input, o).await,
            (engine, _) => Err(ToolError::processing(format!(
                "options were not validated by {}",
                engine.tool_id()
            ))),
        }
    }
}

/// Every engine, configured from `cfg`, in registration order.
pub fn build_engines(cfg: &Config) -> Vec<Engine> {
    let scratch = cfg.scratch_dir();
    vec![
        Engine::PdfMerger(PdfMerger),
        Engine::PdfSplitter(PdfSplitter::new(cfg.archive.clone())),
        Engine::BgRemover(BgRemover::new(cfg.background.clone(), scratch.clone())),
        Engine::ImageCompressor(ImageCompressor),
        Engine::WatermarkRemover(WatermarkRemover),
        Engine::FileArchiver(FileArchiver::new(cfg.archive.clone())),
        Engine::TextTranslator(TextTranslator::new(
            Provider::from_env(&cfg.translate),
            cfg.translate.temperature,
        )),
        Engine::QrGenerator(QrGenerator),
        Engine::VideoToGif(VideoToGif::new(cfg.transcode.ffmpeg_exe.clone(), scratch)),
    ]
}
