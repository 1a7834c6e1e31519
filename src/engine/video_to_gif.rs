use super::command::run_tool_command;
use super::options::OptionsReader;
use super::scratch::{scratch_file, scratch_file_with};
use super::types::{ByteStream, ExecutionResult, Metadata, ToolInput, UploadedFile};
use crate::error::ToolError;
use crate::util::{file_extension, file_stem, format_seconds};
use bytes::Bytes;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

pub const TOOL_ID: &str = "video-to-gif";

const READ_CHUNK_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoToGifOptions {
    pub start: f64,
    pub duration: f64,
    pub fps: f64,
    pub width: f64,
}

#[derive(Debug, Clone)]
pub struct VideoToGif {
    ffmpeg: String,
    scratch_dir: PathBuf,
}

impl VideoToGif {
    pub fn new(ffmpeg: impl Into<String>, scratch_dir: PathBuf) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            scratch_dir,
        }
    }

    pub fn validate(&self, raw: &Value) -> Result<VideoToGifOptions, ToolError> {
        let opts = OptionsReader::new(TOOL_ID, raw)?;
        Ok(VideoToGifOptions {
            start: opts.number("start", 0.0, Some(0.0), None)?,
            duration: opts.number("duration", 5.0, Some(0.1), Some(60.0))?,
            fps: opts.number("fps", 10.0, Some(1.0), Some(30.0))?,
            width: opts.number("width", 480.0, Some(64.0), Some(800.0))?,
        })
    }

    /// Two ffmpeg passes: palette generation over the selected window, then a dithered
    /// encode of the same window against that palette. All three scratch files are
    /// removed when the returned stream finishes or is dropped, or as soon as a pass fails.
    pub async fn process(&self, input: ToolInput, opts: VideoToGifOptions) -> Result<ExecutionResult, ToolError> {
        let form = input.into_form("Video to GIF")?;
        let videos: Vec<&UploadedFile> = form.files().filter(|f| f.is_video()).collect();

        if videos.len() != 1 {
            return Err(ToolError::processing("Exactly 1 video file is required for conversion"));
        }
        let file = videos[0];

        let ext = file_extension(&file.name).unwrap_or(".mp4");
        let input_path = scratch_file_with(&self.scratch_dir, "video-to-gif-input", ext, &file.data).await?;
        let palette_path = scratch_file(&self.scratch_dir, "video-to-gif-palette", ".png")?;
        let output_path = scratch_file(&self.scratch_dir, "video-to-gif", ".gif")?;

        debug!(
            "transcoding {} start={} duration={} fps={} width={}",
            file.name, opts.start, opts.duration, opts.fps, opts.width
        );

        run_tool_command(
            &self.ffmpeg,
            palette_args(&input_path, &palette_path, &opts),
            "Failed to generate GIF palette",
        )
        .await?;

        run_tool_command(
            &self.ffmpeg,
            render_args(&input_path, &palette_path, &output_path, &opts),
            "Failed to convert video to GIF",
        )
        .await?;

        let size = tokio::fs::metadata(&output_path)
            .await
            .map_err(|e| ToolError::failed("Failed to convert video to GIF", e))?
            .len();
        if size == 0 {
            return Err(ToolError::processing(
                "Failed to convert video to GIF: empty output from ffmpeg",
            ));
        }

        info!("converted {} to GIF ({size} bytes)", file.name);

        let mut metadata = Metadata::new();
        metadata.insert("originalName".into(), json!(file.name));
        metadata.insert("mimeType".into(), json!("image/gif"));
        metadata.insert("fileName".into(), json!(format!("{}.gif", file_stem(&file.name))));
        metadata.insert("start".into(), json!(opts.start));
        metadata.insert("duration".into(), json!(opts.duration));
        metadata.insert("fps".into(), json!(opts.fps));
        metadata.insert("width".into(), json!(opts.width));

        Ok(ExecutionResult {
            output: stream_scratch_output(output_path, vec![input_path, palette_path]),
            metadata,
        })
    }
}

fn filter_chain(opts: &VideoToGifOptions) -> String {
    format!(
        "fps={},scale={}:-1:flags=lanczos",
        format_seconds(opts.fps),
        format_seconds(opts.width)
    )
}

/// Pass 1: palette for the selected window.
pub fn palette_args(input: &Path, palette: &Path, opts: &VideoToGifOptions) -> Vec<String> {
    vec![
        "-y".into(),
        "-ss".into(),
        format_seconds(opts.start),
        "-t".into(),
        format_seconds(opts.duration),
        "-i".into(),
        input.display().to_string(),
        "-vf".into(),
        format!("{},palettegen", filter_chain(opts)),
        palette.display().to_string(),
    ]
}

/// Pass 2: dithered render of the same window against the palette, looping forever.
pub fn render_args(input: &Path, palette: &Path, output: &Path, opts: &VideoToGifOptions) -> Vec<String> {
    vec![
        "-y".into(),
        "-ss".into(),
        format_seconds(opts.start),
        "-t".into(),
        format_seconds(opts.duration),
        "-i".into(),
        input.display().to_string(),
        "-i".into(),
        palette.display().to_string(),
        "-filter_complex".into(),
        format!(
            "[0:v]{}[video];[video][1:v]paletteuse=dither=bayer:bayer_scale=5",
            filter_chain(opts)
        ),
        "-loop".into(),
        "0".into(),
        output.display().to_string(),
    ]
}

/// Streams `output` from disk. The stream owns every scratch guard, so dropping it removes the files.
fn stream_scratch_output(output: TempPath, others: Vec<TempPath>) -> ByteStream {
    let stream = async_stream::try_stream! {
        let _guards = others;
        let mut file = tokio::fs::File::open(&output)
            .await
            .map_err(|e| ToolError::failed("Failed to read GIF output", e))?;
        let mut buf = vec![0u8; READ_CHUNK_BYTES];
        loop {
            let n = file
                .read(&mut buf)
                .await
                .map_err(|e| ToolError::failed("Failed to read GIF output", e))?;
            if n == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buf[..n]);
        }
        drop(file);
        drop(output);
    };
    Box::pin(stream)
}
