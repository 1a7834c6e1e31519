use serde_json::json;
use std::path::Path;
use versa_tools::engine::video_to_gif::{palette_args, render_args};
use versa_tools::engine::{FormData, UploadedFile, VideoToGif, VideoToGifOptions};
use versa_tools::error::ErrorKind;

fn engine(dir: &Path, ffmpeg: &str) -> VideoToGif {
    VideoToGif::new(ffmpeg, dir.to_path_buf())
}

#[test]
fn duration_upper_bound_is_inclusive() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path(), "ffmpeg");
    assert!(e.validate(&json!({ "duration": 60.0 })).is_ok());
    let err = e.validate(&json!({ "duration": 60.0001 })).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::InvalidOptions);
    assert!(e.validate(&json!({ "duration": 0.05 })).is_err());
}

#[test]
fn defaults_and_coercion() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path(), "ffmpeg");
    let opts = e.validate(&json!({ "fps": "12", "width": null })).unwrap();
    assert_eq!(
        opts,
        VideoToGifOptions {
            start: 0.0,
            duration: 5.0,
            fps: 12.0,
            width: 480.0,
        }
    );
    assert!(e.validate(&json!({ "width": 63 })).is_err());
    assert!(e.validate(&json!({ "fps": 31 })).is_err());
    assert!(e.validate(&json!({ "start": -1 })).is_err());
}

#[test]
fn two_pass_arguments() {
    let opts = VideoToGifOptions {
        start: 1.5,
        duration: 3.0,
        fps: 10.0,
        width: 320.0,
    };
    let input = Path::new("/tmp/in.mp4");
    let palette = Path::new("/tmp/pal.png");
    let output = Path::new("/tmp/out.gif");

    let pass1 = palette_args(input, palette, &opts);
    assert_eq!(pass1[..5], ["-y", "-ss", "1.5", "-t", "3"]);
    assert!(pass1.contains(&"fps=10,scale=320:-1:flags=lanczos,palettegen".to_string()));
    assert_eq!(pass1.last().unwrap(), "/tmp/pal.png");

    let pass2 = render_args(input, palette, output, &opts);
    assert!(pass2.contains(
        &"[0:v]fps=10,scale=320:-1:flags=lanczos[video];[video][1:v]paletteuse=dither=bayer:bayer_scale=5".to_string()
    ));
    let loop_at = pass2.iter().position(|a| a == "-loop").unwrap();
    assert_eq!(pass2[loop_at + 1], "0");
    assert_eq!(pass2.last().unwrap(), "/tmp/out.gif");
}

#[tokio::test]
async fn failed_transcode_leaves_no_scratch_files() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path(), "/nonexistent/ffmpeg-missing");
    let opts = e.validate(&json!({})).unwrap();
    let mut form = FormData::new();
    form.append_file("files", UploadedFile::new("clip.mp4", "video/mp4", vec![0u8; 1024]));

    let err = e.process(form.into(), opts).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::ProcessingFailed);
    assert!(err.to_string().contains("Failed to generate GIF palette"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn requires_exactly_one_video() {
    let dir = tempfile::tempdir().unwrap();
    let e = engine(dir.path(), "ffmpeg");
    let opts = e.validate(&json!({})).unwrap();
    let mut form = FormData::new();
    form.append_file("files", UploadedFile::new("still.png", "image/png", vec![1u8; 8]));

    let err = e.process(form.into(), opts).await.err().unwrap();
    assert!(err.to_string().contains("Exactly 1 video file"));
}
