mod common;

use common::{form_with, output_bytes, png_file, sample_png};
use serde_json::json;
use versa_tools::config::Background;
use versa_tools::engine::BgRemover;

fn copy_command() -> Background {
    Background {
        command: "cp".into(),
        args: vec!["{input}".into(), "{output}".into()],
    }
}

#[tokio::test]
async fn runs_configured_command_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let engine = BgRemover::new(copy_command(), dir.path().to_path_buf());
    let opts = engine.validate(&json!({})).unwrap();
    let form = form_with(vec![png_file("cat.png", 8, 8)]);

    let result = engine.process(form.into(), opts).await.unwrap();
    assert_eq!(result.metadata["fileName"], json!("bg-removed-cat.png"));
    assert_eq!(result.metadata["mimeType"], json!("image/png"));

    assert_eq!(output_bytes(result).await, sample_png(8, 8));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn command_failure_is_a_processing_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = BgRemover::new(
        Background {
            command: "false".into(),
            args: vec![],
        },
        dir.path().to_path_buf(),
    );
    let opts = engine.validate(&json!({})).unwrap();
    let form = form_with(vec![png_file("cat.png", 8, 8)]);

    let err = engine.process(form.into(), opts).await.err().unwrap();
    assert!(err.to_string().starts_with("Failed to remove background"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
