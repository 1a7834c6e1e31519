use versa_tools::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../versa-tools.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert_eq!(cfg.archive.compression_level, 9);
    assert_eq!(cfg.transcode.ffmpeg_exe, "ffmpeg");
    assert!(!cfg.paths.out_dir.is_empty());
    assert!(cfg.background.args.iter().any(|a| a == "{input}"));
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let cfg: Config = toml::from_str("[transcode]\nffmpeg_exe = \"/opt/ffmpeg\"\n").expect("parse TOML");
    assert_eq!(cfg.transcode.ffmpeg_exe, "/opt/ffmpeg");
    assert_eq!(cfg.archive.compression_level, 9);
    assert_eq!(cfg.translate.deepseek_model, "deepseek-chat");
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn empty_scratch_dir_means_temp_dir() {
    let cfg = Config::default();
    assert_eq!(cfg.scratch_dir(), std::env::temp_dir());
}
