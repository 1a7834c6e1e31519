use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub transcode: Transcode,
    #[serde(default)]
    pub background: Background,
    #[serde(default)]
    pub archive: Archive,
    #[serde(default)]
    pub translate: Translate,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    /// Directory for per-invocation scratch files. Empty means the OS temp dir.
    pub fn scratch_dir(&self) -> PathBuf {
        if self.paths.scratch_dir.trim().is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.paths.scratch_dir)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub scratch_dir: String,
    pub out_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            scratch_dir: "".into(),
            out_dir: "out".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcode {
    pub ffmpeg_exe: String,
}
impl Default for Transcode {
    fn default() -> Self {
        Self {
            ffmpeg_exe: "ffmpeg".into(),
        }
    }
}

/// External segmentation command used by the background remover.
/// `{input}` and `{output}` in `args` are replaced with scratch file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Background {
    pub command: String,
    pub args: Vec<String>,
}
impl Default for Background {
    fn default() -> Self {
        Self {
            command: "rembg".into(),
            args: vec!["i".into(), "{input}".into(), "{output}".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    pub compression_level: i32,
    pub chunk_bytes: usize,
    pub pipe_capacity_bytes: usize,
}
impl Default for Archive {
    fn default() -> Self {
        Self {
            compression_level: 9,
            chunk_bytes: 64 * 1024,
            pipe_capacity_bytes: 256 * 1024,
        }
    }
}

/// Provider defaults. Credentials are read from the environment variables named here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translate {
    pub deepseek_base_url: String,
    pub deepseek_model: String,
    pub openai_base_url: String,
    pub openai_model: String,
    pub deepseek_key_env: String,
    pub openai_key_env: String,
    pub custom_url_env: String,
    pub custom_key_env: String,
    pub temperature: f32,
}
impl Default for Translate {
    fn default() -> Self {
        Self {
            deepseek_base_url: "https://api.deepseek.com".into(),
            deepseek_model: "deepseek-chat".into(),
            openai_base_url: "https://api.openai.com".into(),
            openai_model: "gpt-4.1-mini".into(),
            deepseek_key_env: "DEEPSEEK_API_KEY".into(),
            openai_key_env: "OPENAI_API_KEY".into(),
            custom_url_env: "TRANSLATE_API_URL".into(),
            custom_key_env: "TRANSLATE_API_KEY".into(),
            temperature: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
