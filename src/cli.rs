use crate::{
    agent::{self, AgentRequest},
    config::Config,
    dispatcher::{Dispatcher, ResponseBody, TransportResponse},
    engine::{FormData, Provider, UploadedFile, command::probe_version},
    page_plan::{PagePlan, is_valid_expression},
    registry::ToolRegistry,
    router,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use futures::StreamExt;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "versa-tools")]
#[command(about = "File-processing tool dispatcher (PDF, image, archive, GIF, QR, translation)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./versa-tools.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Request inputs shared by `run` and `agent`.
#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// File to upload; repeatable. Sent under the `files` field.
    #[arg(long = "file")]
    pub files: Vec<PathBuf>,

    /// Text field as key=value; repeatable.
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Options JSON object.
    #[arg(long)]
    pub options: Option<String>,

    /// Output path. Defaults to <out_dir>/<fileName>.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check external collaborators (ffmpeg, background removal, translation provider).
    Doctor {},
    /// List registered tools.
    Tools {
        #[arg(long)]
        ai_only: bool,
    },
    /// Run one tool by id.
    Run {
        #[arg(long)]
        tool: String,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Pick a tool from a prompt (or use --tool-id) and run it.
    Agent {
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        tool_id: Option<String>,
        #[arg(long)]
        mode: Option<String>,
        #[command(flatten)]
        input: InputArgs,
    },
    /// Show which tool a prompt routes to.
    Route {
        #[arg(long)]
        prompt: String,
    },
    /// Show the page plan for a range expression.
    Plan {
        #[arg(long)]
        ranges: String,
        #[arg(long)]
        pages: u32,
    },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg).await,
        Command::Tools { ai_only } => list_tools(&cfg, *ai_only),
        Command::Route { prompt } => route(&cfg, prompt),
        Command::Plan { ranges, pages } => plan(ranges, *pages),
        Command::Run { tool, input } => {
            let dispatcher = build_dispatcher(&cfg);
            let form = build_form(input).await?;
            let response = dispatcher
                .execute(tool, form.into(), input.options.as_deref())
                .await;
            finish(&cfg, input, response).await
        }
        Command::Agent {
            prompt,
            tool_id,
            mode,
            input,
        } => {
            let dispatcher = build_dispatcher(&cfg);
            let req = AgentRequest {
                mode: mode.clone(),
                prompt: prompt.clone(),
                tool_id: tool_id.clone(),
            };
            let form = build_form(input).await?;
            let response = agent::handle(&dispatcher, &req, form.into(), input.options.as_deref()).await;
            finish(&cfg, input, response).await
        }
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    for candidate in ["versa-tools.toml", "versa-tools.example.toml"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Config::load(&path);
        }
    }
    Ok(Config::default())
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from(&cfg.paths.out_dir).join("versa-tools.log"))
}

fn build_dispatcher(cfg: &Config) -> Dispatcher {
    Dispatcher::new(Arc::new(ToolRegistry::with_defaults(cfg)))
}

async fn build_form(input: &InputArgs) -> Result<FormData> {
    let mut form = FormData::new();
    for path in &input.files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading input: {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("upload")
            .to_string();
        let content_type = content_type_for(path);
        form.append_file("files", UploadedFile::new(name, content_type, data));
    }
    for field in &input.fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("--field expects key=value, got: {field}"))?;
        form.append_text(key, value);
    }
    Ok(form)
}

/// Declared media type of a local file, from its extension.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "avif" => "image/avif",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "txt" => "text/plain",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

async fn finish(cfg: &Config, input: &InputArgs, response: TransportResponse) -> Result<()> {
    let status = response.status;
    let headers = response.headers.clone();

    let body = match response.body {
        ResponseBody::Json(body) => {
            println!("{}", serde_json::to_string_pretty(&json!({ "status": status, "body": body }))?);
            bail!("tool call failed with status {status}");
        }
        ResponseBody::Stream(body) => body,
    };

    let out_path = match &input.out {
        Some(p) => p.clone(),
        None => {
            let name = headers
                .get("X-Tool-Metadata")
                .and_then(|m| serde_json::from_str::<serde_json::Value>(m).ok())
                .and_then(|m| m.get("fileName").and_then(|v| v.as_str()).map(str::to_string))
                .unwrap_or_else(|| "output.bin".to_string());
            PathBuf::from(&cfg.paths.out_dir).join(name)
        }
    };
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let started = now_rfc3339();
    let written = write_stream(&out_path, body).await?;
    info!("wrote {} bytes to {}", written, out_path.display());

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "status": status,
                "headers": headers,
                "output": out_path,
                "bytes": written,
                "started": started,
                "finished": now_rfc3339(),
            }))?
        );
    }
    Ok(())
}

async fn write_stream(path: &Path, mut body: crate::engine::ByteStream) -> Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("create output: {}", path.display()))?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(err) => {
                drop(file);
                if let Err(e) = tokio::fs::remove_file(path).await {
                    warn!("could not remove partial output {}: {e}", path.display());
                }
                return Err(anyhow!("output stream failed: {err}"));
            }
        };
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

async fn doctor(cfg: &Config) -> Result<()> {
    let ffmpeg = match probe_version(&cfg.transcode.ffmpeg_exe, "-version").await {
        Ok(v) => json!({ "ok": true, "version": v }),
        Err(e) => json!({ "ok": false, "error": e.to_string() }),
    };
    let background = match probe_version(&cfg.background.command, "--version").await {
        Ok(v) => json!({ "ok": true, "version": v }),
        Err(e) => json!({ "ok": false, "error": e.to_string() }),
    };
    let provider = Provider::from_env(&cfg.translate);

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "ffmpeg": { "exe": cfg.transcode.ffmpeg_exe, "probe": ffmpeg },
            "background": { "command": cfg.background.command, "probe": background },
            "translate": { "service": provider.service_name() },
            "scratch_dir": cfg.scratch_dir(),
        }))?
    );
    Ok(())
}

fn list_tools(cfg: &Config, ai_only: bool) -> Result<()> {
    let registry = ToolRegistry::with_defaults(cfg);
    let tools = if ai_only {
        registry.list_ai_exposed()
    } else {
        registry.list_all()
    };
    println!("{}", serde_json::to_string_pretty(&tools)?);
    Ok(())
}

fn route(cfg: &Config, prompt: &str) -> Result<()> {
    let registry = ToolRegistry::with_defaults(cfg);
    let tool_id = router::route(prompt, &registry.list_ai_exposed())?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "prompt": prompt, "toolId": tool_id }))?
    );
    Ok(())
}

fn plan(ranges: &str, pages: u32) -> Result<()> {
    if !is_valid_expression(ranges) {
        bail!("invalid page ranges: {ranges}");
    }
    let plan = PagePlan::parse(ranges, pages);
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
