use crate::error::ToolError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

const STDERR_TAIL_BYTES: usize = 2000;

/// Runs an external tool to completion. Output is discarded; stderr is kept for the error message.
///
/// The child is killed if the returned future is dropped before it finishes.
pub async fn run_tool_command<I, S>(exe: &str, args: I, label: &str) -> Result<(), ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(exe);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    debug!("spawn {label}: {exe}");

    let output = cmd
        .output()
        .await
        .map_err(|e| ToolError::failed(label, format!("could not start {exe}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ToolError::failed(
            label,
            format!("{exe} exited with {}: {}", output.status, tail(stderr.trim())),
        ));
    }

    if !output.stderr.is_empty() {
        debug!("{label} stderr: {}", tail(String::from_utf8_lossy(&output.stderr).trim()));
    }

    Ok(())
}

/// First line of `<exe> <probe_arg>` output, used by `doctor`.
pub async fn probe_version(exe: &str, probe_arg: &str) -> Result<String, ToolError> {
    let output = Command::new(exe)
        .arg(probe_arg)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ToolError::failed("probe", format!("could not start {exe}: {e}")))?;
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };
    Ok(text.lines().next().unwrap_or_default().trim().to_string())
}

/// Replaces `{input}` / `{output}` placeholders in configured argument templates.
pub fn expand_args(templates: &[String], input: &Path, output: &Path) -> Vec<String> {
    let input = input.display().to_string();
    let output = output.display().to_string();
    templates
        .iter()
        .map(|t| t.replace("{input}", &input).replace("{output}", &output))
        .collect()
}

fn tail(s: &str) -> &str {
    if s.len() <= STDERR_TAIL_BYTES {
        return s;
    }
    let mut start = s.len() - STDERR_TAIL_BYTES;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
