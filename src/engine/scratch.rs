use crate::error::ToolError;
use crate::util::unix_millis;
use std::path::Path;
use tempfile::TempPath;

/// Creates an empty, uniquely named scratch file (`<prefix>-<millis>-<random><suffix>`).
/// The file is deleted when the returned guard drops, on every exit path.
pub fn scratch_file(dir: &Path, prefix: &str, suffix: &str) -> Result<TempPath, ToolError> {
    let file = tempfile::Builder::new()
        .prefix(&format!("{prefix}-{}-", unix_millis()))
        .suffix(suffix)
        .rand_bytes(8)
        .tempfile_in(dir)
        .map_err(|e| ToolError::failed("Failed to create scratch file", e))?;
    Ok(file.into_temp_path())
}

/// Writes `data` into a fresh scratch file.
pub async fn scratch_file_with(
    dir: &Path,
    prefix: &str,
    suffix: &str,
    data: &[u8],
) -> Result<TempPath, ToolError> {
    let path = scratch_file(dir, prefix, suffix)?;
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| ToolError::failed("Failed to write scratch file", e))?;
    Ok(path)
}
