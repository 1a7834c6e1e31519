use anyhow::{Context, Result};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub fn ensure_dir(p: &Path) -> Result<()> {
    std::fs::create_dir_all(p).with_context(|| format!("create_dir_all {}", p.display()))
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

/// Local calendar date as `DDMMYYYY`; falls back to UTC when the local offset is unknown.
pub fn date_stamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format!(
        "{:02}{:02}{:04}",
        now.day(),
        u8::from(now.month()),
        now.year()
    )
}

pub fn unix_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Drops the last extension from a file name: `photo.large.jpg` -> `photo.large`.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 && !name[i + 1..].contains('/') && i + 1 < name.len() => &name[..i],
        _ => name,
    }
}

/// Extension including the dot, if any.
pub fn file_extension(name: &str) -> Option<&str> {
    let stem = file_stem(name);
    if stem.len() < name.len() {
        Some(&name[stem.len()..])
    } else {
        None
    }
}

/// Seconds rendered without a trailing `.0` for whole numbers.
pub fn format_seconds(secs: f64) -> String {
    format!("{secs}")
}
