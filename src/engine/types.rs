use crate::error::ToolError;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::pin::Pin;

/// Single-pass output byte stream. A failure after delivery starts surfaces as an `Err` item.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ToolError>> + Send>>;

/// Engine-produced key/value data describing the output.
pub type Metadata = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Stream,
    Batch,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type == "application/pdf" || self.name.to_ascii_lowercase().ends_with(".pdf")
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.content_type.starts_with("video/")
    }
}

#[derive(Debug, Clone)]
pub enum FormValue {
    File(UploadedFile),
    Text(String),
}

/// Named fields of a batch-mode request, in submission order. Keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_file(&mut self, key: impl Into<String>, file: UploadedFile) -> &mut Self {
        self.fields.push((key.into(), FormValue::File(file)));
        self
    }

    pub fn append_text(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push((key.into(), FormValue::Text(value.into())));
        self
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FormValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn file(&self, key: &str) -> Option<&UploadedFile> {
        match self.get(key) {
            Some(FormValue::File(f)) => Some(f),
            _ => None,
        }
    }

    /// Every file field regardless of key, in order.
    pub fn files(&self) -> impl Iterator<Item = &UploadedFile> {
        self.fields.iter().filter_map(|(_, v)| match v {
            FormValue::File(f) => Some(f),
            FormValue::Text(_) => None,
        })
    }

    pub fn total_file_bytes(&self) -> u64 {
        self.files().map(UploadedFile::size).sum()
    }
}

pub struct StreamInput {
    pub body: ByteStream,
    pub content_length: Option<u64>,
}

/// Raw input of one execution request.
pub enum ToolInput {
    Stream(StreamInput),
    Form(FormData),
}

impl ToolInput {
    pub fn size_mb(&self) -> f64 {
        const MB: f64 = 1024.0 * 1024.0;
        match self {
            ToolInput::Form(form) => form.total_file_bytes() as f64 / MB,
            ToolInput::Stream(s) => s.content_length.map(|n| n as f64 / MB).unwrap_or(1.0),
        }
    }

    /// Batch engines take form input only.
    pub fn into_form(self, engine_name: &str) -> Result<FormData, ToolError> {
        match self {
            ToolInput::Form(form) => Ok(form),
            ToolInput::Stream(_) => Err(ToolError::processing(format!(
                "{engine_name} expects form input"
            ))),
        }
    }
}

impl From<FormData> for ToolInput {
    fn from(form: FormData) -> Self {
        ToolInput::Form(form)
    }
}

pub struct ExecutionResult {
    pub output: ByteStream,
    pub metadata: Metadata,
}

impl ExecutionResult {
    /// Result backed by a fully buffered payload.
    pub fn buffered(bytes: impl Into<Bytes>, metadata: Metadata) -> Self {
        Self {
            output: once_stream(bytes.into()),
            metadata,
        }
    }
}

pub fn once_stream(bytes: Bytes) -> ByteStream {
    Box::pin(stream::once(async move { Ok(bytes) }))
}

/// Drains a stream into memory. Used by adapters that need the whole body.
pub async fn collect_bytes(mut stream: ByteStream) -> Result<Vec<u8>, ToolError> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}
