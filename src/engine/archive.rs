use super::types::ByteStream;
use crate::config::Archive;
use crate::error::ToolError;
use async_zip::base::write::ZipFileWriter;
use async_zip::{Compression, DeflateOption, ZipEntryBuilder};
use bytes::Bytes;
use tokio::io::{AsyncReadExt, DuplexStream};
use tracing::{debug, warn};

/// One archive member. Produced lazily so large entries are built only when the writer reaches them.
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// Streams a zip archive built from `entries`.
///
/// The writer runs on its own task and pushes into a bounded in-memory pipe; it stalls when the
/// consumer is slow and stops when the consumer goes away. An entry or writer failure is delivered
/// as the final `Err` item of the stream.
pub fn zip_stream<I>(entries: I, cfg: &Archive) -> ByteStream
where
    I: Iterator<Item = Result<ArchiveEntry, ToolError>> + Send + 'static,
{
    let (writer_end, reader_end) = tokio::io::duplex(cfg.pipe_capacity_bytes.max(1024));
    let (err_tx, err_rx) = tokio::sync::oneshot::channel::<ToolError>();
    let level = cfg.compression_level.clamp(0, 9);

    tokio::spawn(async move {
        if let Err(err) = write_archive(writer_end, entries, level).await {
            warn!("archive writer stopped: {err}");
            let _ = err_tx.send(err);
        }
    });

    read_pipe(reader_end, err_rx, cfg.chunk_bytes.max(1024))
}

async fn write_archive<I>(pipe: DuplexStream, entries: I, level: i32) -> Result<(), ToolError>
where
    I: Iterator<Item = Result<ArchiveEntry, ToolError>> + Send + 'static,
{
    let mut writer = ZipFileWriter::with_tokio(pipe);
    let mut count = 0usize;
    let mut entries = entries;

    loop {
        // Entries may be expensive to build; produce each one off the async workers.
        let (rest, next) = tokio::task::spawn_blocking(move || {
            let mut entries = entries;
            let next = entries.next();
            (entries, next)
        })
        .await?;
        entries = rest;
        let Some(entry) = next else {
            break;
        };
        let entry = entry?;
        let builder = ZipEntryBuilder::new(entry.name.clone().into(), Compression::Deflate)
            .deflate_option(DeflateOption::Other(level));
        writer
            .write_entry_whole(builder, &entry.data)
            .await
            .map_err(|e| ToolError::failed("Failed to write archive entry", format!("{}: {e}", entry.name)))?;
        count += 1;
    }

    writer
        .close()
        .await
        .map_err(|e| ToolError::failed("Failed to finalize archive", e))?;
    debug!("archive finalized entries={count}");
    Ok(())
}

fn read_pipe(
    reader: DuplexStream,
    err_rx: tokio::sync::oneshot::Receiver<ToolError>,
    chunk_bytes: usize,
) -> ByteStream {
    let stream = async_stream::try_stream! {
        let mut reader = reader;
        let mut buf = vec![0u8; chunk_bytes];
        loop {
            let n = reader
                .read(&mut buf)
                .await
                .map_err(|e| ToolError::failed("Failed to read archive stream", e))?;
            if n == 0 {
                break;
            }
            yield Bytes::copy_from_slice(&buf[..n]);
        }
        // Writer side closed: either finished cleanly or reported why it stopped.
        if let Ok(err) = err_rx.await {
            Err::<(), ToolError>(err)?;
        }
    };
    Box::pin(stream)
}
