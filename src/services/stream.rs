//! Incremental parsing over any `AsyncRead`.
//!
//! A spawned task owns the [`EntryAssembler`] and pushes each record into a
//! bounded broadcast channel. When the consumer falls behind, the oldest
//! buffered records are overwritten (keep newest N): the loss is logged and
//! counted in [`RecordStream::dropped`].
//!
//! Text encoding is settled once per document, from the whole buffer when it
//! is known up front or from the first chunk read otherwise. A later line the
//! chosen encoding cannot represent moves the document down the cascade.

use futures::Stream;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::config::ParserConfig;
use crate::error::{PlaylistError, Result};
use crate::models::{ParseStatistics, PlaylistRecord};
use crate::services::assembler::EntryAssembler;
use crate::services::classifier::ContentClassifier;
use crate::services::decode::{decode_as, sniff_encoding, strip_bom, TextEncoding};

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Stream of records produced by a background parse.
///
/// Dropping the stream cancels the producer and releases its reader.
pub struct RecordStream {
    inner: Pin<Box<dyn Stream<Item = Result<PlaylistRecord>> + Send>>,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
}

impl RecordStream {
    /// Spawn the producer task over `reader`. Must be called inside a tokio runtime.
    pub fn spawn<R>(reader: R, classifier: Arc<dyn ContentClassifier>, config: &ParserConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::start(reader, classifier, config, None)
    }

    /// Like [`RecordStream::spawn`] for input whose encoding is already known
    pub fn spawn_with_encoding<R>(
        reader: R,
        classifier: Arc<dyn ContentClassifier>,
        config: &ParserConfig,
        encoding: TextEncoding,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::start(reader, classifier, config, Some(encoding))
    }

    /// A stream that yields `error` and ends
    pub fn failed(error: PlaylistError) -> Self {
        Self {
            inner: Box::pin(futures::stream::once(async move { Err(error) })),
            cancel: CancellationToken::new(),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    fn start<R>(
        reader: R,
        classifier: Arc<dyn ContentClassifier>,
        config: &ParserConfig,
        encoding: Option<TextEncoding>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = broadcast::channel(config.stream_capacity());
        let cancel = CancellationToken::new();
        let dropped = Arc::new(AtomicU64::new(0));

        let producer = Producer {
            assembler: EntryAssembler::new(classifier, false),
            splitter: LineSplitter::new(config.max_line_bytes),
            tx,
            cancel: cancel.clone(),
            read_timeout: config.read_timeout(),
            line_number: 0,
            encoding,
        };
        let handle = tokio::spawn(producer.run(reader));

        let lag_counter = dropped.clone();
        let inner = async_stream::stream! {
            let mut records = BroadcastStream::new(rx);
            while let Some(received) = records.next().await {
                match received {
                    Ok(record) => yield Ok(record),
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        tracing::warn!("stream_lag" = skipped, "Consumer fell behind, oldest records dropped");
                        lag_counter.fetch_add(skipped, Ordering::Relaxed);
                    }
                }
            }

            match handle.await {
                Ok(Ok(statistics)) => {
                    tracing::debug!("Stream finished after {} lines", statistics.total_lines);
                }
                Ok(Err(e)) => yield Err(e),
                Err(e) => {
                    yield Err(PlaylistError::StreamInterrupted(io::Error::new(io::ErrorKind::Other, e)));
                }
            }
        };

        Self {
            inner: Box::pin(inner),
            cancel,
            dropped,
        }
    }

    /// Stop the producer; the stream ends after already-buffered records
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Records overwritten because the consumer fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Stream for RecordStream {
    type Item = Result<PlaylistRecord>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Producer {
    assembler: EntryAssembler,
    splitter: LineSplitter,
    tx: broadcast::Sender<PlaylistRecord>,
    cancel: CancellationToken,
    read_timeout: Duration,
    line_number: usize,
    encoding: Option<TextEncoding>,
}

impl Producer {
    async fn run<R>(mut self, mut reader: R) -> Result<ParseStatistics>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunk = vec![0u8; READ_CHUNK_BYTES];

        loop {
            let read = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Stream cancelled at line {}", self.line_number);
                    return Ok(self.assembler.statistics().clone());
                }
                read = tokio::time::timeout(self.read_timeout, reader.read(&mut chunk)) => read,
            };

            let bytes_read = match read {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(PlaylistError::StreamInterrupted(e)),
                Err(_) => {
                    return Err(PlaylistError::StreamInterrupted(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "Timed out while reading playlist",
                    )))
                }
            };

            if bytes_read == 0 {
                break;
            }
            if self.encoding.is_none() {
                let encoding = sniff_encoding(&chunk[..bytes_read])?;
                tracing::debug!("Streaming playlist as {}", encoding);
                self.encoding = Some(encoding);
            }

            for line in self.splitter.push(&chunk[..bytes_read])? {
                if !self.process_line(&line)? {
                    return Ok(self.assembler.statistics().clone());
                }
            }
        }

        if let Some(line) = self.splitter.finish() {
            self.process_line(&line)?;
        }
        self.assembler.finish();

        if self.assembler.saw_content() && !self.assembler.saw_header() {
            return Err(PlaylistError::InvalidFormat(
                "missing #EXTM3U header".to_string(),
            ));
        }

        let statistics = self.assembler.statistics().clone();
        tracing::info!(
            "Streamed {} entries from {} lines",
            statistics.successful_entries,
            statistics.total_lines
        );
        Ok(statistics)
    }

    /// Returns `false` once nobody is listening anymore
    fn process_line(&mut self, bytes: &[u8]) -> Result<bool> {
        self.line_number += 1;
        let bytes = if self.line_number == 1 { strip_bom(bytes) } else { bytes };
        let line = self.decode_line(bytes)?;

        match self.assembler.feed_line(self.line_number, &line) {
            Some(record) => Ok(self.tx.send(record).is_ok() && !self.cancel.is_cancelled()),
            None => Ok(true),
        }
    }

    fn decode_line(&mut self, bytes: &[u8]) -> Result<String> {
        let mut encoding = self.encoding.unwrap_or(TextEncoding::Utf8);
        loop {
            match decode_as(bytes, encoding) {
                Ok(line) => {
                    self.encoding = Some(encoding);
                    return Ok(line);
                }
                Err(e) => match encoding.fallback() {
                    Some(next) if !bytes.contains(&0) => {
                        tracing::warn!(
                            "Line {} is not valid {}, continuing as {}",
                            self.line_number,
                            encoding,
                            next
                        );
                        encoding = next;
                    }
                    _ => return Err(e),
                },
            }
        }
    }
}

/// Universal-newline splitter that survives chunk boundaries (a CR at the end
/// of one chunk followed by LF at the start of the next is one terminator).
struct LineSplitter {
    buf: Vec<u8>,
    skip_lf: bool,
    max_line_bytes: usize,
}

impl LineSplitter {
    fn new(max_line_bytes: usize) -> Self {
        Self {
            buf: Vec::new(),
            skip_lf: false,
            max_line_bytes,
        }
    }

    fn push(&mut self, data: &[u8]) -> Result<Vec<Vec<u8>>> {
        let mut lines = Vec::new();

        for &byte in data {
            if self.skip_lf {
                self.skip_lf = false;
                if byte == b'\n' {
                    continue;
                }
            }

            match byte {
                b'\r' => {
                    lines.push(std::mem::take(&mut self.buf));
                    self.skip_lf = true;
                }
                b'\n' => lines.push(std::mem::take(&mut self.buf)),
                _ => {
                    if self.buf.len() >= self.max_line_bytes {
                        return Err(PlaylistError::StreamInterrupted(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("Playlist line exceeds max length of {} bytes", self.max_line_bytes),
                        )));
                    }
                    self.buf.push(byte);
                }
            }
        }

        Ok(lines)
    }

    /// Trailing line without a terminator
    fn finish(&mut self) -> Option<Vec<u8>> {
        (!self.buf.is_empty()).then(|| std::mem::take(&mut self.buf))
    }
}
