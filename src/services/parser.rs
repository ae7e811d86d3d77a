use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;

use crate::config::ParserConfig;
use crate::error::{PlaylistError, Result};
use crate::models::{ParseReport, ParseWarning, Playlist, WarningKind, WarningSeverity};
use crate::services::assembler::EntryAssembler;
use crate::services::classifier::{ContentClassifier, HeuristicClassifier};
use crate::services::decode::{decode_bytes, detect_encoding, TextEncoding};
use crate::services::fetch::PlaylistFetcher;
use crate::services::lexer::split_lines;
use crate::services::stream::RecordStream;

/// Playlist parser entry points: whole-document, file, URL and streaming.
///
/// Cheap to clone; every parse builds its own [`EntryAssembler`].
#[derive(Clone)]
pub struct PlaylistParser {
    config: ParserConfig,
    classifier: Arc<dyn ContentClassifier>,
}

impl PlaylistParser {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            classifier: Arc::new(HeuristicClassifier::new()),
        }
    }

    /// Replace the content classifier
    pub fn with_classifier(mut self, classifier: Arc<dyn ContentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn set_classifier(&mut self, classifier: Arc<dyn ContentClassifier>) {
        self.classifier = classifier;
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    // ============ WHOLE DOCUMENT ============

    /// Parse playlist text. Entry-level defects are skipped silently.
    pub fn parse(&self, content: &str) -> Playlist {
        let (playlist, _) = self.assemble(content, false);
        playlist
    }

    /// Parse playlist text, collecting statistics and warnings
    pub fn parse_with_report(&self, content: &str) -> ParseReport {
        self.report(content, TextEncoding::Utf8, Instant::now())
    }

    /// Decode then parse
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Playlist> {
        let (content, _) = decode_bytes(bytes)?;
        Ok(self.parse(&content))
    }

    pub fn parse_bytes_with_report(&self, bytes: &[u8]) -> Result<ParseReport> {
        let started = Instant::now();
        let (content, encoding) = decode_bytes(bytes)?;
        Ok(self.report(&content, encoding, started))
    }

    // ============ FILES & URLS ============

    pub async fn parse_file(&self, path: impl AsRef<Path>) -> Result<Playlist> {
        let bytes = read_file(path.as_ref()).await?;
        self.parse_bytes(&bytes)
    }

    pub async fn parse_file_with_report(&self, path: impl AsRef<Path>) -> Result<ParseReport> {
        let bytes = read_file(path.as_ref()).await?;
        self.parse_bytes_with_report(&bytes)
    }

    /// Download and parse a playlist URL
    pub async fn fetch(&self, url: &str) -> Result<Playlist> {
        tracing::info!("Parsing playlist: {}", url);
        let bytes = PlaylistFetcher::new(&self.config)?.fetch_bytes(url).await?;
        self.parse_bytes(&bytes)
    }

    pub async fn fetch_with_report(&self, url: &str) -> Result<ParseReport> {
        tracing::info!("Parsing playlist: {}", url);
        let bytes = PlaylistFetcher::new(&self.config)?.fetch_bytes(url).await?;
        self.parse_bytes_with_report(&bytes)
    }

    // ============ STREAMING ============

    /// Stream records from any reader. Must be called inside a tokio runtime.
    pub fn stream_reader<R>(&self, reader: R) -> RecordStream
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        RecordStream::spawn(reader, self.classifier.clone(), &self.config)
    }

    /// Streams an in-memory document, decoded exactly as [`Self::parse_bytes`] would
    pub fn stream_bytes(&self, bytes: Vec<u8>) -> RecordStream {
        match detect_encoding(&bytes) {
            Ok(encoding) => RecordStream::spawn_with_encoding(
                std::io::Cursor::new(bytes),
                self.classifier.clone(),
                &self.config,
                encoding,
            ),
            Err(e) => RecordStream::failed(e),
        }
    }

    pub async fn stream_file(&self, path: impl AsRef<Path>) -> Result<RecordStream> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| map_file_error(path, e))?;
        Ok(self.stream_reader(file))
    }

    pub async fn stream_url(&self, url: &str) -> Result<RecordStream> {
        tracing::info!("Streaming playlist: {}", url);
        let reader = PlaylistFetcher::new(&self.config)?.fetch_reader(url).await?;
        Ok(self.stream_reader(reader))
    }

    fn report(&self, content: &str, encoding: TextEncoding, started: Instant) -> ParseReport {
        let (playlist, mut assembler) = self.assemble_with(content, true, |assembler| {
            if encoding.is_fallback() {
                assembler.push_warning(ParseWarning {
                    line: 0,
                    severity: WarningSeverity::Warning,
                    kind: WarningKind::EncodingIssue,
                    message: format!("Content is not valid UTF-8, decoded as {}", encoding),
                    raw: None,
                });
            }
        });
        assembler.finish();

        let (mut statistics, warnings) = assembler.into_report_parts();
        statistics.elapsed = started.elapsed();

        tracing::info!(
            "Parsing complete: {} items ({} failed, {} warnings) in {:?}",
            statistics.successful_entries,
            statistics.failed_entries,
            statistics.warning_count,
            statistics.elapsed
        );

        ParseReport {
            playlist,
            statistics,
            warnings,
            encoding,
            parsed_at: Utc::now(),
        }
    }

    fn assemble(&self, content: &str, track_statistics: bool) -> (Playlist, EntryAssembler) {
        let (playlist, mut assembler) = self.assemble_with(content, track_statistics, |_| {});
        assembler.finish();
        (playlist, assembler)
    }

    fn assemble_with(
        &self,
        content: &str,
        track_statistics: bool,
        prepare: impl FnOnce(&mut EntryAssembler),
    ) -> (Playlist, EntryAssembler) {
        let mut assembler = EntryAssembler::new(self.classifier.clone(), track_statistics);
        prepare(&mut assembler);

        let playlist = split_lines(content)
            .enumerate()
            .filter_map(|(i, line)| assembler.feed_line(i + 1, line))
            .collect();

        (playlist, assembler)
    }
}

impl Default for PlaylistParser {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tracing::info!("Parsing playlist file: {}", path.display());
    tokio::fs::read(path)
        .await
        .map_err(|e| map_file_error(path, e))
}

fn map_file_error(path: &Path, err: std::io::Error) -> PlaylistError {
    match err.kind() {
        std::io::ErrorKind::NotFound => PlaylistError::FileNotFound(path.to_path_buf()),
        _ => PlaylistError::StreamInterrupted(err),
    }
}
