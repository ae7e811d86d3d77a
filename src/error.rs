use std::path::PathBuf;
use thiserror::Error;

/// Document-level failures.
///
/// Entry-level defects (orphaned metadata, duplicate URLs, malformed EXTINF
/// lines) never show up here; they are reported as
/// [`ParseWarning`](crate::models::ParseWarning)s and parsing continues.
#[derive(Error, Debug)]
pub enum PlaylistError {
    /// Content was present but the document never declared `#EXTM3U`
    #[error("Invalid playlist format: {0}")]
    InvalidFormat(String),

    /// A URL was expected but could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Playlist file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// None of the supported text encodings could decode the bytes
    #[error("Unable to decode playlist bytes with any supported encoding")]
    Encoding,

    /// I/O failure (or read timeout) while reading a playlist mid-stream
    #[error("Playlist stream interrupted: {0}")]
    StreamInterrupted(#[source] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Playlist too large: {size_mb:.1}MB (limit {limit_mb}MB)")]
    TooLarge { size_mb: f64, limit_mb: usize },
}

pub type Result<T, E = PlaylistError> = std::result::Result<T, E>;
