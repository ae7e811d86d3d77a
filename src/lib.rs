//! IPTV M3U/EXTM3U playlist parsing.
//!
//! ```rust,ignore
//! use iptv_playlist::{ParserConfig, PlaylistParser};
//!
//! let parser = PlaylistParser::new(ParserConfig::from_env());
//! let report = parser.parse_with_report(&text);
//! for series in report.playlist.unique_series() {
//!     println!("{} ({} episodes)", series.name, series.episode_count());
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::ParserConfig;
pub use error::{PlaylistError, Result};
pub use models::{
    ContentType, ParseReport, ParseStatistics, ParseWarning, Playlist, PlaylistRecord, SeriesGroup,
    Token, WarningKind, WarningSeverity,
};
pub use services::classifier::{ContentClassifier, HeuristicClassifier};
pub use services::decode::TextEncoding;
pub use services::dedup::{DedupKey, DeduplicationStatistics, Deduplicator, KeepPolicy};
pub use services::normalizer::{
    ChannelNormalizer, DefaultChannelNormalizer, DefaultTitleNormalizer, TitleNormalizer,
};
pub use services::parser::PlaylistParser;
pub use services::quality::{DefaultQualityAnalyzer, QualityAnalyzer, QualityInfo, QualityTier};
pub use services::stream::RecordStream;
