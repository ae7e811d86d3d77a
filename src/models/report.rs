use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::playlist::Playlist;
use crate::services::decode::TextEncoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    OrphanedMetadata,
    InvalidUrl,
    MissingAttribute,
    DuplicateEntry,
    MalformedMetadata,
    UnknownDirective,
    EncodingIssue,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WarningKind::OrphanedMetadata => "orphaned-metadata",
            WarningKind::InvalidUrl => "invalid-url",
            WarningKind::MissingAttribute => "missing-attribute",
            WarningKind::DuplicateEntry => "duplicate-entry",
            WarningKind::MalformedMetadata => "malformed-metadata",
            WarningKind::UnknownDirective => "unknown-directive",
            WarningKind::EncodingIssue => "encoding-issue",
        };
        f.write_str(label)
    }
}

/// Entry-level problem found while parsing. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    /// 1-based source line, 0 for document-wide warnings
    pub line: usize,
    pub severity: WarningSeverity,
    pub kind: WarningKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStatistics {
    pub total_lines: usize,
    pub successful_entries: usize,
    pub failed_entries: usize,
    pub warning_count: usize,
    pub elapsed: Duration,
    pub orphaned_metadata_count: usize,
    pub duplicate_url_count: usize,
}

/// Playlist plus everything the statistics-aware entry points collect
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseReport {
    pub playlist: Playlist,
    pub statistics: ParseStatistics,
    pub warnings: Vec<ParseWarning>,
    pub encoding: TextEncoding,
    pub parsed_at: DateTime<Utc>,
}

impl ParseReport {
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ParseWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }

    pub fn has_errors(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.severity == WarningSeverity::Error)
    }
}
