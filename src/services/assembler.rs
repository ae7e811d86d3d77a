//! Token-by-token state machine that turns EXTINF + URL pairs into records.
//!
//! The assembler is owned by exactly one parse (whole-document loop or the
//! streaming producer task) and is only mutated through `&mut self`.

use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::models::{
    ExtInf, ParseStatistics, ParseWarning, PlaylistRecord, ProviderFields, Token, WarningKind,
    WarningSeverity,
};
use crate::services::classifier::ContentClassifier;
use crate::services::lexer::tokenize_line;

/// `#EXT` directives players understand that this parser does not model
const KNOWN_DIRECTIVES: &[&str] = &[
    "#EXTVLCOPT", "#EXT-X-", "#EXTIMG", "#EXTALB", "#EXTART", "#EXTGENRE", "#EXTBYT",
    "#EXTBIN", "#EXTENC",
];

struct PendingMetadata {
    line: usize,
    extinf: ExtInf,
    raw: Option<String>,
}

pub struct EntryAssembler {
    classifier: Arc<dyn ContentClassifier>,
    track_statistics: bool,

    pending_metadata: Option<PendingMetadata>,
    pending_group_override: Option<String>,

    saw_header: bool,
    saw_content: bool,
    record_index: usize,

    seen_urls: HashSet<String>,
    warnings: Vec<ParseWarning>,
    statistics: ParseStatistics,
}

impl EntryAssembler {
    /// `track_statistics` enables duplicate detection and warning collection
    pub fn new(classifier: Arc<dyn ContentClassifier>, track_statistics: bool) -> Self {
        Self {
            classifier,
            track_statistics,
            pending_metadata: None,
            pending_group_override: None,
            saw_header: false,
            saw_content: false,
            record_index: 0,
            seen_urls: HashSet::new(),
            warnings: Vec::new(),
            statistics: ParseStatistics::default(),
        }
    }

    /// Tokenize and feed one raw line (1-based line number)
    pub fn feed_line(&mut self, line_number: usize, raw: &str) -> Option<PlaylistRecord> {
        let token = tokenize_line(raw);
        self.feed(line_number, token, raw)
    }

    /// Feed one token; returns the record completed by a URL line, if any
    pub fn feed(&mut self, line_number: usize, token: Token, raw: &str) -> Option<PlaylistRecord> {
        self.statistics.total_lines += 1;
        if !token.is_blank() {
            self.saw_content = true;
        }

        match token {
            Token::Header => {
                self.saw_header = true;
                None
            }
            Token::EntryMetadata(extinf) => {
                if let Some(previous) = self.pending_metadata.take() {
                    self.orphan(previous);
                }
                self.pending_metadata = Some(PendingMetadata {
                    line: line_number,
                    extinf,
                    raw: self.track_statistics.then(|| raw.trim().to_string()),
                });
                None
            }
            Token::GroupDirective(name) => {
                if !name.is_empty() {
                    self.pending_group_override = Some(name);
                }
                None
            }
            Token::StreamUrl { url, raw } => {
                let group_override = self.pending_group_override.take();
                let pending = self.pending_metadata.take()?;
                Some(self.build_record(line_number, pending.extinf, url, raw, group_override))
            }
            Token::Comment(comment) => {
                if self.track_statistics && is_unknown_directive(&comment) {
                    self.warn(
                        line_number,
                        WarningSeverity::Info,
                        WarningKind::UnknownDirective,
                        "Unknown directive ignored".to_string(),
                        Some(comment),
                    );
                }
                None
            }
            Token::Unrecognized(text) => {
                if !text.is_empty() {
                    self.report_unrecognized(line_number, text);
                }
                None
            }
            Token::SessionMetadata { .. } => None,
        }
    }

    /// Flush end-of-input state
    pub fn finish(&mut self) {
        if let Some(pending) = self.pending_metadata.take() {
            self.orphan(pending);
        }
        self.pending_group_override = None;
        self.statistics.warning_count = self.warnings.len();
    }

    pub fn saw_header(&self) -> bool {
        self.saw_header
    }

    /// Whether any non-blank line has been fed
    pub fn saw_content(&self) -> bool {
        self.saw_content
    }

    pub fn statistics(&self) -> &ParseStatistics {
        &self.statistics
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Consume the assembler, returning statistics and warnings
    pub fn into_report_parts(mut self) -> (ParseStatistics, Vec<ParseWarning>) {
        self.statistics.warning_count = self.warnings.len();
        (self.statistics, self.warnings)
    }

    /// Record a document-level warning (line 0 for document-wide issues)
    pub fn push_warning(&mut self, warning: ParseWarning) {
        if self.track_statistics {
            self.warnings.push(warning);
        }
    }

    fn build_record(
        &mut self,
        line_number: usize,
        extinf: ExtInf,
        url: Url,
        raw_url: String,
        group_override: Option<String>,
    ) -> PlaylistRecord {
        let ExtInf {
            duration,
            attributes,
            title,
        } = extinf;

        let group = group_override.or_else(|| attributes.get("group-title").cloned());

        let name = if title.is_empty() {
            attributes.get("tvg-name").cloned().unwrap_or_default()
        } else {
            title
        };
        if name.is_empty() {
            self.warn(
                line_number,
                WarningSeverity::Info,
                WarningKind::MissingAttribute,
                "Entry has no title and no tvg-name".to_string(),
                Some(raw_url.clone()),
            );
        }

        let content_type = self.classifier.classify(&name, group.as_deref(), &attributes);

        let logo = attributes
            .get("tvg-logo")
            .and_then(|logo| Url::parse(logo).ok());
        let provider = ProviderFields {
            xui_id: attributes.get("xui-id").cloned(),
            timeshift: lenient_int(attributes.get("timeshift")),
            catchup: attributes.get("catchup").cloned(),
            catchup_source: attributes.get("catchup-source").cloned(),
            catchup_days: lenient_int(attributes.get("catchup-days")),
            catchup_correction: lenient_int(attributes.get("catchup-correction")),
            recording: recording_flag(attributes.get("tvg-rec")),
        };

        if self.track_statistics && self.seen_urls.contains(&raw_url) {
            self.statistics.duplicate_url_count += 1;
            self.warn(
                line_number,
                WarningSeverity::Info,
                WarningKind::DuplicateEntry,
                format!("Duplicate URL for '{}'", name),
                Some(raw_url),
            );
        } else if self.track_statistics {
            self.seen_urls.insert(raw_url);
        }

        let record = PlaylistRecord {
            id: PlaylistRecord::generate_id(&url, self.record_index),
            name,
            epg_id: attributes.get("tvg-id").cloned(),
            url,
            group,
            logo,
            content_type,
            duration: (duration >= 0).then_some(duration),
            attributes,
            provider,
        };

        self.record_index += 1;
        self.statistics.successful_entries += 1;
        record
    }

    fn orphan(&mut self, pending: PendingMetadata) {
        self.statistics.orphaned_metadata_count += 1;
        self.statistics.failed_entries += 1;
        self.warn(
            pending.line,
            WarningSeverity::Warning,
            WarningKind::OrphanedMetadata,
            format!("EXTINF '{}' has no stream URL", pending.extinf.title),
            pending.raw,
        );
    }

    fn report_unrecognized(&mut self, line_number: usize, text: String) {
        if is_extinf(&text) {
            self.statistics.failed_entries += 1;
            self.warn(
                line_number,
                WarningSeverity::Warning,
                WarningKind::MalformedMetadata,
                "Malformed EXTINF line".to_string(),
                Some(text),
            );
        } else if self.pending_metadata.is_some() {
            self.statistics.failed_entries += 1;
            self.warn(
                line_number,
                WarningSeverity::Warning,
                WarningKind::InvalidUrl,
                "Expected a stream URL".to_string(),
                Some(text),
            );
        }
    }

    fn warn(
        &mut self,
        line: usize,
        severity: WarningSeverity,
        kind: WarningKind,
        message: String,
        raw: Option<String>,
    ) {
        if !self.track_statistics {
            return;
        }
        tracing::debug!("Line {}: {} ({})", line, message, kind);
        self.warnings.push(ParseWarning {
            line,
            severity,
            kind,
            message,
            raw,
        });
    }
}

fn is_extinf(text: &str) -> bool {
    text.get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("#EXTINF:"))
}

fn is_unknown_directive(comment: &str) -> bool {
    let upper = comment.to_ascii_uppercase();
    upper.starts_with("#EXT") && !KNOWN_DIRECTIVES.iter().any(|d| upper.starts_with(d))
}

/// Integer attribute; non-numeric values become `None`
fn lenient_int(value: Option<&String>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// `Some(true)` for "1" or "true"; anything else (including "0") is `None`
fn recording_flag(value: Option<&String>) -> Option<bool> {
    value
        .filter(|v| v.as_str() == "1" || v.eq_ignore_ascii_case("true"))
        .map(|_| true)
}
