use std::collections::HashMap;
use url::Url;

/// Parsed `#EXTINF` line data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtInf {
    /// -1 when the line carried no duration (live)
    pub duration: i64,
    /// Raw attribute pairs, keys lowercased
    pub attributes: HashMap<String, String>,
    pub title: String,
}

impl ExtInf {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }
}

/// One logical playlist line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Header,
    EntryMetadata(ExtInf),
    GroupDirective(String),
    SessionMetadata {
        data_id: String,
        value: Option<String>,
    },
    /// `raw` is the trimmed source line, `url` its parsed form
    StreamUrl { url: Url, raw: String },
    Comment(String),
    /// Blank lines produce `Unrecognized("")`
    Unrecognized(String),
}

impl Token {
    pub fn is_blank(&self) -> bool {
        matches!(self, Token::Unrecognized(raw) if raw.is_empty())
    }
}
