//! Line tokenizer for EXTM3U playlists.
//!
//! Hand-rolled scanning, no regular expressions. Each logical line maps to
//! exactly one [`Token`]; blank lines map to `Unrecognized("")`.

use url::Url;

use crate::models::{ExtInf, Token};
use crate::services::attributes::{parse_attribute_list, parse_attributes};

const HEADER: &str = "#EXTM3U";
const EXTINF_PREFIX: &str = "#EXTINF:";
const EXTGRP_PREFIX: &str = "#EXTGRP:";
const SESSION_DATA_PREFIX: &str = "#EXT-X-SESSION-DATA:";

/// Tokenize one line
pub fn tokenize_line(line: &str) -> Token {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Token::Unrecognized(String::new());
    }

    if is_header(trimmed) {
        return Token::Header;
    }

    if let Some(content) = strip_prefix_ignore_case(trimmed, EXTINF_PREFIX) {
        return match parse_extinf(content) {
            Some(extinf) => Token::EntryMetadata(extinf),
            None => Token::Unrecognized(trimmed.to_string()),
        };
    }

    if let Some(name) = strip_prefix_ignore_case(trimmed, EXTGRP_PREFIX) {
        return Token::GroupDirective(name.trim().to_string());
    }

    if let Some(content) = strip_prefix_ignore_case(trimmed, SESSION_DATA_PREFIX) {
        let mut pairs = parse_attribute_list(content);
        return Token::SessionMetadata {
            data_id: pairs.remove("data-id").unwrap_or_default(),
            value: pairs.remove("value"),
        };
    }

    if trimmed.starts_with('#') {
        return Token::Comment(trimmed.to_string());
    }

    match Url::parse(trimmed) {
        Ok(url) if !url.scheme().is_empty() => Token::StreamUrl {
            url,
            raw: trimmed.to_string(),
        },
        _ => Token::Unrecognized(trimmed.to_string()),
    }
}

/// Tokenize a whole document. CR, LF and CRLF all end a line.
pub fn tokenize(content: &str) -> Vec<Token> {
    split_lines(content).map(tokenize_line).collect()
}

/// Universal-newline line iterator
pub fn split_lines(content: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(content);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(|c: char| c == '\r' || c == '\n') {
            Some(i) => {
                let skip = if current[i..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[i + skip..]);
                Some(&current[..i])
            }
            None => {
                rest = None;
                // No phantom empty line after a trailing newline
                (!current.is_empty()).then_some(current)
            }
        }
    })
}

/// `#EXTM3U`, optionally followed by header attributes (`url-tvg="..."`)
fn is_header(line: &str) -> bool {
    match strip_prefix_ignore_case(line, HEADER) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

/// Parse the content after `#EXTINF:`
///
/// Format: `duration [key="value" ...],Title`
fn parse_extinf(content: &str) -> Option<ExtInf> {
    let Some(comma) = last_unquoted_comma(content) else {
        // No title: the whole content must be a bare duration
        let duration = content.trim().parse::<i64>().ok()?;
        return Some(ExtInf {
            duration,
            ..Default::default()
        });
    };

    let metadata = &content[..comma];
    let title = content[comma + 1..].trim().to_string();

    let (duration, rest) = scan_duration(metadata);

    Some(ExtInf {
        duration,
        attributes: parse_attributes(rest),
        title,
    })
}

/// Byte offset of the last comma outside a double-quoted span
fn last_unquoted_comma(content: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut last = None;
    for (i, c) in content.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => last = Some(i),
            _ => {}
        }
    }
    last
}

/// Optional leading `-` and digits; -1 when no digits are present.
/// Returns the duration and the remainder after it (leading whitespace skipped).
fn scan_duration(metadata: &str) -> (i64, &str) {
    let section = metadata.trim_start();
    let bytes = section.as_bytes();

    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    if end == digits_start {
        return (-1, section);
    }

    let duration = section[..end].parse().unwrap_or(-1);
    (duration, section[end..].trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extinf(line: &str) -> ExtInf {
        match tokenize_line(line) {
            Token::EntryMetadata(extinf) => extinf,
            other => panic!("expected EntryMetadata, got {:?}", other),
        }
    }

    #[test]
    fn test_header_case_insensitive() {
        assert_eq!(tokenize_line("#EXTM3U"), Token::Header);
        assert_eq!(tokenize_line("  #extm3u  "), Token::Header);
        assert_eq!(tokenize_line(r#"#EXTM3U url-tvg="http://epg.example.com""#), Token::Header);
        assert!(matches!(tokenize_line("#EXTM3UX"), Token::Comment(_)));
    }

    #[test]
    fn test_blank_line_sentinel() {
        assert_eq!(tokenize_line(""), Token::Unrecognized(String::new()));
        assert!(tokenize_line("   \t ").is_blank());
    }

    #[test]
    fn test_parse_extinf() {
        let line = r#"#EXTINF:-1 tvg-id="globo" tvg-name="Globo HD" tvg-logo="http://logo.com/globo.png" group-title="TV",Globo HD"#;
        let extinf = extinf(line);

        assert_eq!(extinf.title, "Globo HD");
        assert_eq!(extinf.duration, -1);
        assert_eq!(extinf.attribute("tvg-id"), Some("globo"));
        assert_eq!(extinf.attribute("group-title"), Some("TV"));
        assert_eq!(extinf.attribute("tvg-logo"), Some("http://logo.com/globo.png"));
    }

    #[test]
    fn test_parse_extinf_minimal() {
        let extinf = extinf("#EXTINF:-1,Canal Teste");
        assert_eq!(extinf.title, "Canal Teste");
        assert_eq!(extinf.duration, -1);
        assert!(extinf.attributes.is_empty());
    }

    #[test]
    fn test_title_with_brackets() {
        let extinf = extinf("#EXTINF:-1,Channel (HD) [EN] 4K");
        assert_eq!(extinf.title, "Channel (HD) [EN] 4K");
    }

    #[test]
    fn test_splits_at_last_unquoted_comma() {
        let quoted = extinf(r#"#EXTINF:-1 tvg-name="Hello, World" group-title="A,B",Title"#);
        assert_eq!(quoted.title, "Title");
        assert_eq!(quoted.attribute("tvg-name"), Some("Hello, World"));
        assert_eq!(quoted.attribute("group-title"), Some("A,B"));

        // An unquoted comma inside the metadata section does not win over the last one
        let unquoted = extinf("#EXTINF:-1 foo=bar,Part One,Part Two");
        assert_eq!(unquoted.title, "Part Two");
    }

    #[test]
    fn test_prefix_case_insensitive_and_keys_lowercased() {
        let extinf = extinf(r#"#extinf:120 TVG-ID="abc" Group-Title="News",Evening"#);
        assert_eq!(extinf.duration, 120);
        assert_eq!(extinf.attribute("tvg-id"), Some("abc"));
        assert_eq!(extinf.attribute("group-title"), Some("News"));
    }

    #[test]
    fn test_missing_duration_defaults_to_live() {
        let extinf = extinf(r#"#EXTINF:tvg-id="x",Name"#);
        assert_eq!(extinf.duration, -1);
        assert_eq!(extinf.attribute("tvg-id"), Some("x"));
    }

    #[test]
    fn test_fractional_duration() {
        let extinf = extinf("#EXTINF:10.500,Clip");
        assert_eq!(extinf.duration, 10);
        assert!(extinf.attributes.is_empty());
    }

    #[test]
    fn test_extinf_without_comma() {
        let extinf = extinf("#EXTINF:42");
        assert_eq!(extinf.duration, 42);
        assert!(extinf.title.is_empty());

        assert_eq!(
            tokenize_line("#EXTINF:garbage"),
            Token::Unrecognized("#EXTINF:garbage".to_string())
        );
    }

    #[test]
    fn test_group_directive() {
        assert_eq!(
            tokenize_line("#EXTGRP:  Sports  "),
            Token::GroupDirective("Sports".to_string())
        );
        assert_eq!(
            tokenize_line("#extgrp:News"),
            Token::GroupDirective("News".to_string())
        );
    }

    #[test]
    fn test_session_data() {
        assert_eq!(
            tokenize_line(r#"#EXT-X-SESSION-DATA:DATA-ID="com.example.lang",VALUE="tr""#),
            Token::SessionMetadata {
                data_id: "com.example.lang".to_string(),
                value: Some("tr".to_string()),
            }
        );
        assert_eq!(
            tokenize_line(r#"#EXT-X-SESSION-DATA:VALUE="x""#),
            Token::SessionMetadata {
                data_id: String::new(),
                value: Some("x".to_string()),
            }
        );
    }

    #[test]
    fn test_comment_and_urls() {
        assert_eq!(
            tokenize_line("#EXTVLCOPT:http-user-agent=VLC"),
            Token::Comment("#EXTVLCOPT:http-user-agent=VLC".to_string())
        );

        match tokenize_line("  http://example.com/live/1.ts  ") {
            Token::StreamUrl { url, raw } => {
                assert_eq!(url.as_str(), "http://example.com/live/1.ts");
                assert_eq!(raw, "http://example.com/live/1.ts");
            }
            other => panic!("expected StreamUrl, got {:?}", other),
        }
        assert!(matches!(
            tokenize_line("rtmp://media.example.com/app/key"),
            Token::StreamUrl { .. }
        ));
        assert_eq!(
            tokenize_line("not a url"),
            Token::Unrecognized("not a url".to_string())
        );
    }

    #[test]
    fn test_stream_url_keeps_source_spelling() {
        match tokenize_line("HTTP://Example.COM") {
            Token::StreamUrl { url, raw } => {
                assert_eq!(url.as_str(), "http://example.com/");
                assert_eq!(raw, "HTTP://Example.COM");
            }
            other => panic!("expected StreamUrl, got {:?}", other),
        }
    }

    #[test]
    fn test_universal_newlines() {
        let lines: Vec<&str> = split_lines("a\nb\r\nc\rd\n").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);

        let lines: Vec<&str> = split_lines("a\n\nb").collect();
        assert_eq!(lines, vec!["a", "", "b"]);

        assert_eq!(tokenize("#EXTM3U\r#EXTINF:-1,A\rhttp://x/a").len(), 3);
    }
}
