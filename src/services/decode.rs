//! Byte-to-text cascade: UTF-8, then Windows-1252, then ISO-8859-1.

use serde::{Deserialize, Serialize};

use crate::error::{PlaylistError, Result};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Windows-1252 code points for 0x80..=0x9F; `None` marks the undefined bytes.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
    Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
    None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
    Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Windows1252,
    Latin1,
}

impl TextEncoding {
    /// Whether a legacy fallback was needed
    pub fn is_fallback(&self) -> bool {
        !matches!(self, TextEncoding::Utf8)
    }

    /// Next step down the cascade
    pub fn fallback(&self) -> Option<TextEncoding> {
        match self {
            TextEncoding::Utf8 => Some(TextEncoding::Windows1252),
            TextEncoding::Windows1252 => Some(TextEncoding::Latin1),
            TextEncoding::Latin1 => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Windows1252 => "Windows-1252",
            TextEncoding::Latin1 => "ISO-8859-1",
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Decode playlist bytes, returning the text and the encoding that succeeded.
///
/// NUL bytes never occur in playlist text in any supported encoding, so their
/// presence fails with [`PlaylistError::Encoding`].
pub fn decode_bytes(bytes: &[u8]) -> Result<(String, TextEncoding)> {
    let encoding = detect_encoding(bytes)?;
    let text = decode_as(strip_bom(bytes), encoding)?;
    Ok((text, encoding))
}

/// The encoding [`decode_bytes`] would pick for the whole of `bytes`
pub fn detect_encoding(bytes: &[u8]) -> Result<TextEncoding> {
    if bytes.contains(&0) {
        return Err(PlaylistError::Encoding);
    }
    Ok(pick_encoding(strip_bom(bytes), false))
}

/// [`detect_encoding`] for the first chunk of a longer input: a UTF-8
/// sequence cut off by the chunk boundary still counts as UTF-8.
pub fn sniff_encoding(chunk: &[u8]) -> Result<TextEncoding> {
    if chunk.contains(&0) {
        return Err(PlaylistError::Encoding);
    }
    Ok(pick_encoding(strip_bom(chunk), true))
}

/// Decode with a fixed encoding. Fails on bytes the encoding cannot represent.
pub fn decode_as(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    if bytes.contains(&0) {
        return Err(PlaylistError::Encoding);
    }
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| PlaylistError::Encoding),
        TextEncoding::Windows1252 => decode_windows_1252(bytes).ok_or(PlaylistError::Encoding),
        TextEncoding::Latin1 => Ok(decode_latin1(bytes)),
    }
}

pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

fn pick_encoding(bytes: &[u8], allow_truncated: bool) -> TextEncoding {
    match std::str::from_utf8(bytes) {
        Ok(_) => return TextEncoding::Utf8,
        Err(e) if allow_truncated && e.error_len().is_none() => return TextEncoding::Utf8,
        Err(_) => {}
    }

    let cp1252_defined = bytes.iter().all(|&b| match b {
        0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize].is_some(),
        _ => true,
    });
    if cp1252_defined {
        TextEncoding::Windows1252
    } else {
        TextEncoding::Latin1
    }
}

fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => Some(b as char),
        })
        .collect()
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("#EXTM3U\n#EXTINF:-1,Çocuk Kanalı".as_bytes());

        let (text, encoding) = decode_bytes(&bytes).unwrap();
        assert_eq!(encoding, TextEncoding::Utf8);
        assert!(text.starts_with("#EXTM3U"));
        assert!(text.ends_with("Çocuk Kanalı"));
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "Café – Noël" in Windows-1252
        let bytes = b"Caf\xE9 \x96 No\xEBl";
        let (text, encoding) = decode_bytes(bytes).unwrap();
        assert_eq!(encoding, TextEncoding::Windows1252);
        assert_eq!(text, "Café – Noël");
        assert!(encoding.is_fallback());
    }

    #[test]
    fn test_latin1_for_undefined_cp1252_bytes() {
        let bytes = b"A\x81B\xE9";
        let (text, encoding) = decode_bytes(bytes).unwrap();
        assert_eq!(encoding, TextEncoding::Latin1);
        assert_eq!(text, "A\u{81}Bé");
    }

    #[test]
    fn test_nul_bytes_rejected() {
        assert!(matches!(
            decode_bytes(b"#EXTM3U\0\0"),
            Err(PlaylistError::Encoding)
        ));
    }

    #[test]
    fn test_sniff_tolerates_split_utf8_sequence() {
        // "é" cut after its first byte
        let chunk = b"#EXTINF:-1,Caf\xC3";
        assert_eq!(sniff_encoding(chunk).unwrap(), TextEncoding::Utf8);
        assert_eq!(detect_encoding(chunk).unwrap(), TextEncoding::Windows1252);
        assert_eq!(sniff_encoding(b"Caf\xE9 ok").unwrap(), TextEncoding::Windows1252);
    }

    #[test]
    fn test_decode_as_fixed_encoding() {
        assert_eq!(decode_as(b"\xC3\xA9t\xC3\xA9", TextEncoding::Utf8).unwrap(), "été");
        assert_eq!(
            decode_as(b"\xC3\xA9t\xC3\xA9", TextEncoding::Windows1252).unwrap(),
            "Ã©tÃ©"
        );
        assert!(decode_as(b"Caf\xE9", TextEncoding::Utf8).is_err());
        assert!(decode_as(b"\x81", TextEncoding::Windows1252).is_err());
        assert_eq!(TextEncoding::Utf8.fallback(), Some(TextEncoding::Windows1252));
        assert_eq!(TextEncoding::Latin1.fallback(), None);
    }

    #[test]
    fn test_serialization() {
        assert_eq!(
            serde_json::to_string(&TextEncoding::Windows1252).unwrap(),
            "\"windows1252\""
        );
    }
}
