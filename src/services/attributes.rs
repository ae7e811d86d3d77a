//! `key="value"` / `key=value` pair scanner for EXTINF and session-data lines.

use std::collections::HashMap;

/// Parse whitespace-separated attribute pairs (EXTINF metadata section).
pub fn parse_attributes(section: &str) -> HashMap<String, String> {
    parse_pairs(section, |c| c.is_whitespace())
}

/// Parse comma- or whitespace-separated pairs (`#EXT-X-SESSION-DATA`).
pub fn parse_attribute_list(section: &str) -> HashMap<String, String> {
    parse_pairs(section, |c| c == ',' || c.is_whitespace())
}

/// Keys are lowercased. Tokens without `=` and pairs with an empty key or
/// value are dropped. Quoted values are kept verbatim, separators included;
/// unquoted values are trimmed.
fn parse_pairs(input: &str, is_separator: impl Fn(char) -> bool) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut chars = input.char_indices().peekable();

    loop {
        // Skip separators
        while matches!(chars.peek(), Some(&(_, c)) if is_separator(c)) {
            chars.next();
        }
        let Some(&(key_start, _)) = chars.peek() else {
            break;
        };

        // Key runs until '=' or a separator
        let mut key_end = input.len();
        let mut has_value = false;
        while let Some(&(i, c)) = chars.peek() {
            if c == '=' {
                key_end = i;
                has_value = true;
                chars.next();
                break;
            }
            if is_separator(c) {
                key_end = i;
                break;
            }
            chars.next();
        }

        if !has_value {
            // Bare token like ".000" after a fractional duration
            continue;
        }

        let key = input[key_start..key_end].trim().to_lowercase();
        let value = match chars.peek() {
            Some(&(quote_start, '"')) => {
                chars.next();
                let value_start = quote_start + 1;
                let mut value_end = input.len();
                for (i, c) in chars.by_ref() {
                    if c == '"' {
                        value_end = i;
                        break;
                    }
                }
                &input[value_start..value_end]
            }
            Some(&(value_start, _)) => {
                let mut value_end = input.len();
                while let Some(&(i, c)) = chars.peek() {
                    if is_separator(c) {
                        value_end = i;
                        break;
                    }
                    chars.next();
                }
                input[value_start..value_end].trim()
            }
            None => "",
        };

        if !key.is_empty() && !value.is_empty() {
            attributes.insert(key, value.to_string());
        }
    }

    attributes
}
