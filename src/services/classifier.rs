use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::models::ContentType;

/// Group prefix the provider convention uses to mark live categories
pub const LIVE_GROUP_PREFIX: char = '▱';

lazy_static! {
    /// S01E01 / s1.e2 / S01 E01 anywhere in a title, digit runs taken whole
    static ref STRONG_EPISODE: Regex = Regex::new(r"(?i)s(\d+)[\s._-]?e(\d+)").unwrap();
}

// ============ GROUP KEYWORDS (lowercase) ============

const SERIES_GROUP_KEYWORDS: &[&str] = &[
    "series", "serie", "serien", "séries", "série", "tv show", "dizi", "diziler", "dizileri",
    "مسلسل", "مسلسلات", "सीरीज़", "सीरीज", "シリーズ", "ドラマ", "telenovela", "novela",
    "сериал", "剧集", "电视剧",
];

/// Movie/quality/brand labels that block the weaker series heuristics
const NON_SERIES_GROUP_KEYWORDS: &[&str] = &[
    "movie", "film", "cinema", "sinema", "bluray", "blu-ray", "4k", "fhd", "uhd", "hd", "top",
    "imdb", "best", "classics", "collection", "koleksiyon", "marvel", "disney", "pixar",
    "bollywood", "vizyon", "yerli film", "yabancı film",
];

const MOVIE_GROUP_KEYWORDS: &[&str] = &[
    "movie", "film", "cinema", "sinema", "bluray", "blu-ray", "world", "4k", "fhd", "uhd", "hd",
    "2160p", "1080p", "vod", "top", "imdb", "best", "classics", "collection", "koleksiyon",
    "oscar", "marvel", "dc", "disney", "pixar", "bollywood", "vizyon", "yerli film",
    "yabancı film", "sinemalar", "aksiyon",
];

// ============ TITLE KEYWORDS (lowercase) ============

const SEASON_KEYWORDS: &[&str] = &[
    "season", "sezon", "الموسم", "موسم", "saison", "staffel", "सीज़न", "सीजन", "シーズン",
    "temporada", "сезон",
];

const EPISODE_KEYWORDS: &[&str] = &[
    "episode", "épisode", "bölüm", "الحلقة", "حلقة", "folge", "एपिसोड", "エピソード",
    "episódio", "episodio", "серия", "capítulo", "capitulo",
];

const RESOLUTION_TOKENS: &[&str] = &["hd", "fhd", "uhd", "4k", "sd"];
const CODEC_TOKENS: &[&str] = &["hevc", "h265", "h264"];
const LIVE_GLYPHS: &[&str] = &["ᴴᴰ", "ᶠᴴᴰ", "ᵁᴴᴰ", "ˢᴰ", "⁴ᴷ", "ᴿᴬᵂ", "⁵⁰ᶠᵖˢ", "⁶⁰ᶠᵖˢ"];

const LANGUAGE_TAGS: &[&str] = &[
    "tr", "en", "de", "fr", "es", "ar", "ru", "hi", "jp", "ja", "pt", "it", "nl", "pl", "ko", "zh",
];

const TRAILING_ROMAN: &[&str] = &["II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

/// Assigns a [`ContentType`] to a playlist entry
pub trait ContentClassifier: Send + Sync {
    fn classify(
        &self,
        name: &str,
        group: Option<&str>,
        attributes: &HashMap<String, String>,
    ) -> ContentType;
}

/// Default multi-language heuristic classifier.
///
/// Rules run in a fixed order and the first one that decides wins:
///
/// 1. live group prefix
/// 2. strong `S01E01` pattern
/// 3. series group keywords (noted)
/// 4. movie/quality group keywords suppress rules 5–7 unless rule 3 matched
/// 5. season/episode words in 11 languages
/// 6. CJK `第N季` / `第N集` counters
/// 7. `ep. N` / `ep N`
/// 8. series group without numbers
/// 9. movie group keywords
/// 10. sequel patterns (unless live indicators)
/// 11. `[4K]` tag
/// 12. year without live indicators
/// 13. language tag plus year
/// 14. live
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl ContentClassifier for HeuristicClassifier {
    fn classify(
        &self,
        name: &str,
        group: Option<&str>,
        _attributes: &HashMap<String, String>,
    ) -> ContentType {
        let group = group.unwrap_or_default();

        if group.trim_start().starts_with(LIVE_GROUP_PREFIX) {
            return ContentType::Live;
        }

        if let Some((season, episode)) = strong_episode_pattern(name) {
            return ContentType::Series { season, episode };
        }

        let lower_name = fold_case(name);
        let lower_group = fold_case(group);

        let series_group = contains_any(&lower_group, SERIES_GROUP_KEYWORDS);
        let series_suppressed =
            !series_group && contains_any(&lower_group, NON_SERIES_GROUP_KEYWORDS);

        if !series_suppressed {
            let (word_season, word_episode) = word_pattern_numbers(&lower_name);
            let (cjk_season, cjk_episode) = cjk_numbers(name);
            let season = word_season.or(cjk_season);
            let episode = word_episode.or(cjk_episode);
            if season.is_some() || episode.is_some() {
                return ContentType::Series { season, episode };
            }

            if let Some(episode) = episode_only_pattern(&lower_name) {
                return ContentType::Series {
                    season: None,
                    episode: Some(episode),
                };
            }
        }

        if series_group {
            return ContentType::Series {
                season: None,
                episode: None,
            };
        }

        if contains_any(&lower_group, MOVIE_GROUP_KEYWORDS) {
            return ContentType::Movie;
        }

        let live = has_live_indicators(name, &lower_name);

        if has_sequel_pattern(name) && !live && !series_group {
            return ContentType::Movie;
        }

        if name.contains("[4K]") || name.contains("[4k]") {
            return ContentType::Movie;
        }

        let year = has_year(&lower_name);
        if year && !live {
            return ContentType::Movie;
        }

        if year && has_language_tag(&lower_name) {
            return ContentType::Movie;
        }

        ContentType::Live
    }
}

/// 1950..=2030: four-digit numbers in this range are years, never season/episode numbers
pub fn is_year_like(n: u32) -> bool {
    (1950..=2030).contains(&n)
}

/// Lowercase with Turkish dotted capital I folded to a plain `i`
fn fold_case(s: &str) -> String {
    s.replace('İ', "i").to_lowercase()
}

fn is_plausible_number(n: u32) -> bool {
    n > 0 && !is_year_like(n)
}

/// Zero, year-like and overflowing numbers come back as `None`
fn strong_episode_pattern(name: &str) -> Option<(Option<u32>, Option<u32>)> {
    let caps = STRONG_EPISODE.captures(name)?;
    let number = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .filter(|&n| is_plausible_number(n))
    };
    Some((number(1), number(2)))
}

/// Short ASCII keywords ("hd", "dc", "top") must stand alone; longer ones match as substrings
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if !(keyword.is_ascii() && keyword.len() <= 3) {
        return haystack.contains(keyword);
    }
    haystack.match_indices(keyword).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    !haystack.is_empty() && keywords.iter().any(|k| contains_keyword(haystack, k))
}

fn is_number_separator(c: char) -> bool {
    matches!(c, ' ' | '.' | ':' | '#' | '-' | '_' | '\u{a0}')
}

/// Number right after `pos`, skipping separators
fn number_after(s: &str, pos: usize) -> Option<u32> {
    let rest = s[pos..].trim_start_matches(is_number_separator);
    let len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 || len > 4 {
        return None;
    }
    if rest[len..].chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    rest[..len].parse().ok()
}

/// Number right before `pos` ("5. Bölüm"), skipping separators
fn number_before(s: &str, pos: usize) -> Option<u32> {
    let head = s[..pos].trim_end_matches(is_number_separator);
    let len = head.bytes().rev().take_while(u8::is_ascii_digit).count();
    if len == 0 || len > 4 {
        return None;
    }
    let start = head.len() - len;
    if head[..start].chars().next_back().is_some_and(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    head[start..].parse().ok()
}

/// Turkish ordinal before a keyword ("1. Sezon 3. Bölüm") takes precedence
/// over the number that follows it
fn ordinal_before(s: &str, pos: usize) -> Option<u32> {
    let head = s[..pos].trim_end();
    let dot = head.strip_suffix('.')?;
    number_before(dot, dot.len())
}

/// Latin/Greek/Cyrillic keywords need a word start; Arabic, Devanagari and
/// kana attach to neighbouring letters.
fn needs_word_start(keyword: &str) -> bool {
    keyword
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() && (c as u32) < 0x0600)
}

/// "Episode IV" is a film subtitle
fn roman_numeral_follows(s: &str, pos: usize) -> bool {
    let rest = s[pos..].trim_start();
    let len = rest
        .chars()
        .take_while(|c| matches!(c, 'i' | 'v' | 'x' | 'l'))
        .count();
    len > 0 && !rest[len..].chars().next().is_some_and(char::is_alphanumeric)
}

/// First keyword occurrence with a plausible number after (or, failing that, before) it
fn keyword_number(lower: &str, keywords: &[&'static str]) -> Option<(u32, &'static str)> {
    for &keyword in keywords {
        for (i, _) in lower.match_indices(keyword) {
            if needs_word_start(keyword)
                && lower[..i].chars().next_back().is_some_and(char::is_alphabetic)
            {
                continue;
            }
            let end = i + keyword.len();
            if keyword == "episode" && roman_numeral_follows(lower, end) {
                continue;
            }
            let number = [
                ordinal_before(lower, i),
                number_after(lower, end),
                number_before(lower, i),
            ]
            .into_iter()
            .flatten()
            .find(|n| is_plausible_number(*n));
            if let Some(n) = number {
                return Some((n, keyword));
            }
        }
    }
    None
}

fn word_pattern_numbers(lower: &str) -> (Option<u32>, Option<u32>) {
    let season = keyword_number(lower, SEASON_KEYWORDS).map(|(n, _)| n);
    let episode = keyword_number(lower, EPISODE_KEYWORDS);

    // "Bölüm" is both "part" and "episode": "Title: Bölüm 4 (2023)" is a film
    if let Some((_, "bölüm")) = episode {
        if season.is_none() && has_year(lower) {
            return (None, None);
        }
    }

    (season, episode.map(|(n, _)| n))
}

fn cjk_digit(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        '０'..='９' => Some(c as u32 - '０' as u32),
        _ => None,
    }
}

/// `第N季` / `第N期` season, `第N集` / `第N話` / `第N话` episode
fn cjk_numbers(name: &str) -> (Option<u32>, Option<u32>) {
    let chars: Vec<char> = name.chars().collect();
    let mut season = None;
    let mut episode = None;

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '第' {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        let mut value = 0u32;
        while j < chars.len() && j - i <= 4 {
            match cjk_digit(chars[j]) {
                Some(d) => value = value * 10 + d,
                None => break,
            }
            j += 1;
        }

        if j > i + 1 && is_plausible_number(value) {
            match chars.get(j) {
                Some('季') | Some('期') => {
                    season.get_or_insert(value);
                }
                Some('集') | Some('話') | Some('话') => {
                    episode.get_or_insert(value);
                }
                _ => {}
            }
        }
        i = j;
    }

    (season, episode)
}

/// `ep.12` / `ep 12`, with "ep" at a word start (not "Cep 5")
fn episode_only_pattern(lower: &str) -> Option<u32> {
    lower.match_indices("ep").find_map(|(i, _)| {
        let bounded = lower[..i]
            .chars()
            .next_back()
            .map_or(true, |c| c == ' ' || c == '-');
        let after = &lower[i + 2..];
        if !bounded || !(after.starts_with('.') || after.starts_with(' ')) {
            return None;
        }
        number_after(lower, i + 2).filter(|n| is_plausible_number(*n))
    })
}

fn four_digit_numbers(s: &str) -> impl Iterator<Item = u32> + '_ {
    s.split(|c: char| !c.is_ascii_digit())
        .filter(|run| run.len() == 4)
        .filter_map(|run| run.parse().ok())
}

fn has_year(s: &str) -> bool {
    four_digit_numbers(s).any(is_year_like)
}

/// Resolution suffixes, codec tokens or stylized quality glyphs
fn has_live_indicators(name: &str, lower: &str) -> bool {
    if LIVE_GLYPHS.iter().any(|g| name.contains(g)) {
        return true;
    }
    if lower.contains("h.265") || lower.contains("h.264") {
        return true;
    }
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| RESOLUTION_TOKENS.contains(&token) || CODEC_TOKENS.contains(&token))
}

fn has_language_tag(lower: &str) -> bool {
    LANGUAGE_TAGS.iter().any(|tag| {
        lower.contains(&format!("({})", tag)) || lower.contains(&format!("[{}]", tag))
    })
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| matches!(c, ':' | ',' | '.' | '-'))
}

fn is_sequel_digit(token: &str) -> bool {
    matches!(token.as_bytes(), [b'2'..=b'9'])
}

fn is_year_token(token: &str) -> bool {
    let inner = token.trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']'));
    inner.len() == 4
        && inner.bytes().all(|b| b.is_ascii_digit())
        && inner.parse().map_or(false, is_year_like)
}

fn is_part_number(token: &str) -> bool {
    let token = trim_token(token);
    let numeric = !token.is_empty() && token.len() <= 3 && token.bytes().all(|b| b.is_ascii_digit());
    let roman = !token.is_empty()
        && token.len() <= 4
        && token
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L'));
    numeric || roman
}

/// "Toy Story 2", "Avatar 2 (2022)", "Kill Bill Part 2", "Rocky IV", "Avatar 2: The Way of Water"
fn has_sequel_pattern(name: &str) -> bool {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() < 2 {
        return false;
    }

    let part_marker = tokens.windows(2).any(|pair| {
        let marker = pair[0].to_lowercase();
        matches!(
            marker.trim_end_matches(|c: char| c == ':' || c == ','),
            "part" | "pt." | "pt" | "chapter"
        ) && is_part_number(pair[1])
    });
    if part_marker {
        return true;
    }

    let subtitle = tokens[1..tokens.len() - 1]
        .iter()
        .any(|t| t.strip_suffix(':').is_some_and(is_sequel_digit));
    if subtitle {
        return true;
    }

    let mut end = tokens.len();
    if is_year_token(tokens[end - 1]) {
        end -= 1;
    }
    if end < 2 {
        return false;
    }
    let last = tokens[end - 1];
    is_sequel_digit(last) || TRAILING_ROMAN.contains(&trim_token(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str, group: &str) -> ContentType {
        let group = (!group.is_empty()).then_some(group);
        HeuristicClassifier.classify(name, group, &HashMap::new())
    }

    fn series(season: Option<u32>, episode: Option<u32>) -> ContentType {
        ContentType::Series { season, episode }
    }

    #[test]
    fn test_live_prefix_dominates() {
        assert_eq!(classify("▱ TRT 1 HD", "▱ ULUSAL"), ContentType::Live);
        assert_eq!(classify("Breaking Bad S01E01", "▱ DİZİ"), ContentType::Live);
        assert_eq!(classify("Matrix (1999)", "▱ Movies"), ContentType::Live);
    }

    #[test]
    fn test_strong_pattern_overrides_group() {
        assert_eq!(classify("Breaking Bad S01E01", "4K WORLD"), series(Some(1), Some(1)));
        assert_eq!(classify("Show.s02e10.1080p", "Movies"), series(Some(2), Some(10)));
        assert_eq!(classify("Dark S3 E8", ""), series(Some(3), Some(8)));
        assert_eq!(classify("Specials S00E03", ""), series(None, Some(3)));
        assert_eq!(classify("ShowS01E02", ""), series(Some(1), Some(2)));
    }

    #[test]
    fn test_strong_pattern_numbers() {
        assert_eq!(classify("Show S01E1999", ""), series(Some(1), None));
        assert_eq!(classify("Show S2024E03", ""), series(None, Some(3)));
        assert_eq!(classify("Show S01E12345", ""), series(Some(1), Some(12345)));
        assert_eq!(classify("Show S01E99999999999", ""), series(Some(1), None));
    }

    #[test]
    fn test_turkish_part_with_year_is_movie() {
        assert_eq!(classify("John Wick: Bölüm 4 (2023)", "Filmler"), ContentType::Movie);
        assert_eq!(classify("John Wick: Bölüm 4 (2023)", ""), ContentType::Movie);
    }

    #[test]
    fn test_turkish_season_episode() {
        assert_eq!(
            classify("Kurtlar Vadisi Sezon 1 Bölüm 5", "Dizi"),
            series(Some(1), Some(5))
        );
        assert_eq!(
            classify("Loki 1. Sezon 3. Bölüm", "Disney Plus Dizileri"),
            series(Some(1), Some(3))
        );
        assert_eq!(classify("Yalı Çapkını 12. Bölüm", ""), series(None, Some(12)));
    }

    #[test]
    fn test_multi_language_word_patterns() {
        assert_eq!(classify("Lost Season 2 Episode 7", ""), series(Some(2), Some(7)));
        assert_eq!(classify("Tatort Staffel 3 Folge 12", ""), series(Some(3), Some(12)));
        assert_eq!(classify("Lupin Saison 2 Épisode 4", ""), series(Some(2), Some(4)));
        assert_eq!(classify("Сериал Сезон 2 Серия 7", ""), series(Some(2), Some(7)));
        assert_eq!(classify("La Reina Temporada 1 Capítulo 45", ""), series(Some(1), Some(45)));
        assert_eq!(classify("Sintonia Temporada 4 Episódio 2", ""), series(Some(4), Some(2)));
        assert_eq!(classify("مسلسل الموسم 2 الحلقة 15", ""), series(Some(2), Some(15)));
        assert_eq!(classify("進撃の巨人 シーズン2 第5話", ""), series(Some(2), Some(5)));
    }

    #[test]
    fn test_cjk_counters() {
        assert_eq!(classify("琅琊榜 第1季 第12集", ""), series(Some(1), Some(12)));
        assert_eq!(classify("快乐大本营 第３期", ""), series(Some(3), None));
        assert_eq!(classify("ワンピース 第1071話", ""), series(None, Some(1071)));
    }

    #[test]
    fn test_year_never_taken_as_episode() {
        assert_eq!(classify("Documentary Episode 2019", ""), ContentType::Movie);
        assert_eq!(classify("Show Season 1999", ""), ContentType::Movie);
    }

    #[test]
    fn test_roman_episode_is_movie_subtitle() {
        assert_eq!(
            classify("Star Wars: Episode IV - A New Hope (1977)", ""),
            ContentType::Movie
        );
        assert_eq!(classify("Star Wars Episode IV", ""), ContentType::Movie);
    }

    #[test]
    fn test_episode_only_pattern() {
        assert_eq!(classify("Gündem Ep. 12", ""), series(None, Some(12)));
        assert_eq!(classify("Talk Show - ep 3", ""), series(None, Some(3)));
        assert_eq!(classify("Cep 5 TV", ""), ContentType::Live);
    }

    #[test]
    fn test_exclusion_blocks_weak_series_heuristics() {
        assert_eq!(classify("Best Of Season 5", "Top Movies"), ContentType::Movie);
        assert_eq!(classify("Making Of Ep. 2", "Marvel Collection"), ContentType::Movie);
    }

    #[test]
    fn test_bare_series_group() {
        assert_eq!(classify("Yalı Çapkını", "Yerli Diziler"), series(None, None));
        assert_eq!(classify("Yalı Çapkını", "YERLİ DİZİLER"), series(None, None));
        assert_eq!(classify("The Office", "TV Shows"), series(None, None));
    }

    #[test]
    fn test_movie_group_keywords() {
        assert_eq!(classify("Inception", "4K WORLD"), ContentType::Movie);
        assert_eq!(classify("Anything", "IMDB Top 250"), ContentType::Movie);
        assert_eq!(classify("Anything", "VOD"), ContentType::Movie);
        assert_eq!(classify("Anything", "Dizi Koleksiyon"), series(None, None));
    }

    #[test]
    fn test_short_group_keywords_match_whole_words_only() {
        // "hd", "top", "dc" inside longer words are not quality/brand labels
        assert_eq!(classify("Haber", "Shdw Stop"), ContentType::Live);
        assert_eq!(classify("Haber", "Dcity News"), ContentType::Live);
        assert_eq!(classify("Haber", "Top HD"), ContentType::Movie);
    }

    #[test]
    fn test_sequel_patterns() {
        assert_eq!(classify("Toy Story 3", ""), ContentType::Movie);
        assert_eq!(classify("Rocky IV", ""), ContentType::Movie);
        assert_eq!(classify("Kill Bill Part 2", ""), ContentType::Movie);
        assert_eq!(classify("Harry Potter Chapter II", ""), ContentType::Movie);
        assert_eq!(classify("Avatar 2: The Way of Water", ""), ContentType::Movie);
        assert_eq!(classify("Cars 3 (2017)", ""), ContentType::Movie);
    }

    #[test]
    fn test_sequel_discarded_by_live_indicators() {
        assert_eq!(classify("Formula 1 Part 2 FHD", ""), ContentType::Live);
        assert_eq!(classify("Kanal 7 ᴴᴰ", ""), ContentType::Live);
    }

    #[test]
    fn test_4k_bracket_tag() {
        assert_eq!(classify("Dune [4K]", ""), ContentType::Movie);
        assert_eq!(classify("Dune [4k]", ""), ContentType::Movie);
    }

    #[test]
    fn test_year_and_language_tag() {
        assert_eq!(classify("Oppenheimer 2023", ""), ContentType::Movie);
        assert_eq!(classify("TRT Belgesel 2023 HD", ""), ContentType::Live);
        assert_eq!(classify("Kuru Otlar Üstüne (TR) 2023 FHD", ""), ContentType::Movie);
        assert_eq!(classify("Some Film [EN] 2019 HEVC", ""), ContentType::Movie);
    }

    #[test]
    fn test_default_is_live() {
        assert_eq!(classify("CNN International", ""), ContentType::Live);
        assert_eq!(classify("", ""), ContentType::Live);
        assert_eq!(classify("TRT 1 HD", "ULUSAL"), ContentType::Live);
    }

    #[test]
    fn test_classify_is_pure() {
        let inputs = [
            ("Breaking Bad S01E01", "4K WORLD"),
            ("John Wick: Bölüm 4 (2023)", "Filmler"),
            ("Kurtlar Vadisi Sezon 1 Bölüm 5", "Dizi"),
            ("▱ TRT 1 HD", "▱ ULUSAL"),
        ];
        for (name, group) in inputs {
            assert_eq!(classify(name, group), classify(name, group));
        }
    }

    #[test]
    fn test_is_year_like_bounds() {
        assert!(!is_year_like(1949));
        assert!(is_year_like(1950));
        assert!(is_year_like(2030));
        assert!(!is_year_like(2031));
    }
}
