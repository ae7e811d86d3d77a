use lazy_static::lazy_static;
use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use crate::services::classifier::LIVE_GROUP_PREFIX;

const SERIES_CACHE_CAPACITY: usize = 10_000;

lazy_static! {
    // ============ SEASON/EPISODE MARKERS ============
    static ref MARKER_STRONG: Regex = Regex::new(r"(?i)\bs\d{1,3}[\s._-]?e\d{1,4}").unwrap();
    static ref MARKER_WORD: Regex = Regex::new(
        r"(?i)(?:\d{1,4}\.\s*)?\b(?:season|sezon|saison|staffel|temporada|episode|épisode|bölüm|folge|episódio|episodio|capítulo|capitulo|сезон|серия)\b"
    ).unwrap();
    static ref MARKER_SCRIPT: Regex = Regex::new(r"الموسم|الحلقة|シーズン|सीज़न|सीजन|एपिसोड").unwrap();
    static ref MARKER_CJK: Regex = Regex::new(r"第[0-9０-９]+[季期集話话]").unwrap();
    static ref MARKER_EP: Regex = Regex::new(r"(?i)(?:^|[\s-])ep[.\s]\s*\d+").unwrap();

    // ============ TITLE CLEANERS ============
    static ref BRACKETS: Regex = Regex::new(r"[\[\(][^\]\)]*[\]\)]").unwrap();
    static ref QUALITY: Regex = Regex::new(r"(?i)\b(4k|2160p|1080p|720p|480p|360p|hd|fhd|uhd|sd)\b").unwrap();
    static ref FORMATS: Regex = Regex::new(r"(?i)\b(aac|ac3|dts|x264|x265|hevc|h264|h265|webdl|web-dl|bluray|bdrip|webrip|hdrip|dvdrip|hdcam)\b").unwrap();
    static ref AUDIO: Regex = Regex::new(r"(?i)\b(dub|dubbed|sub|subbed|dual|multi|altyazılı|dublaj)\b").unwrap();
    static ref GLYPHS: Regex = Regex::new(r"[ᴬ-ᵡᶠ-ᶿ⁰-⁹ˢ▱]+").unwrap();
    static ref PIPES: Regex = Regex::new(r"[|]").unwrap();
    static ref MULTI_SPACES: Regex = Regex::new(r"\s+").unwrap();
    static ref TRAILING_PUNCT: Regex = Regex::new(r"[.\-_:,]+$").unwrap();

    // ============ CHANNEL CLEANERS ============
    static ref COUNTRY_PREFIX: Regex =
        Regex::new(r"^(?:\|\s*[a-z]{2,3}\s*\||\[[a-z]{2,3}\]|\([a-z]{2,3}\)|[a-z]{2,3}\s*[:|])\s*").unwrap();
    static ref CHANNEL_QUALITY: Regex =
        Regex::new(r"\b(?:hd|fhd|uhd|sd|4k|hevc|h265|h264|2160p|1080p|720p|raw)\b").unwrap();
    static ref NON_ALNUM: Regex = Regex::new(r"[^\p{L}\p{N}]+").unwrap();
}

/// Title clean-up used for display and unique-series grouping
pub trait TitleNormalizer: Send + Sync {
    /// Remove tags, quality/codec tokens and separators
    fn clean_title(&self, title: &str) -> String;

    /// Series name with season/episode markers (and everything after them) stripped
    fn series_name(&self, title: &str) -> String;
}

/// Name key used to match the same channel across providers
pub trait ChannelNormalizer: Send + Sync {
    fn normalize_channel(&self, name: &str) -> String;
}

pub struct DefaultTitleNormalizer {
    series_cache: Mutex<LruCache<String, String>>,
}

impl DefaultTitleNormalizer {
    pub fn new() -> Self {
        Self::with_capacity(SERIES_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            series_cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn compute_series_name(&self, title: &str) -> String {
        let start = [
            &*MARKER_STRONG,
            &*MARKER_WORD,
            &*MARKER_SCRIPT,
            &*MARKER_CJK,
            &*MARKER_EP,
        ]
        .iter()
        .filter_map(|re| re.find(title).map(|m| m.start()))
        .min();

        let name = match start {
            Some(start) => {
                let prefix = self.clean_title(&title[..start]);
                if prefix.is_empty() {
                    // Marker leads the title: drop just the markers
                    let stripped = MARKER_STRONG.replace_all(title, " ");
                    let stripped = MARKER_WORD.replace_all(&stripped, " ");
                    let stripped = MARKER_SCRIPT.replace_all(&stripped, " ");
                    let stripped = MARKER_CJK.replace_all(&stripped, " ");
                    let stripped = MARKER_EP.replace_all(&stripped, " ");
                    self.clean_title(&stripped)
                } else {
                    prefix
                }
            }
            None => self.clean_title(title),
        };

        if name.is_empty() {
            title.trim().to_string()
        } else {
            name
        }
    }

    /// Clear the series name cache
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.series_cache.lock() {
            cache.clear();
        }
    }
}

impl Default for DefaultTitleNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleNormalizer for DefaultTitleNormalizer {
    fn clean_title(&self, title: &str) -> String {
        let result = BRACKETS.replace_all(title, "");
        let result = GLYPHS.replace_all(&result, "");
        let result = QUALITY.replace_all(&result, "");
        let result = FORMATS.replace_all(&result, "");
        let result = AUDIO.replace_all(&result, "");
        let result = PIPES.replace_all(&result, " ");
        let result = MULTI_SPACES.replace_all(&result, " ");
        let result = result.trim();
        let result = TRAILING_PUNCT.replace_all(result, "");
        result
            .trim()
            .trim_start_matches(LIVE_GROUP_PREFIX)
            .trim()
            .to_string()
    }

    fn series_name(&self, title: &str) -> String {
        if let Ok(mut cache) = self.series_cache.lock() {
            if let Some(cached) = cache.get(title) {
                return cached.clone();
            }
        }

        let name = self.compute_series_name(title);

        if let Ok(mut cache) = self.series_cache.lock() {
            cache.put(title.to_string(), name.clone());
        }
        name
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultChannelNormalizer;

impl ChannelNormalizer for DefaultChannelNormalizer {
    fn normalize_channel(&self, name: &str) -> String {
        let lower = name.replace('İ', "i").to_lowercase();
        let result = GLYPHS.replace_all(&lower, " ");
        let result = COUNTRY_PREFIX.replace(result.trim(), "");
        let result = CHANNEL_QUALITY.replace_all(&result, " ");
        let result = NON_ALNUM.replace_all(&result, " ");
        result.trim().to_string()
    }
}
