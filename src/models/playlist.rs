use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, HashMap, HashSet};
use url::Url;
use uuid::Uuid;

use crate::services::normalizer::{DefaultTitleNormalizer, TitleNormalizer};

/// Label used by [`Playlist::grouped_by_category`] for records without a group
pub const UNGROUPED_LABEL: &str = "Uncategorized";

/// Content type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentType {
    Live,
    Movie,
    /// One episode row. Season/episode stay `None` when undetectable.
    Series {
        season: Option<u32>,
        episode: Option<u32>,
    },
}

impl ContentType {
    pub fn is_live(&self) -> bool {
        matches!(self, ContentType::Live)
    }

    pub fn is_movie(&self) -> bool {
        matches!(self, ContentType::Movie)
    }

    pub fn is_series(&self) -> bool {
        matches!(self, ContentType::Series { .. })
    }

    pub fn season(&self) -> Option<u32> {
        match self {
            ContentType::Series { season, .. } => *season,
            _ => None,
        }
    }

    pub fn episode(&self) -> Option<u32> {
        match self {
            ContentType::Series { episode, .. } => *episode,
            _ => None,
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::Live
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Live => write!(f, "live"),
            ContentType::Movie => write!(f, "movie"),
            ContentType::Series {
                season: Some(s),
                episode: Some(e),
            } => write!(f, "series S{:02}E{:02}", s, e),
            ContentType::Series { .. } => write!(f, "series"),
        }
    }
}

/// Xtream/XUI panel extras carried on EXTINF lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xui_id: Option<String>,
    /// Time-shift window in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeshift: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchup_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchup_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catchup_correction: Option<i64>,
    /// `Some(true)` or nothing: an explicit `tvg-rec="0"` is indistinguishable
    /// from a missing attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording: Option<bool>,
}

/// Single playlist entry (channel/movie/episode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRecord {
    pub id: Uuid,
    pub name: String,
    pub url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epg_id: Option<String>,
    pub content_type: ContentType,
    /// `None` for live entries (the -1 sentinel)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(flatten)]
    pub provider: ProviderFields,
}

impl PlaylistRecord {
    /// Deterministic record id from source ordinal and URL, so whole-document
    /// and streaming parses of the same input yield identical records.
    pub fn generate_id(url: &Url, index: usize) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            format!("{}|{}", index, url.as_str()).as_bytes(),
        )
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }
}

/// Playlist statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStats {
    pub total_items: usize,
    pub live_count: usize,
    pub movie_count: usize,
    pub series_count: usize,
    pub group_count: usize,
}

/// A unique series (name + group) with its episode rows, recomputed on demand
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesGroup<'a> {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<&'a str>,
    /// Sorted by season then episode; unnumbered episodes keep source order at the end
    pub episodes: Vec<&'a PlaylistRecord>,
}

impl SeriesGroup<'_> {
    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    /// Distinct known season numbers, ascending
    pub fn seasons(&self) -> Vec<u32> {
        let mut seasons: Vec<u32> = self
            .episodes
            .iter()
            .filter_map(|r| r.content_type.season())
            .collect();
        seasons.sort_unstable();
        seasons.dedup();
        seasons
    }
}

/// Ordered collection of records in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    records: Vec<PlaylistRecord>,
}

impl Playlist {
    pub fn new(records: Vec<PlaylistRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PlaylistRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PlaylistRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlaylistRecord> {
        self.records.iter()
    }

    pub fn channels(&self) -> Vec<&PlaylistRecord> {
        self.filter(|r| r.content_type.is_live())
    }

    pub fn movies(&self) -> Vec<&PlaylistRecord> {
        self.filter(|r| r.content_type.is_movie())
    }

    /// Every episode row (not unique series, see [`Playlist::unique_series`])
    pub fn series(&self) -> Vec<&PlaylistRecord> {
        self.filter(|r| r.content_type.is_series())
    }

    /// Distinct group labels in first-seen order
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.group.as_deref())
            .filter(|g| seen.insert(*g))
            .collect()
    }

    pub fn records_in_group(&self, group: &str) -> Vec<&PlaylistRecord> {
        self.filter(|r| r.group.as_deref() == Some(group))
    }

    /// Records keyed by group label; ungrouped records go under [`UNGROUPED_LABEL`]
    pub fn grouped_by_category(&self) -> BTreeMap<&str, Vec<&PlaylistRecord>> {
        let mut grouped: BTreeMap<&str, Vec<&PlaylistRecord>> = BTreeMap::new();
        for record in &self.records {
            let key = record.group.as_deref().unwrap_or(UNGROUPED_LABEL);
            grouped.entry(key).or_default().push(record);
        }
        grouped
    }

    pub fn stats(&self) -> PlaylistStats {
        let mut stats = PlaylistStats {
            total_items: self.records.len(),
            group_count: self.groups().len(),
            ..Default::default()
        };
        for record in &self.records {
            match record.content_type {
                ContentType::Live => stats.live_count += 1,
                ContentType::Movie => stats.movie_count += 1,
                ContentType::Series { .. } => stats.series_count += 1,
            }
        }
        stats
    }

    pub fn unique_series(&self) -> Vec<SeriesGroup<'_>> {
        self.unique_series_with(&DefaultTitleNormalizer::new())
    }

    /// Group episode rows into unique series by stripping season/episode
    /// tokens from their titles. Series appear in first-seen order.
    pub fn unique_series_with(&self, normalizer: &dyn TitleNormalizer) -> Vec<SeriesGroup<'_>> {
        let mut index: HashMap<(String, Option<&str>), usize> = HashMap::new();
        let mut result: Vec<SeriesGroup<'_>> = Vec::new();

        for record in self.records.iter().filter(|r| r.content_type.is_series()) {
            let name = normalizer.series_name(&record.name);
            let group = record.group.as_deref();
            let key = (name.to_lowercase(), group);

            let slot = *index.entry(key).or_insert_with(|| {
                let series_key = format!("{}_{}", group.unwrap_or_default(), name);
                result.push(SeriesGroup {
                    id: format!("series_{}", hash_key(&series_key)),
                    name: name.clone(),
                    group,
                    episodes: Vec::new(),
                });
                result.len() - 1
            });
            result[slot].episodes.push(record);
        }

        for series in &mut result {
            // Stable sort keeps source order among equal keys
            series.episodes.sort_by_key(|r| {
                (
                    r.content_type.season().unwrap_or(u32::MAX),
                    r.content_type.episode().unwrap_or(u32::MAX),
                )
            });
        }

        result
    }

    fn filter(&self, predicate: impl Fn(&PlaylistRecord) -> bool) -> Vec<&PlaylistRecord> {
        self.records.iter().filter(|r| predicate(r)).collect()
    }
}

impl FromIterator<PlaylistRecord> for Playlist {
    fn from_iter<I: IntoIterator<Item = PlaylistRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Playlist {
    type Item = &'a PlaylistRecord;
    type IntoIter = std::slice::Iter<'a, PlaylistRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// SHA1 hex digest used for stable aggregate ids
pub fn hash_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, group: Option<&str>, content_type: ContentType, index: usize) -> PlaylistRecord {
        let url = Url::parse(&format!("http://example.com/stream/{}", index)).unwrap();
        PlaylistRecord {
            id: PlaylistRecord::generate_id(&url, index),
            name: name.to_string(),
            url,
            group: group.map(|g| g.to_string()),
            logo: None,
            epg_id: None,
            content_type,
            duration: None,
            attributes: HashMap::new(),
            provider: ProviderFields::default(),
        }
    }

    fn series(season: u32, episode: u32) -> ContentType {
        ContentType::Series {
            season: Some(season),
            episode: Some(episode),
        }
    }

    fn sample() -> Playlist {
        Playlist::new(vec![
            record("TRT 1", Some("Ulusal"), ContentType::Live, 0),
            record("Matrix (1999)", Some("Movies"), ContentType::Movie, 1),
            record("Breaking Bad S01E02", Some("Series"), series(1, 2), 2),
            record("Breaking Bad S01E01", Some("Series"), series(1, 1), 3),
            record("Dark S02E01", Some("Series"), series(2, 1), 4),
            record("Loose Stream", None, ContentType::Live, 5),
        ])
    }

    #[test]
    fn test_filtered_views() {
        let playlist = sample();
        assert_eq!(playlist.channels().len(), 2);
        assert_eq!(playlist.movies().len(), 1);
        assert_eq!(playlist.series().len(), 3);
        assert_eq!(playlist.groups(), vec!["Ulusal", "Movies", "Series"]);
        assert_eq!(playlist.records_in_group("Series").len(), 3);
    }

    #[test]
    fn test_grouped_by_category() {
        let playlist = sample();
        let grouped = playlist.grouped_by_category();
        assert_eq!(grouped.len(), 4);
        assert_eq!(grouped[UNGROUPED_LABEL].len(), 1);
        assert_eq!(grouped["Series"].len(), 3);
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.total_items, 6);
        assert_eq!(stats.live_count, 2);
        assert_eq!(stats.movie_count, 1);
        assert_eq!(stats.series_count, 3);
        assert_eq!(stats.group_count, 3);
    }

    #[test]
    fn test_unique_series_orders_episodes() {
        let playlist = sample();
        let series = playlist.unique_series();
        assert_eq!(series.len(), 2);

        let breaking_bad = &series[0];
        assert_eq!(breaking_bad.name, "Breaking Bad");
        assert_eq!(breaking_bad.group, Some("Series"));
        assert_eq!(breaking_bad.episode_count(), 2);
        assert_eq!(breaking_bad.episodes[0].name, "Breaking Bad S01E01");
        assert_eq!(breaking_bad.seasons(), vec![1]);
        assert!(breaking_bad.id.starts_with("series_"));

        assert_eq!(series[1].name, "Dark");
    }

    #[test]
    fn test_series_equality_compares_numbers() {
        assert_eq!(series(1, 1), series(1, 1));
        assert_ne!(series(1, 1), series(1, 2));
        assert_ne!(
            ContentType::Series { season: None, episode: None },
            series(1, 1)
        );
    }

    #[test]
    fn test_generate_id_is_deterministic() {
        let url = Url::parse("http://example.com/a").unwrap();
        assert_eq!(PlaylistRecord::generate_id(&url, 0), PlaylistRecord::generate_id(&url, 0));
        assert_ne!(PlaylistRecord::generate_id(&url, 0), PlaylistRecord::generate_id(&url, 1));
    }

    #[test]
    fn test_content_type_serialization() {
        let json = serde_json::to_string(&series(2, 5)).unwrap();
        assert_eq!(json, r#"{"kind":"series","season":2,"episode":5}"#);
        let json = serde_json::to_string(&ContentType::Live).unwrap();
        assert_eq!(json, r#"{"kind":"live"}"#);
    }
}
