use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use url::Url;

use crate::models::{Playlist, PlaylistRecord};
use crate::services::normalizer::{ChannelNormalizer, DefaultChannelNormalizer};
use crate::services::quality::{DefaultQualityAnalyzer, QualityAnalyzer};

/// What makes two records "the same"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupKey {
    /// Same stream URL (fragment ignored)
    #[default]
    Url,
    /// Same normalized channel name within the same group
    NormalizedName,
    /// Either of the above
    UrlOrName,
}

/// Which member of a duplicate set survives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    #[default]
    First,
    /// Best quality score; earliest record wins ties
    HighestQuality,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeduplicationStatistics {
    pub original_count: usize,
    pub unique_count: usize,
    pub duplicates_removed: usize,
    /// Number of keys that matched more than one record
    pub duplicate_groups: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MatchKey {
    Url(u64),
    Name(String),
}

pub struct Deduplicator {
    key: DedupKey,
    keep: KeepPolicy,
    channel_normalizer: Arc<dyn ChannelNormalizer>,
    quality_analyzer: Arc<dyn QualityAnalyzer>,
}

impl Deduplicator {
    pub fn new(key: DedupKey) -> Self {
        Self {
            key,
            keep: KeepPolicy::First,
            channel_normalizer: Arc::new(DefaultChannelNormalizer),
            quality_analyzer: Arc::new(DefaultQualityAnalyzer),
        }
    }

    pub fn with_keep_policy(mut self, keep: KeepPolicy) -> Self {
        self.keep = keep;
        self
    }

    pub fn with_channel_normalizer(mut self, normalizer: Arc<dyn ChannelNormalizer>) -> Self {
        self.channel_normalizer = normalizer;
        self
    }

    pub fn with_quality_analyzer(mut self, analyzer: Arc<dyn QualityAnalyzer>) -> Self {
        self.quality_analyzer = analyzer;
        self
    }

    /// Remove duplicates, keeping surviving records in source order
    pub fn deduplicate(&self, playlist: &Playlist) -> (Playlist, DeduplicationStatistics) {
        let records = playlist.records();
        let mut key_to_set: HashMap<MatchKey, usize> = HashMap::new();
        let mut sets: Vec<Vec<usize>> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let keys = self.match_keys(record);
            let existing = keys.iter().find_map(|k| key_to_set.get(k).copied());

            let set = match existing {
                Some(set) => {
                    sets[set].push(index);
                    set
                }
                None => {
                    sets.push(vec![index]);
                    sets.len() - 1
                }
            };
            for key in keys {
                key_to_set.entry(key).or_insert(set);
            }
        }

        let mut survivors: Vec<usize> = sets.iter().map(|set| self.pick(records, set)).collect();
        survivors.sort_unstable();

        let statistics = DeduplicationStatistics {
            original_count: records.len(),
            unique_count: survivors.len(),
            duplicates_removed: records.len() - survivors.len(),
            duplicate_groups: sets.iter().filter(|set| set.len() > 1).count(),
        };

        tracing::debug!(
            "Deduplicated {} records: {} removed in {} groups",
            statistics.original_count,
            statistics.duplicates_removed,
            statistics.duplicate_groups
        );

        let playlist = survivors.into_iter().map(|i| records[i].clone()).collect();
        (playlist, statistics)
    }

    fn match_keys(&self, record: &PlaylistRecord) -> Vec<MatchKey> {
        let mut keys = Vec::with_capacity(2);
        if matches!(self.key, DedupKey::Url | DedupKey::UrlOrName) {
            keys.push(MatchKey::Url(url_dedup_hash(&record.url)));
        }
        if matches!(self.key, DedupKey::NormalizedName | DedupKey::UrlOrName) {
            let name = self.channel_normalizer.normalize_channel(&record.name);
            // Unnamed records never match by name
            if !name.is_empty() {
                let group = record.group.as_deref().unwrap_or_default().to_lowercase();
                keys.push(MatchKey::Name(format!("{}\u{1f}{}", group, name)));
            }
        }
        keys
    }

    fn pick(&self, records: &[PlaylistRecord], set: &[usize]) -> usize {
        match self.keep {
            KeepPolicy::First => set[0],
            KeepPolicy::HighestQuality => {
                let mut best = set[0];
                let mut best_score = self.quality_analyzer.analyze(&records[best]).score;
                for &index in &set[1..] {
                    let score = self.quality_analyzer.analyze(&records[index]).score;
                    if score > best_score {
                        best = index;
                        best_score = score;
                    }
                }
                best
            }
        }
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DedupKey::default())
    }
}

/// URL hash for deduplication (fragment ignored)
fn url_dedup_hash(url: &Url) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    match url.as_str().split_once('#') {
        Some((base, _)) => base.hash(&mut hasher),
        None => url.as_str().hash(&mut hasher),
    }
    hasher.finish()
}
