use serde::{Deserialize, Serialize};

use crate::models::PlaylistRecord;

const HEVC_BONUS: u32 = 10;

/// Video quality tier, ordered from worst to best
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    Unknown,
    Sd,
    Hd,
    FullHd,
    UltraHd,
}

impl QualityTier {
    pub fn badge(&self) -> &'static str {
        match self {
            QualityTier::Unknown => "",
            QualityTier::Sd => "SD",
            QualityTier::Hd => "HD",
            QualityTier::FullHd => "FHD",
            QualityTier::UltraHd => "4K",
        }
    }

    fn base_score(&self) -> u32 {
        match self {
            QualityTier::Unknown => 0,
            QualityTier::Sd => 25,
            QualityTier::Hd => 50,
            QualityTier::FullHd => 75,
            QualityTier::UltraHd => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityInfo {
    pub tier: QualityTier,
    pub hevc: bool,
    pub score: u32,
}

/// Quality scoring strategy used when choosing between duplicates
pub trait QualityAnalyzer: Send + Sync {
    fn analyze(&self, record: &PlaylistRecord) -> QualityInfo;
}

/// Reads quality tags and stylized glyphs from the record name
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultQualityAnalyzer;

impl DefaultQualityAnalyzer {
    pub fn analyze_name(&self, name: &str) -> QualityInfo {
        let upper = name.to_uppercase();
        let tokens: Vec<&str> = upper
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let token_tier = tokens
            .iter()
            .map(|t| match *t {
                "4K" | "UHD" | "2160P" => QualityTier::UltraHd,
                "FHD" | "1080P" | "1080I" => QualityTier::FullHd,
                "HD" | "720P" => QualityTier::Hd,
                "SD" | "576P" | "480P" | "360P" => QualityTier::Sd,
                _ => QualityTier::Unknown,
            })
            .max()
            .unwrap_or_default();

        let glyph_tier = if name.contains("ᵁᴴᴰ") || name.contains("⁴ᴷ") {
            QualityTier::UltraHd
        } else if name.contains("ᶠᴴᴰ") {
            QualityTier::FullHd
        } else if name.contains("ᴴᴰ") {
            QualityTier::Hd
        } else if name.contains("ˢᴰ") {
            QualityTier::Sd
        } else {
            QualityTier::Unknown
        };

        let tier = token_tier.max(glyph_tier);
        let hevc = upper.contains("H.265")
            || tokens.iter().any(|t| matches!(*t, "HEVC" | "H265" | "X265"));

        let score = tier.base_score() + if hevc { HEVC_BONUS } else { 0 };
        QualityInfo { tier, hevc, score }
    }
}

impl QualityAnalyzer for DefaultQualityAnalyzer {
    fn analyze(&self, record: &PlaylistRecord) -> QualityInfo {
        self.analyze_name(&record.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_from_tokens() {
        let analyzer = DefaultQualityAnalyzer;
        assert_eq!(analyzer.analyze_name("TRT 1 HD").tier, QualityTier::Hd);
        assert_eq!(analyzer.analyze_name("TRT 1 FHD").tier, QualityTier::FullHd);
        assert_eq!(analyzer.analyze_name("Movie [4K]").tier, QualityTier::UltraHd);
        assert_eq!(analyzer.analyze_name("News 720p").tier, QualityTier::Hd);
        assert_eq!(analyzer.analyze_name("Kanal D").tier, QualityTier::Unknown);
        // "HD" inside a word is not a tag
        assert_eq!(analyzer.analyze_name("SHADOW").tier, QualityTier::Unknown);
    }

    #[test]
    fn test_tiers_from_glyphs() {
        let analyzer = DefaultQualityAnalyzer;
        assert_eq!(analyzer.analyze_name("TRT 1 ᴴᴰ").tier, QualityTier::Hd);
        assert_eq!(analyzer.analyze_name("TRT 1 ᶠᴴᴰ").tier, QualityTier::FullHd);
        assert_eq!(analyzer.analyze_name("TRT 1 ᵁᴴᴰ").tier, QualityTier::UltraHd);
    }

    #[test]
    fn test_hevc_bonus_and_ordering() {
        let analyzer = DefaultQualityAnalyzer;
        let plain = analyzer.analyze_name("Sport FHD");
        let hevc = analyzer.analyze_name("Sport FHD HEVC");
        assert!(hevc.hevc);
        assert_eq!(hevc.score, plain.score + HEVC_BONUS);
        assert!(analyzer.analyze_name("Sport H.265").hevc);

        assert!(QualityTier::UltraHd > QualityTier::FullHd);
        assert!(QualityTier::Sd > QualityTier::Unknown);
    }
}
