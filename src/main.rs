use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iptv_playlist::{
    DedupKey, DeduplicationStatistics, Deduplicator, ParseStatistics, ParseWarning, ParserConfig,
    PlaylistParser, TextEncoding,
};
use iptv_playlist::models::PlaylistStats;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesSummary {
    name: String,
    group: Option<String>,
    episodes: usize,
    seasons: Vec<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InspectSummary {
    source: String,
    encoding: TextEncoding,
    stats: PlaylistStats,
    statistics: ParseStatistics,
    groups: BTreeMap<String, usize>,
    unique_series: Vec<SeriesSummary>,
    deduplication: DeduplicationStatistics,
    warnings: Vec<ParseWarning>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iptv_playlist=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let source = std::env::args()
        .nth(1)
        .context("Usage: iptv-inspect <playlist-file-or-url>")?;

    let config = ParserConfig::from_env();
    tracing::info!("iptv-inspect v{}", env!("CARGO_PKG_VERSION"));

    let parser = PlaylistParser::new(config);
    let report = if source.starts_with("http://") || source.starts_with("https://") {
        parser
            .fetch_with_report(&source)
            .await
            .with_context(|| format!("Failed to fetch playlist {}", source))?
    } else {
        parser
            .parse_file_with_report(&source)
            .await
            .with_context(|| format!("Failed to parse playlist {}", source))?
    };

    let playlist = &report.playlist;
    let groups = playlist
        .grouped_by_category()
        .into_iter()
        .map(|(name, records)| (name.to_string(), records.len()))
        .collect();
    let unique_series = playlist
        .unique_series()
        .into_iter()
        .map(|series| SeriesSummary {
            episodes: series.episode_count(),
            seasons: series.seasons(),
            name: series.name,
            group: series.group.map(String::from),
        })
        .collect();
    let (_, deduplication) = Deduplicator::new(DedupKey::Url).deduplicate(playlist);

    let summary = InspectSummary {
        source,
        encoding: report.encoding,
        stats: playlist.stats(),
        statistics: report.statistics.clone(),
        groups,
        unique_series,
        deduplication,
        warnings: report.warnings.clone(),
    };

    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    println!("{}", json);

    Ok(())
}
