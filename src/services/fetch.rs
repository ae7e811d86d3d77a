use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::time::sleep;
use tokio_util::io::StreamReader;
use url::Url;

use crate::config::ParserConfig;
use crate::error::{PlaylistError, Result};

const MAX_BACKOFF_MS: u64 = 10_000;

/// HTTP retrieval of playlist bytes with retry, backoff and a size limit
#[derive(Clone)]
pub struct PlaylistFetcher {
    client: Client,
    max_retries: u32,
    max_playlist_size_mb: usize,
    max_playlist_bytes: u64,
}

impl PlaylistFetcher {
    pub fn new(config: &ParserConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.fetch_timeout())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            max_playlist_size_mb: config.max_playlist_size_mb,
            max_playlist_bytes: config.max_playlist_bytes(),
        })
    }

    /// Send the request, retrying network errors and HTTP 429 with
    /// exponential backoff. Non-success statuses fail with `Network`.
    pub async fn fetch(&self, url: &str) -> Result<Response> {
        let url = Url::parse(url).map_err(|_| PlaylistError::InvalidUrl(url.to_string()))?;
        let mut attempt = 0u32;

        loop {
            match self.client.get(url.clone()).send().await {
                Ok(resp) if resp.status().is_success() => {
                    if let Some(len) = resp.content_length() {
                        self.check_size(len)?;
                        tracing::info!("Playlist size: {:.2} MB", len as f64 / 1024.0 / 1024.0);
                    }
                    return Ok(resp);
                }
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries => {
                    let backoff_ms = backoff_delay_ms(attempt);
                    tracing::warn!("fetch_retry" = attempt + 1, "reason" = "429", "backoff_ms" = backoff_ms);
                    sleep(Duration::from_millis(backoff_ms)).await;
                }
                Ok(resp) => return resp.error_for_status().map_err(PlaylistError::from),
                Err(err) if attempt < self.max_retries => {
                    let backoff_ms = backoff_delay_ms(attempt);
                    tracing::warn!(
                        "fetch_retry" = attempt + 1,
                        "reason" = "network",
                        "backoff_ms" = backoff_ms,
                        error = %err
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(err) => return Err(err.into()),
            }
            attempt += 1;
        }
    }

    /// Whole body, enforcing the size limit even without `Content-Length`
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.fetch(url).await?;
        let mut body = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            body.extend_from_slice(&chunk?);
            self.check_size(body.len() as u64)?;
        }

        Ok(body)
    }

    /// Body as an `AsyncRead` for line-by-line streaming
    pub async fn fetch_reader(&self, url: &str) -> Result<impl AsyncRead + Unpin + Send + 'static> {
        let response = self.fetch(url).await?;
        let body = response
            .bytes_stream()
            .map(|result| result.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)));
        Ok(StreamReader::new(body))
    }

    fn check_size(&self, bytes: u64) -> Result<()> {
        if bytes > self.max_playlist_bytes {
            return Err(PlaylistError::TooLarge {
                size_mb: bytes as f64 / 1024.0 / 1024.0,
                limit_mb: self.max_playlist_size_mb,
            });
        }
        Ok(())
    }
}

fn backoff_delay_ms(attempt: u32) -> u64 {
    1u64.checked_shl(attempt)
        .unwrap_or(u64::MAX)
        .saturating_mul(500)
        .min(MAX_BACKOFF_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay_ms(0), 500);
        assert_eq!(backoff_delay_ms(1), 1_000);
        assert_eq!(backoff_delay_ms(4), 8_000);
        assert_eq!(backoff_delay_ms(5), MAX_BACKOFF_MS);
        assert_eq!(backoff_delay_ms(80), MAX_BACKOFF_MS);
    }

    #[test]
    fn test_size_limit() {
        let config = ParserConfig {
            max_playlist_size_mb: 1,
            ..ParserConfig::default()
        };
        let fetcher = PlaylistFetcher::new(&config).unwrap();
        assert!(fetcher.check_size(1024 * 1024).is_ok());
        assert!(matches!(
            fetcher.check_size(3 * 1024 * 1024),
            Err(PlaylistError::TooLarge { limit_mb: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let fetcher = PlaylistFetcher::new(&ParserConfig::default()).unwrap();
        assert!(matches!(
            fetcher.fetch("not a url").await,
            Err(PlaylistError::InvalidUrl(_))
        ));
    }
}
