use std::env;
use std::time::Duration;

/// Upper bound for `stream_buffer`
pub const MAX_STREAM_BUFFER: usize = 1 << 20;

/// Parser configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ParserConfig {
    // Fetching
    pub user_agent: String,
    pub fetch_timeout_ms: u64,
    pub max_retries: u32,
    pub max_playlist_size_mb: usize,

    // Streaming
    /// Records buffered between the producer task and the consumer.
    /// Once full, the oldest buffered records are overwritten. Clamped to
    /// `1..=MAX_STREAM_BUFFER`; the channel rounds it up to a power of two.
    pub stream_buffer: usize,
    pub read_timeout_ms: u64,
    pub max_line_bytes: usize,
}

impl ParserConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            // Use VLC user agent to avoid IPTV server blocks
            user_agent: env::var("IPTV_USER_AGENT").unwrap_or(defaults.user_agent),
            fetch_timeout_ms: env::var("IPTV_FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fetch_timeout_ms),
            max_retries: env::var("IPTV_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            max_playlist_size_mb: env::var("IPTV_MAX_PLAYLIST_SIZE_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_playlist_size_mb),

            stream_buffer: env::var("IPTV_STREAM_BUFFER")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(clamp_stream_buffer)
                .unwrap_or(defaults.stream_buffer),
            read_timeout_ms: env::var("IPTV_READ_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.read_timeout_ms),
            max_line_bytes: env::var("IPTV_MAX_LINE_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_line_bytes),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Effective broadcast channel capacity
    pub fn stream_capacity(&self) -> usize {
        clamp_stream_buffer(self.stream_buffer).next_power_of_two()
    }

    pub fn max_playlist_bytes(&self) -> u64 {
        (self.max_playlist_size_mb as u64).saturating_mul(1024 * 1024)
    }
}

fn clamp_stream_buffer(n: usize) -> usize {
    n.clamp(1, MAX_STREAM_BUFFER)
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            user_agent: "VLC/3.0.20 LibVLC/3.0.20".to_string(),
            fetch_timeout_ms: 300_000, // 5 minutes
            max_retries: 3,
            max_playlist_size_mb: 500,
            stream_buffer: 1024,
            read_timeout_ms: 10_000,
            max_line_bytes: 32 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.stream_buffer, 1024);
        assert_eq!(config.max_playlist_bytes(), 500 * 1024 * 1024);
        assert_eq!(config.read_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_stream_capacity_clamped_and_rounded() {
        let capacity = |stream_buffer: usize| {
            ParserConfig {
                stream_buffer,
                ..ParserConfig::default()
            }
            .stream_capacity()
        };
        assert_eq!(capacity(0), 1);
        assert_eq!(capacity(1000), 1024);
        assert_eq!(capacity(usize::MAX), MAX_STREAM_BUFFER);
        assert_eq!(clamp_stream_buffer(usize::MAX), MAX_STREAM_BUFFER);
    }
}
