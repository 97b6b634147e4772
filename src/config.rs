//! Client configuration

use url::Url;

/// Tuning for one client session: where the backend lives and how
/// aggressively to reconnect and poll.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL; always normalized to end with a slash so relative
    /// endpoint paths join underneath it
    pub base_url: Url,
    /// Push channel endpoint
    pub push_url: Url,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Default polling period in seconds
    pub poll_interval_secs: u64,
    /// Heartbeat interval for the push channel in seconds
    pub heartbeat_interval_secs: u64,
    /// Initial reconnection delay in milliseconds
    pub initial_reconnect_delay_ms: u64,
    /// Maximum reconnection delay in milliseconds
    pub max_reconnect_delay_ms: u64,
    /// Maximum reconnection attempts (0 = infinite)
    pub max_reconnect_attempts: u32,
    /// Buffer size for the push event broadcast channel
    pub event_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8000/").expect("static URL"),
            push_url: Url::parse("ws://localhost:8000/ws").expect("static URL"),
            request_timeout_secs: 30,
            poll_interval_secs: 30,
            heartbeat_interval_secs: 10,
            initial_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 30000,
            max_reconnect_attempts: 0,
            event_buffer_size: 1000,
        }
    }
}

impl ClientConfig {
    /// Override the REST base URL, normalizing the trailing slash.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, url::ParseError> {
        self.base_url = normalize_base(url)?;
        Ok(self)
    }

    pub fn with_push_url(mut self, url: &str) -> Result<Self, url::ParseError> {
        self.push_url = Url::parse(url)?;
        Ok(self)
    }

    /// Build from defaults plus `STOCKDECK_API_URL`, `STOCKDECK_PUSH_URL`
    /// and `STOCKDECK_POLL_SECS` environment overrides. Malformed values
    /// are ignored in favor of the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("STOCKDECK_API_URL") {
            if let Ok(parsed) = normalize_base(&url) {
                config.base_url = parsed;
            }
        }
        if let Ok(url) = std::env::var("STOCKDECK_PUSH_URL") {
            if let Ok(parsed) = Url::parse(&url) {
                config.push_url = parsed;
            }
        }
        if let Ok(secs) = std::env::var("STOCKDECK_POLL_SECS") {
            if let Ok(parsed) = secs.parse() {
                config.poll_interval_secs = parsed;
            }
        }
        config
    }
}

fn normalize_base(url: &str) -> Result<Url, url::ParseError> {
    if url.ends_with('/') {
        Url::parse(url)
    } else {
        Url::parse(&format!("{url}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = ClientConfig::default();
        assert_eq!(config.heartbeat_interval_secs, 10);
        assert_eq!(config.max_reconnect_attempts, 0);
        assert!(config.base_url.as_str().ends_with('/'));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = ClientConfig::default()
            .with_base_url("http://api.example.com")
            .unwrap();
        assert_eq!(config.base_url.as_str(), "http://api.example.com/");

        let joined = config.base_url.join("api/portfolios").unwrap();
        assert_eq!(joined.as_str(), "http://api.example.com/api/portfolios");
    }
}
