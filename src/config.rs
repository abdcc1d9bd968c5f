use std::time::Duration;

/// Production endpoint of the JSON API.
pub const DEFAULT_BASE_URL: &str = "https://api.moysklad.ru/api/remap/1.2";

/// Connection settings shared by [`crate::ApiClient`], [`crate::BlockingApiClient`]
/// and [`crate::MoySklad`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Bearer token sent in the `Authorization` header.
    pub token: Option<String>,
    /// API root; endpoint paths are resolved relative to it.
    pub base_url: String,
    /// Total number of attempts per request, including the first one.
    pub retry_count: u32,
    /// Base delay for retries. Connection failures back off exponentially from it.
    pub retry_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Log request and response bodies at `debug` level.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with the given token and default settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    #[must_use]
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
