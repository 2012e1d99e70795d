use std::time::Duration;

pub const DEFAULT_BASE: &str = "https://sapi.dramabox.be/api";
pub const DEFAULT_LANG: &str = "in";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_WATCH_SOURCE: &str = "search_result";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub lang: String,
    pub timeout: Duration,
    pub proxy: Option<String>,
    pub watch_source: String,
    /// Seed for spread default ratings; `None` keeps a fixed default.
    pub rating_seed: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE.to_string(),
            lang: DEFAULT_LANG.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            proxy: None,
            watch_source: DEFAULT_WATCH_SOURCE.to_string(),
            rating_seed: None,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ApiConfig {
    /// Defaults overridden by `DRAMA_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(env_non_empty)
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            base_url: get("DRAMA_API_BASE")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(d.base_url),
            lang: get("DRAMA_LANG").unwrap_or(d.lang),
            timeout: get("DRAMA_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(d.timeout),
            proxy: get("DRAMA_HTTP_PROXY"),
            watch_source: get("DRAMA_WATCH_SOURCE").unwrap_or(d.watch_source),
            rating_seed: get("DRAMA_RATING_SEED").and_then(|s| s.parse::<u64>().ok()),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
