use std::env;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// GitHub API client configuration
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Optional GitHub personal access token (60 -> 5000 requests per hour)
    pub token: Option<String>,

    /// Base URL of the REST API, overridable for GitHub Enterprise and tests
    pub api_base_url: String,

    /// Seconds added on top of the advertised reset time before retrying
    pub rate_limit_padding_secs: u64,

    /// How many times a throttled request is retried before giving up
    pub max_rate_limit_retries: u32,

    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl GitHubConfig {
    /// Create a new GitHubConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            token: env::var("GITHUB_TOKEN")
                .ok()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            api_base_url: env::var("GITHUB_API_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.api_base_url),
            rate_limit_padding_secs: env::var("FRAMESCAN_RATE_LIMIT_PADDING")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_padding_secs),
            max_rate_limit_retries: env::var("FRAMESCAN_MAX_RATE_LIMIT_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_rate_limit_retries),
            request_timeout_secs: env::var("FRAMESCAN_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Get the base API URL without a trailing slash
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Whether requests are authenticated
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            rate_limit_padding_secs: 10,
            max_rate_limit_retries: 5,
            request_timeout_secs: 30,
        }
    }
}
