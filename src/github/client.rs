use crate::github::{
    config::GitHubConfig,
    models::{Contributor, RateLimitResponse, ResultSet, SearchResponse},
    query::{SearchQuery, SortField},
    rate_limiter::{RateLimitHeaders, RateLimiter},
};
use crate::shutdown::ShutdownSignal;
use crate::{Error, Result};
use reqwest::{header, Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

const USER_AGENT: &str = concat!("framescan/", env!("CARGO_PKG_VERSION"));

/// Largest page GitHub serves for search and list endpoints
pub const MAX_PAGE_SIZE: u32 = 100;

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
    rate_limiter: RateLimiter,
    shutdown: ShutdownSignal,
}

impl GitHubClient {
    /// Create a new GitHub client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github.v3+json"),
        );

        // Add authentication if token is provided
        if let Some(token) = &config.token {
            let auth_value = format!("Bearer {token}");
            let mut value = header::HeaderValue::from_str(&auth_value)
                .map_err(|e| Error::Internal(format!("Invalid GitHub token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {e}")))?;

        let padding = Duration::from_secs(config.rate_limit_padding_secs);
        let rate_limiter = RateLimiter::new(padding);

        Ok(Self {
            client,
            config,
            rate_limiter,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Abort rate limit waits once `shutdown` is requested
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let url = format!("{}{}", self.config.api_base_url(), path);
        Ok(Url::parse(&url)?)
    }

    /// Issue a GET, sleeping through rate limit rejections.
    ///
    /// The identical request is re-sent after each backoff. Once
    /// `max_rate_limit_retries` retries have been throttled as well the
    /// request fails with [`Error::RateLimitExhausted`]. Any other
    /// non-success status becomes [`Error::Api`].
    async fn send(&self, url: &Url) -> Result<Response> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            debug!("GitHub API request: GET {} (attempt {})", url, attempts);

            let response = self.client.get(url.clone()).send().await?;

            let limits = RateLimitHeaders::from_headers(response.headers());
            self.rate_limiter.update_from_headers(&limits).await;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if let Some(delay) = self.rate_limiter.throttle_delay(status, &limits) {
                if attempts > self.config.max_rate_limit_retries {
                    error!(
                        "GitHub rate limit still exceeded after {} attempts, giving up",
                        attempts
                    );
                    return Err(Error::RateLimitExhausted { attempts });
                }

                warn!(
                    "GitHub API rate limit exceeded ({}), sleeping {} seconds before retrying",
                    status,
                    delay.as_secs()
                );
                if !self.shutdown.sleep(delay).await {
                    return Err(Error::Interrupted(
                        "shutdown requested during rate limit wait".to_string(),
                    ));
                }
                continue;
            }

            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            error!("GitHub API error: {} - {}", status, body);

            return Err(Error::Api { status, body });
        }
    }

    /// Fetch one page of repository search results
    pub async fn fetch_page(
        &self,
        query: &SearchQuery,
        sort: SortField,
        page: u32,
        page_size: u32,
    ) -> Result<ResultSet> {
        if page == 0 {
            return Err(Error::Validation("Pages are numbered from 1".to_string()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::Validation(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        let mut url = self.endpoint("/search/repositories")?;
        url.query_pairs_mut()
            .append_pair("q", &query.to_query_string())
            .append_pair("sort", sort.as_str())
            .append_pair("order", "desc")
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &page_size.to_string());

        let response = self.send(&url).await?;
        let body: SearchResponse = response.json().await?;

        if body.incomplete_results {
            warn!("GitHub reported incomplete results for query '{}'", query);
        }

        Ok(body.into())
    }

    /// Count contributors of a repository, up to `sample_size`.
    ///
    /// Only one page is requested, so the result saturates at `sample_size`.
    pub async fn fetch_contributor_count(
        &self,
        owner: &str,
        repo: &str,
        sample_size: u32,
    ) -> Result<u32> {
        let sample_size = sample_size.clamp(1, MAX_PAGE_SIZE);

        let mut url = self.endpoint(&format!("/repos/{owner}/{repo}/contributors"))?;
        url.query_pairs_mut()
            .append_pair("per_page", &sample_size.to_string())
            .append_pair("anon", "true");

        let response = self.send(&url).await?;

        // Empty repositories answer with 204 and no body
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(0);
        }

        let contributors: Vec<Contributor> = response.json().await?;
        Ok((contributors.len() as u32).min(sample_size))
    }

    /// Fetch the current rate limit buckets from `/rate_limit`
    pub async fn rate_limit_status(&self) -> Result<RateLimitResponse> {
        let url = self.endpoint("/rate_limit")?;
        let response = self.send(&url).await?;
        Ok(response.json().await?)
    }

    /// Get rate limit state as seen on the last response
    pub async fn last_seen_rate_limit(&self) -> (u32, u32, chrono::DateTime<chrono::Utc>) {
        self.rate_limiter.get_status().await
    }

    pub fn is_authenticated(&self) -> bool {
        self.config.has_token()
    }
}
