use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response body of `GET /search/repositories`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    #[serde(default)]
    pub items: Vec<RepositorySummary>,
}

/// Repository entry as returned by the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    pub html_url: String,
    pub description: Option<String>,
    pub stargazers_count: u32,
    pub forks_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Filled in by the runner when contributor filtering is enabled
    #[serde(skip)]
    pub contributor_count: Option<u32>,
}

impl RepositorySummary {
    /// One-line summary of the fields the output file leaves out
    pub fn details(&self) -> String {
        format!(
            "{} by {} ({}), {} stars, {} forks, updated {}, {}",
            self.name,
            self.owner.login,
            self.description.as_deref().unwrap_or("No description"),
            self.stargazers_count,
            self.forks_count,
            self.updated_at.format("%Y-%m-%d"),
            self.html_url
        )
    }
}

/// Repository owner information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Entry of `GET /repos/{owner}/{repo}/contributors`
///
/// Only its presence is counted; anonymous contributors have no login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub login: Option<String>,
    #[serde(default)]
    pub contributions: u32,
}

/// Response body of `GET /rate_limit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimit,
    pub search: RateLimit,
}

/// GitHub API rate limit information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimit {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
}

/// Page of search results handed to the runner
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub items: Vec<RepositorySummary>,
    pub total_count: u64,
}

impl From<SearchResponse> for ResultSet {
    fn from(response: SearchResponse) -> Self {
        Self {
            items: response.items,
            total_count: response.total_count,
        }
    }
}
