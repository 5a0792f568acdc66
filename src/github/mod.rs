pub mod client;
pub mod config;
pub mod models;
pub mod query;
pub mod rate_limiter;

pub use client::GitHubClient;
pub use config::GitHubConfig;
pub use models::{RepositorySummary, ResultSet};
pub use query::{SearchQuery, SortField};
pub use rate_limiter::RateLimiter;
