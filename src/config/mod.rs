pub mod profile;

use crate::error::{Error, Result};
use crate::github::{client::MAX_PAGE_SIZE, GitHubConfig, SortField};
use crate::output::LineFormat;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

pub use profile::RunProfile;

/// Frameworks searched when neither `FRAMEWORK` nor a profile names any
pub const DEFAULT_FRAMEWORKS: [&str; 8] = [
    "react", "vue", "angular", "svelte", "nextjs", "nuxt", "express", "nestjs",
];

pub const DEFAULT_INDICATOR: &str = "package.json";

/// GitHub only serves the first 1000 results of any search
pub const SEARCH_RESULT_WINDOW: u32 = 1000;

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub github: GitHubConfig,
    pub search: SearchConfig,
    pub filters: FilterConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub frameworks: Vec<String>,
    pub indicators: Vec<String>,
    pub sort: SortField,
    pub page_size: u32,
    pub max_pages: u32,
    /// Pause between two pages of the same query
    pub page_delay_secs: u64,
}

#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Keep repositories with strictly more stars
    pub stars_above: Option<u32>,
    /// Keep repositories created strictly after this day
    pub created_after: Option<NaiveDate>,
    /// Keep repositories with at least this many contributors
    pub min_contributors: Option<u32>,
    /// Page size of the contributors request
    pub contributor_sample: u32,
}

#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    pub format: LineFormat,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            frameworks: DEFAULT_FRAMEWORKS.iter().map(|s| s.to_string()).collect(),
            indicators: vec![DEFAULT_INDICATOR.to_string()],
            sort: SortField::Stars,
            page_size: MAX_PAGE_SIZE,
            max_pages: 5,
            page_delay_secs: 6,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            stars_above: None,
            created_after: None,
            min_contributors: None,
            contributor_sample: 3,
        }
    }
}

impl SearchConfig {
    /// Last page worth requesting for one query
    pub fn last_page(&self) -> u32 {
        let window = SEARCH_RESULT_WINDOW / self.page_size.max(1);
        self.max_pages.min(window.max(1))
    }
}

/// Split a comma separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    env_var(name)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid {name} value: {v}")))
        })
        .transpose()
}

impl Settings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        let mut settings = Settings {
            github: GitHubConfig::from_env(),
            ..Default::default()
        };

        if let Some(frameworks) = env_var("FRAMEWORK") {
            settings.search.frameworks = split_list(&frameworks);
        }
        if let Some(indicators) = env_var("FRAMESCAN_INDICATORS") {
            settings.search.indicators = split_list(&indicators);
        }
        if let Some(sort) = env_var("FRAMESCAN_SORT") {
            settings.search.sort = sort.parse().map_err(Error::Config)?;
        }
        if let Some(page_size) = parse_env("FRAMESCAN_PAGE_SIZE")? {
            settings.search.page_size = page_size;
        }
        if let Some(max_pages) = parse_env("FRAMESCAN_MAX_PAGES")? {
            settings.search.max_pages = max_pages;
        }
        if let Some(delay) = parse_env("FRAMESCAN_PAGE_DELAY")? {
            settings.search.page_delay_secs = delay;
        }

        settings.filters.stars_above = parse_env("FRAMESCAN_STARS_ABOVE")?;
        settings.filters.created_after = parse_env("FRAMESCAN_CREATED_AFTER")?;
        settings.filters.min_contributors = parse_env("FRAMESCAN_MIN_CONTRIBUTORS")?;
        if let Some(sample) = parse_env("FRAMESCAN_CONTRIBUTOR_SAMPLE")? {
            settings.filters.contributor_sample = sample;
        }

        Ok(settings)
    }

    /// Overlay the values a run profile sets
    pub fn apply_profile(&mut self, profile: &RunProfile) {
        if !profile.frameworks.is_empty() {
            self.search.frameworks = profile.frameworks.clone();
        }
        if let Some(indicators) = &profile.indicators {
            self.search.indicators = indicators.clone();
        }
        if let Some(sort) = profile.sort {
            self.search.sort = sort;
        }

        let filters = &profile.filters;
        if filters.stars_above.is_some() {
            self.filters.stars_above = filters.stars_above;
        }
        if filters.created_after.is_some() {
            self.filters.created_after = filters.created_after;
        }
        if filters.min_contributors.is_some() {
            self.filters.min_contributors = filters.min_contributors;
        }
        if let Some(sample) = filters.contributor_sample {
            self.filters.contributor_sample = sample;
        }
    }

    /// Validate configuration before any request is made
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;

        if search.frameworks.is_empty() {
            return Err(Error::Config(
                "No framework configured, set FRAMEWORK or pass --framework".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for framework in &search.frameworks {
            if framework.trim().is_empty() {
                return Err(Error::Config(
                    "Framework keyword cannot be empty".to_string(),
                ));
            }
            if !seen.insert(framework.to_lowercase()) {
                return Err(Error::Config(format!("Duplicate framework: {framework}")));
            }
        }

        if search.indicators.iter().any(|i| i.trim().is_empty()) {
            return Err(Error::Config(
                "Indicator filename cannot be empty".to_string(),
            ));
        }

        if search.page_size == 0 || search.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        if search.max_pages == 0 {
            return Err(Error::Config("Max pages must be at least 1".to_string()));
        }

        let sample = self.filters.contributor_sample;
        if sample == 0 || sample > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Contributor sample must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        if let Some(min) = self.filters.min_contributors {
            if min > sample {
                return Err(Error::Config(format!(
                    "Minimum contributors ({min}) exceeds the contributor sample size ({sample})"
                )));
            }
        }

        url::Url::parse(self.github.api_base_url())
            .map_err(|e| Error::Config(format!("Invalid GitHub API URL: {e}")))?;

        Ok(())
    }
}
