// Command-line interface

pub mod commands;

use crate::config::{RunProfile, Settings};
use crate::github::SortField;
use crate::output::LineFormat;
use crate::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "framescan")]
#[command(about = "Find GitHub repositories built with a given framework", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search GitHub and write qualifying repositories to a file
    Search(SearchArgs),

    /// Print the search queries a run would issue, without calling GitHub
    Queries(SearchArgs),

    /// Show the current GitHub API rate limits
    Limits,
}

/// Flags shared by `search` and `queries`; they override profile and
/// environment values
#[derive(Args, Debug, Default, Clone)]
pub struct SearchArgs {
    /// YAML run profile with frameworks, indicators and filters
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Framework keyword to search for (repeatable)
    #[arg(short, long = "framework")]
    pub frameworks: Vec<String>,

    /// Indicator filename used as a search qualifier (repeatable)
    #[arg(short, long = "indicator")]
    pub indicators: Vec<String>,

    /// Search without an indicator filename qualifier
    #[arg(long, conflicts_with = "indicators")]
    pub no_indicator: bool,

    /// Keep repositories with more than this many stars
    #[arg(long)]
    pub stars_above: Option<u32>,

    /// Keep repositories created after this day (YYYY-MM-DD)
    #[arg(long)]
    pub created_after: Option<NaiveDate>,

    /// Keep repositories with at least this many contributors
    #[arg(long)]
    pub min_contributors: Option<u32>,

    /// Page size of the contributors request
    #[arg(long)]
    pub contributor_sample: Option<u32>,

    /// Order of search results
    #[arg(long, value_enum)]
    pub sort: Option<SortField>,

    /// Results per page (1-100)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Maximum pages fetched per query
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Seconds to wait between pages
    #[arg(long)]
    pub page_delay: Option<u64>,

    /// Output file (default: derived from framework or start time)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Append star and contributor counts to each line
    #[arg(long)]
    pub annotate: bool,

    /// GitHub personal access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl SearchArgs {
    /// Apply the profile (if any) and then the explicit flags
    pub fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(path) = &self.profile {
            let profile = RunProfile::from_file(path)?;
            settings.apply_profile(&profile);
        }

        if !self.frameworks.is_empty() {
            settings.search.frameworks = self.frameworks.clone();
        }
        if !self.indicators.is_empty() {
            settings.search.indicators = self.indicators.clone();
        }
        if self.no_indicator {
            settings.search.indicators.clear();
        }
        if let Some(sort) = self.sort {
            settings.search.sort = sort;
        }
        if let Some(page_size) = self.page_size {
            settings.search.page_size = page_size;
        }
        if let Some(max_pages) = self.max_pages {
            settings.search.max_pages = max_pages;
        }
        if let Some(delay) = self.page_delay {
            settings.search.page_delay_secs = delay;
        }

        if self.stars_above.is_some() {
            settings.filters.stars_above = self.stars_above;
        }
        if self.created_after.is_some() {
            settings.filters.created_after = self.created_after;
        }
        if self.min_contributors.is_some() {
            settings.filters.min_contributors = self.min_contributors;
        }
        if let Some(sample) = self.contributor_sample {
            settings.filters.contributor_sample = sample;
        }

        if self.output.is_some() {
            settings.output.path = self.output.clone();
        }
        if self.annotate {
            settings.output.format = LineFormat::Annotated;
        }

        if let Some(token) = self.token.as_deref().map(str::trim) {
            if !token.is_empty() {
                settings.github.token = Some(token.to_string());
            }
        }

        Ok(())
    }
}
