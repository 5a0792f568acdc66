pub mod filter;

use crate::config::{SearchConfig, Settings};
use crate::github::{GitHubClient, RepositorySummary, SearchQuery};
use crate::output::{LineFormat, OutputSink};
use crate::shutdown::ShutdownSignal;
use crate::{Error, Result};
use chrono::Local;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub use filter::{Rejection, RepositoryFilter};

/// Walks every (framework, indicator, page) combination and writes
/// qualifying repositories to an [`OutputSink`]
pub struct SearchRunner {
    client: GitHubClient,
    search: SearchConfig,
    filter: RepositoryFilter,
    contributor_sample: u32,
    format: LineFormat,
    shutdown: ShutdownSignal,
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub queries_planned: usize,
    pub queries_completed: usize,
    pub pages_fetched: usize,
    pub repositories_written: usize,
    pub interruption: Option<Interruption>,
}

/// Where an unfinished run stopped
#[derive(Debug, Clone)]
pub struct Interruption {
    pub query: Option<String>,
    /// Last page of `query` whose repositories were all processed, 0 if none
    pub last_page: u32,
    pub reason: String,
}

#[derive(Default)]
struct Progress {
    seen_urls: HashSet<String>,
    current_query: Option<String>,
    last_page: u32,
    queries_completed: usize,
    pages_fetched: usize,
}

impl SearchRunner {
    /// Build a runner from validated settings
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = GitHubClient::new(settings.github.clone())?;

        Ok(Self {
            client,
            search: settings.search.clone(),
            filter: RepositoryFilter::from(&settings.filters),
            contributor_sample: settings.filters.contributor_sample,
            format: settings.output.format,
            shutdown: ShutdownSignal::new(),
        })
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.client = self.client.with_shutdown(shutdown.clone());
        self.shutdown = shutdown;
        self
    }

    /// Queries in the order `run` issues them
    pub fn plan(&self) -> Vec<SearchQuery> {
        let mut queries = Vec::new();

        for framework in &self.search.frameworks {
            let base = SearchQuery::new(framework.trim())
                .with_stars_above(self.filter.stars_above)
                .with_created_after(self.filter.created_after);

            if self.search.indicators.is_empty() {
                queries.push(base);
                continue;
            }

            for indicator in &self.search.indicators {
                queries.push(base.clone().with_indicator(indicator.trim()));
            }
        }

        queries
    }

    /// Run every planned query, writing results to `sink`.
    ///
    /// Errors inside the search loop do not escape: they end the run with a
    /// footer describing where it stopped and are reported through
    /// [`RunReport::interruption`]. Only failures to write the file itself
    /// are returned as errors.
    pub async fn run(&self, mut sink: OutputSink) -> Result<RunReport> {
        if !self.client.is_authenticated() {
            warn!("No GITHUB_TOKEN configured, requests are limited to 60 per hour");
        }

        let queries = self.plan();
        self.write_header(&mut sink, queries.len())?;

        let mut progress = Progress::default();
        let outcome = self.run_queries(&queries, &mut sink, &mut progress).await;

        let interruption = match outcome {
            Ok(()) => {
                let written = sink.repositories_written();
                info!("Search completed: {} repositories written", written);
                sink.comment(&format!("Run completed: {}", Local::now().to_rfc3339()))?;
                sink.comment(&format!("Repositories written: {written}"))?;
                None
            }
            Err(e) => {
                let reason = e.log_safe();
                error!(
                    "Search stopped after page {} of '{}': {}",
                    progress.last_page,
                    progress.current_query.as_deref().unwrap_or("-"),
                    reason
                );

                sink.comment(&format!("Run interrupted: {reason}"))?;
                if let Some(query) = &progress.current_query {
                    sink.comment(&format!("Stopped during query: {query}"))?;
                }
                let written = sink.repositories_written();
                sink.comment(&format!("Last processed page: {}", progress.last_page))?;
                sink.comment(&format!("Repositories written: {written}"))?;

                Some(Interruption {
                    query: progress.current_query.clone(),
                    last_page: progress.last_page,
                    reason,
                })
            }
        };

        let (remaining, limit, reset) = self.client.last_seen_rate_limit().await;
        debug!(
            "Rate limit at end of run: {}/{} (resets at {})",
            remaining, limit, reset
        );

        let repositories_written = sink.repositories_written();
        let output_path = sink.finish()?;

        Ok(RunReport {
            output_path,
            queries_planned: queries.len(),
            queries_completed: progress.queries_completed,
            pages_fetched: progress.pages_fetched,
            repositories_written,
            interruption,
        })
    }

    fn write_header(&self, sink: &mut OutputSink, query_count: usize) -> Result<()> {
        let indicators = if self.search.indicators.is_empty() {
            "none".to_string()
        } else {
            self.search.indicators.join(", ")
        };

        sink.comment(&format!("Run started: {}", Local::now().to_rfc3339()))?;
        sink.comment(&format!(
            "Frameworks: {}",
            self.search.frameworks.join(", ")
        ))?;
        sink.comment(&format!("Indicators: {indicators}"))?;
        sink.comment(&format!("Filters: {}", self.filter.describe()))?;
        sink.comment(&format!(
            "Sort: {} desc, {} per page, up to {} pages per query",
            self.search.sort,
            self.search.page_size,
            self.search.last_page()
        ))?;
        sink.comment(&format!("Queries planned: {query_count}"))?;
        Ok(())
    }

    async fn run_queries(
        &self,
        queries: &[SearchQuery],
        sink: &mut OutputSink,
        progress: &mut Progress,
    ) -> Result<()> {
        for (index, query) in queries.iter().enumerate() {
            info!("Query {}/{}: {}", index + 1, queries.len(), query);

            progress.current_query = Some(query.to_string());
            progress.last_page = 0;

            self.run_query(query, sink, progress).await?;
            progress.queries_completed += 1;
        }

        Ok(())
    }

    async fn run_query(
        &self,
        query: &SearchQuery,
        sink: &mut OutputSink,
        progress: &mut Progress,
    ) -> Result<()> {
        let last_page = self.search.last_page();
        let page_size = self.search.page_size;

        for page in 1..=last_page {
            self.check_shutdown()?;

            info!("Fetching page {} of '{}'", page, query);
            let results = self
                .client
                .fetch_page(query, self.search.sort, page, page_size)
                .await?;
            progress.pages_fetched += 1;

            if page == 1 {
                info!(
                    "Total repositories matching '{}': {}",
                    query, results.total_count
                );
            }

            if results.items.is_empty() {
                info!("No more results for '{}'", query);
                break;
            }

            let item_count = results.items.len();
            debug!("Processing {} repositories from page {}", item_count, page);

            // Lines are committed per page so the file never holds half a page
            let mut qualifying = Vec::new();
            for repo in results.items {
                self.check_shutdown()?;
                if let Some(repo) = self.process_repository(repo, progress).await? {
                    qualifying.push(repo);
                }
            }

            for repo in &qualifying {
                sink.repository(repo, self.format)?;
            }
            progress.last_page = page;

            if item_count < page_size as usize {
                info!("Page {} was the last page for '{}'", page, query);
                break;
            }

            if page == last_page {
                debug!("Page cap of {} reached for '{}'", last_page, query);
                break;
            }

            if self.search.page_delay_secs > 0 {
                info!(
                    "Sleeping {} seconds before page {}",
                    self.search.page_delay_secs,
                    page + 1
                );
                let delay = Duration::from_secs(self.search.page_delay_secs);
                if !self.shutdown.sleep(delay).await {
                    return Err(Error::Interrupted(
                        "shutdown requested between pages".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Apply filters and dedupe, returning the repository if it qualifies
    async fn process_repository(
        &self,
        mut repo: RepositorySummary,
        progress: &mut Progress,
    ) -> Result<Option<RepositorySummary>> {
        debug!("Repository: {}", repo.details());

        if let Some(rejection) = self.filter.check_search_fields(&repo) {
            debug!("Skipping {}: {}", repo.full_name, rejection);
            return Ok(None);
        }

        if progress.seen_urls.contains(&repo.html_url) {
            debug!("Skipping {}: already recorded", repo.full_name);
            return Ok(None);
        }

        if self.filter.needs_contributors() {
            let count = match self
                .client
                .fetch_contributor_count(
                    &repo.owner.login,
                    &repo.name,
                    self.contributor_sample,
                )
                .await
            {
                Ok(count) => count,
                Err(Error::Api { status, .. }) => {
                    warn!(
                        "Could not count contributors of {} ({}), skipping",
                        repo.full_name, status
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            repo.contributor_count = Some(count);
            if let Some(rejection) = self.filter.check_contributors(count) {
                debug!("Skipping {}: {}", repo.full_name, rejection);
                return Ok(None);
            }
        }

        progress.seen_urls.insert(repo.html_url.clone());
        Ok(Some(repo))
    }

    fn check_shutdown(&self) -> Result<()> {
        if self.shutdown.is_requested() {
            return Err(Error::Interrupted("shutdown requested".to_string()));
        }
        Ok(())
    }
}
