use crate::config::Settings;
use crate::github::GitHubClient;
use crate::output::{default_file_name, OutputSink};
use crate::runner::{RunReport, SearchRunner};
use crate::shutdown::ShutdownSignal;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::info;

/// Run the search and write results to the configured output file
pub async fn search(settings: &Settings, shutdown: ShutdownSignal) -> Result<RunReport> {
    let output_path = match &settings.output.path {
        Some(path) => path.clone(),
        None => {
            let name = default_file_name(&settings.search.frameworks, &Local::now());
            PathBuf::from(name)
        }
    };

    let runner = SearchRunner::new(settings)?.with_shutdown(shutdown);
    let sink = OutputSink::create(&output_path)?;
    info!("Saving results to {}", output_path.display());

    let report = runner.run(sink).await?;

    println!();
    println!(
        "Queries: {}/{} completed, {} pages fetched",
        report.queries_completed, report.queries_planned, report.pages_fetched
    );
    println!("Repositories written: {}", report.repositories_written);
    println!("Results saved to {}", report.output_path.display());

    if let Some(interruption) = &report.interruption {
        return Err(Error::Interrupted(format!(
            "{} (last processed page {})",
            interruption.reason, interruption.last_page
        )));
    }

    Ok(report)
}

/// Print the queries a run would issue
pub fn queries(settings: &Settings) -> Result<()> {
    let runner = SearchRunner::new(settings)?;
    let plan = runner.plan();

    for (index, query) in plan.iter().enumerate() {
        println!("{:>3}. {}", index + 1, query);
    }
    println!(
        "\n{} queries, up to {} pages of {} each",
        plan.len(),
        settings.search.last_page(),
        settings.search.page_size
    );

    Ok(())
}

/// Print the current GitHub rate limit buckets
pub async fn limits(settings: &Settings) -> Result<()> {
    let client = GitHubClient::new(settings.github.clone())?;
    let status = client.rate_limit_status().await?;

    let auth = if client.is_authenticated() {
        "authenticated"
    } else {
        "unauthenticated"
    };
    println!("GitHub API rate limits ({auth})");

    for (name, bucket) in [
        ("core", &status.resources.core),
        ("search", &status.resources.search),
    ] {
        let reset = DateTime::from_timestamp(bucket.reset, 0)
            .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
            .unwrap_or_else(|| bucket.reset.to_string());
        println!(
            "  {:<7} {:>5}/{:<5} resets at {}",
            name, bucket.remaining, bucket.limit, reset
        );
    }

    Ok(())
}
