//! Result file written while a search runs
//!
//! Every line is flushed as soon as it is written so an interrupted run still
//! leaves a usable file behind.

use crate::error::Result;
use crate::github::RepositorySummary;
use chrono::{DateTime, TimeZone};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How a qualifying repository is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFormat {
    /// Bare HTML URL
    #[default]
    Url,
    /// `<url> (Stars: <n>, Contributors: <n>)`
    Annotated,
}

impl LineFormat {
    pub fn render(&self, repo: &RepositorySummary) -> String {
        match self {
            LineFormat::Url => repo.html_url.clone(),
            LineFormat::Annotated => match repo.contributor_count {
                Some(contributors) => format!(
                    "{} (Stars: {}, Contributors: {})",
                    repo.html_url, repo.stargazers_count, contributors
                ),
                None => format!("{} (Stars: {})", repo.html_url, repo.stargazers_count),
            },
        }
    }
}

/// Default output file name.
///
/// A run over a single framework is named after it, anything else gets a
/// timestamped name.
pub fn default_file_name<Tz: TimeZone>(frameworks: &[String], started_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match frameworks {
        [framework] => format!("{}_repositories.txt", sanitize_file_stem(framework)),
        _ => format!(
            "github_framework_repos_{}.txt",
            started_at.format("%Y%m%d_%H%M%S")
        ),
    }
}

/// Keep keywords like `next.js` or `@angular/core` usable as file names
fn sanitize_file_stem(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            c => c,
        })
        .collect()
}

/// Append-only result file, mirrored to stdout
pub struct OutputSink {
    path: PathBuf,
    file: File,
    repositories_written: usize,
    echo: bool,
}

impl OutputSink {
    /// Create (or truncate) the output file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        debug!("Writing results to {}", path.display());

        Ok(Self {
            path,
            file,
            repositories_written: 0,
            echo: true,
        })
    }

    /// Stop mirroring lines to stdout
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn repositories_written(&self) -> usize {
        self.repositories_written
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        if self.echo {
            println!("{line}");
        }
        writeln!(self.file, "{line}")?;
        self.file.flush()?;
        Ok(())
    }

    /// Write a `#` metadata line
    pub fn comment(&mut self, text: &str) -> Result<()> {
        self.write_line(&format!("# {text}"))
    }

    /// Write one qualifying repository
    pub fn repository(&mut self, repo: &RepositorySummary, format: LineFormat) -> Result<()> {
        self.write_line(&format.render(repo))?;
        self.repositories_written += 1;
        Ok(())
    }

    /// Flush and close the file, returning its path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(self.path)
    }
}
