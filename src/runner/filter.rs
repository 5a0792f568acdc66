use crate::config::FilterConfig;
use crate::github::RepositorySummary;
use chrono::NaiveDate;
use std::fmt;

/// Client-side predicates applied to every search result
#[derive(Debug, Clone, Default)]
pub struct RepositoryFilter {
    pub stars_above: Option<u32>,
    pub created_after: Option<NaiveDate>,
    pub min_contributors: Option<u32>,
}

/// Why a repository was left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooFewStars { stars: u32, required_above: u32 },
    CreatedTooEarly { created: NaiveDate, required_after: NaiveDate },
    TooFewContributors { contributors: u32, required: u32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooFewStars {
                stars,
                required_above,
            } => write!(f, "{stars} stars, need more than {required_above}"),
            Rejection::CreatedTooEarly {
                created,
                required_after,
            } => write!(f, "created {created}, need after {required_after}"),
            Rejection::TooFewContributors {
                contributors,
                required,
            } => write!(f, "{contributors} contributors, need at least {required}"),
        }
    }
}

impl From<&FilterConfig> for RepositoryFilter {
    fn from(config: &FilterConfig) -> Self {
        Self {
            stars_above: config.stars_above,
            created_after: config.created_after,
            min_contributors: config.min_contributors,
        }
    }
}

impl RepositoryFilter {
    /// Whether a contributors request is needed per repository
    pub fn needs_contributors(&self) -> bool {
        self.min_contributors.is_some()
    }

    /// Predicates answerable from the search result alone.
    ///
    /// The query already carries `stars:>` and `created:>`, these checks
    /// catch whatever the search index let through.
    pub fn check_search_fields(&self, repo: &RepositorySummary) -> Option<Rejection> {
        if let Some(required_above) = self.stars_above {
            if repo.stargazers_count <= required_above {
                return Some(Rejection::TooFewStars {
                    stars: repo.stargazers_count,
                    required_above,
                });
            }
        }

        if let Some(required_after) = self.created_after {
            let created = repo.created_at.date_naive();
            if created <= required_after {
                return Some(Rejection::CreatedTooEarly {
                    created,
                    required_after,
                });
            }
        }

        None
    }

    pub fn check_contributors(&self, contributors: u32) -> Option<Rejection> {
        match self.min_contributors {
            Some(required) if contributors < required => Some(Rejection::TooFewContributors {
                contributors,
                required,
            }),
            _ => None,
        }
    }

    /// One-line description for the output header
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(stars) = self.stars_above {
            parts.push(format!("stars > {stars}"));
        }
        if let Some(date) = self.created_after {
            parts.push(format!("created after {date}"));
        }
        if let Some(min) = self.min_contributors {
            parts.push(format!("contributors >= {min}"));
        }

        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }
}
