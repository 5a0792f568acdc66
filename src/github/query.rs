use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields GitHub can order repository search results by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Stars,
    Updated,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Stars => "stars",
            SortField::Updated => "updated",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stars" => Ok(SortField::Stars),
            "updated" => Ok(SortField::Updated),
            other => Err(format!(
                "unknown sort field '{other}', expected stars or updated"
            )),
        }
    }
}

/// One repository search, rendered into GitHub's `q` parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub framework: String,
    pub indicator: Option<String>,
    pub stars_above: Option<u32>,
    pub created_after: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn new(framework: impl Into<String>) -> Self {
        Self {
            framework: framework.into(),
            indicator: None,
            stars_above: None,
            created_after: None,
        }
    }

    pub fn with_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.indicator = Some(indicator.into());
        self
    }

    pub fn with_stars_above(mut self, stars: Option<u32>) -> Self {
        self.stars_above = stars;
        self
    }

    pub fn with_created_after(mut self, date: Option<NaiveDate>) -> Self {
        self.created_after = date;
        self
    }

    /// Render the `q` parameter
    pub fn to_query_string(&self) -> String {
        let mut q = self.framework.clone();

        if let Some(indicator) = &self.indicator {
            q.push_str(" in:readme,description");
            q.push_str(&format!(" filename:{indicator}"));
        }

        if let Some(stars) = self.stars_above {
            q.push_str(&format!(" stars:>{stars}"));
        }

        if let Some(date) = self.created_after {
            q.push_str(&format!(" created:>{}", date.format("%Y-%m-%d")));
        }

        q
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}
