use crate::error::{Error, Result};
use crate::github::SortField;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Saved search: which frameworks and indicator files to look for and how to
/// filter the results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunProfile {
    pub version: u32,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub indicators: Option<Vec<String>>,
    #[serde(default)]
    pub sort: Option<SortField>,
    #[serde(default)]
    pub filters: ProfileFilters,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileFilters {
    #[serde(default)]
    pub stars_above: Option<u32>,
    #[serde(default)]
    pub created_after: Option<NaiveDate>,
    #[serde(default)]
    pub min_contributors: Option<u32>,
    #[serde(default)]
    pub contributor_sample: Option<u32>,
}

impl RunProfile {
    /// Load a run profile from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "Failed to read profile from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let profile: RunProfile = serde_yaml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse profile from {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::Config(format!(
                "Unsupported profile version: {}. Expected version 1",
                self.version
            )));
        }

        let mut seen = HashSet::new();
        for framework in &self.frameworks {
            if framework.trim().is_empty() {
                return Err(Error::Config(
                    "Framework keyword cannot be empty".to_string(),
                ));
            }
            if !seen.insert(framework.to_lowercase()) {
                return Err(Error::Config(format!("Duplicate framework: {framework}")));
            }
        }

        if let Some(indicators) = &self.indicators {
            if indicators.iter().any(|i| i.trim().is_empty()) {
                return Err(Error::Config(
                    "Indicator filename cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}
