use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GitHub API error: {status} - {body}")]
    Api { status: StatusCode, body: String },

    #[error("GitHub API rate limit still exceeded after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Run interrupted: {0}")]
    Interrupted(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get a sanitized error message safe for logging and for the output file
    /// footer. Filters out potentially sensitive information.
    pub fn log_safe(&self) -> String {
        match self {
            // HTTP errors might contain internal URLs or authentication info
            Error::Http(e) if e.is_timeout() => "GitHub request timed out".to_string(),
            Error::Http(_) => "External HTTP request failed".to_string(),

            Error::Internal(msg) | Error::Config(msg) => {
                if contains_secret_hint(msg) {
                    "Internal error (details redacted)".to_string()
                } else {
                    self.to_string()
                }
            }

            // Response bodies can be long HTML pages, keep the status only
            Error::Api { status, .. } => format!("GitHub API error: {status}"),

            Error::InvalidUrl(_) => "Invalid URL provided".to_string(),
            Error::Io(_) => "File system operation failed".to_string(),

            Error::Interrupted(msg) => msg.clone(),
            Error::RateLimitExhausted { .. } | Error::Validation(_) => self.to_string(),
        }
    }
}

fn contains_secret_hint(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    lower.contains("password")
        || lower.contains("secret")
        || lower.contains("token")
        || lower.contains("key")
}
