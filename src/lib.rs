pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod output;
pub mod runner;
pub mod shutdown;

// Re-exports
pub use config::Settings;
pub use error::{Error, Result};
pub use runner::{RunReport, SearchRunner};
