//! Driftnet: a crawl session engine for infinite-scroll social feeds
//!
//! This crate implements the stateful loop that drives a headless-browser
//! capability through infinite-scroll pagination on an authentication-gated
//! platform: classifying transient platform errors, rotating a pool of
//! session credentials, deciding when a feed is genuinely exhausted, and
//! deduplicating records across overlapping page fetches.
//!
//! The browser itself is an external collaborator supplied by the caller
//! through the [`page::PageDriver`] trait; the engine only sequences it.

pub mod client;
pub mod config;
pub mod crawler;
pub mod credentials;
pub mod page;
pub mod records;
pub mod sink;
pub mod state;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only genuinely fatal conditions surface here; rate limits, blocked
/// credentials and transient timeouts are handled inside the session loop
/// and never reach the caller.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid session credential: {0}")]
    InvalidCredential(String),

    #[error("Invalid crawl options: {0}")]
    InvalidOptions(String),

    #[error("Content failed to render after {attempts} attempts")]
    RenderTimeout { attempts: u32 },

    #[error("Search submission failed after credential rotation: {0}")]
    SearchFailed(String),

    #[error("Unclassified error during pagination: {0}")]
    Unclassified(String),

    #[error("Page driver error: {0}")]
    Driver(#[from] anyhow::Error),

    #[error("Invalid target URL: {0}")]
    InvalidTarget(#[from] url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read profile file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::{CrawlOptions, FeedCrawler, RepliesRequest, SearchTab, ThreadRef};
pub use config::{Profile, ProfileKind};
pub use credentials::CredentialPool;
pub use page::{ExtractionContext, PageDriver};
pub use records::{BatchOutcome, BatchResult, RawRecord, Reply};
pub use sink::{ProgressSink, TracingSink};
pub use state::StopReason;
