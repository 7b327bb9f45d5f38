//! Page automation collaborator contract
//!
//! The engine never talks to a browser directly. Everything it needs from
//! the rendered page - navigation, cookie injection, interception of
//! paginated responses, scrolling, extraction - goes through the
//! [`PageDriver`] trait, supplied by the caller. How an implementation
//! achieves this (which automation library, which evasion plugins, which
//! selectors) is outside the engine's concern; tests drive the engine with
//! scripted in-memory implementations.

use crate::records::RawRecord;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// What the extraction collaborator should read records from
///
/// Extraction rules differ per surface: a paginated network response body,
/// the rendered article list of a thread (where the parent post itself
/// must be skipped), or a single rendered post page.
#[derive(Debug, Clone)]
pub enum ExtractionContext {
    /// Body of an intercepted paginated response; promotional and
    /// non-post entries are the extractor's to filter out
    PaginatedResponse { body: String },

    /// The currently rendered feed (search results or a profile
    /// timeline); extraction yields whatever posts are in view
    RenderedFeed,

    /// The currently rendered thread page; records other than the post
    /// at `parent_url` are replies
    RenderedThread { parent_url: String },

    /// A single rendered post page; extraction yields the post at `url`
    RenderedRecord { url: String },
}

/// Driver for one authenticated browser page
///
/// Implementations are expected to be used from a single crawl invocation
/// at a time; the engine issues calls strictly sequentially. All failures
/// surface as `anyhow::Error` - the engine classifies the message text to
/// decide whether a failure is a recoverable platform error or fatal.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates the page to `url`, waiting at most `timeout` for the
    /// document to load
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Stores the given session credential in the browser context
    /// (typically by re-injecting the session cookie)
    async fn inject_session_credential(&self, value: &str) -> Result<()>;

    /// Waits for the next paginated network response, or `None` if none
    /// arrives within `timeout`
    async fn wait_for_next_page_response(&self, timeout: Duration) -> Result<Option<String>>;

    /// Scrolls the feed forward to surface the next batch of content
    async fn scroll_forward(&self) -> Result<()>;

    /// Scrolls back to the top of the page
    async fn scroll_to_top(&self) -> Result<()>;

    /// Runs the extraction rules for the given context and returns the
    /// records currently obtainable from it
    async fn extract_records(&self, ctx: &ExtractionContext) -> Result<Vec<RawRecord>>;

    /// Waits up to `timeout` for post content to be rendered on the page;
    /// returns false on timeout
    async fn wait_for_content_rendered(&self, timeout: Duration) -> Result<bool>;

    /// Current scroll height of the page
    async fn page_height(&self) -> Result<u64>;

    /// Whether the given phrase is currently visible on the page
    async fn text_present(&self, phrase: &str) -> Result<bool>;

    /// Types the query into the platform's search box and submits it
    async fn submit_search_query(&self, query: &str) -> Result<()>;

    /// Releases the underlying browser resources
    async fn close(&self) -> Result<()>;
}
