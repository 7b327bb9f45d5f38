//! Public operation surface
//!
//! [`FeedCrawler`] is the entry point callers construct once per set of
//! credentials. Each operation borrows a [`PageDriver`] for the duration
//! of the call - how that capability is built (automation library,
//! stealth plugins) is entirely the caller's concern - and releases it
//! before returning, success or failure.

use crate::config::{self, Profile, ProfileKind};
use crate::crawler::replies::{
    harvest_replies, harvest_replies_batch, wait_for_thread_rendered,
};
use crate::crawler::session::{run_session, SearchPhase, SessionParams};
use crate::crawler::{classify, metrics, query};
use crate::credentials::CredentialPool;
use crate::page::PageDriver;
use crate::records::{BatchOutcome, RawRecord, Reply};
use crate::sink::ProgressSink;
use crate::{CrawlError, Result};
use chrono::{DateTime, TimeZone, Utc};
use url::Url;

pub use crate::crawler::replies::ThreadRef;

/// Landing page for relevance-ranked search results
const SEARCH_URL_TOP: &str = "https://x.com/search?q=&src=typed_query";

/// Landing page for most-recent search results
const SEARCH_URL_LATEST: &str = "https://x.com/search?q=&src=typed_query&f=live";

/// Which search result tab pagination runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchTab {
    /// Most recent results first
    #[default]
    Latest,

    /// Relevance-ranked results
    Top,
}

impl SearchTab {
    fn landing_url(&self) -> &'static str {
        match self {
            Self::Latest => SEARCH_URL_LATEST,
            Self::Top => SEARCH_URL_TOP,
        }
    }
}

/// Options for a crawl-by-target invocation
///
/// At least one of `search_keywords`, `search_usernames` or `thread_url`
/// must be provided.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Free-text search keywords
    pub search_keywords: Option<String>,

    /// Author handles to restrict the search to (`from:` union)
    pub search_usernames: Vec<String>,

    /// Explicit thread URL to paginate instead of a search
    pub thread_url: Option<String>,

    /// Records to collect; -1 means unlimited
    pub target_count: i64,

    /// Lower date bound, `yyyy-mm-dd` or `dd-mm-yyyy`
    pub search_from_date: Option<String>,

    /// Upper date bound, `yyyy-mm-dd` or `dd-mm-yyyy`
    pub search_to_date: Option<String>,

    /// Search result tab to paginate
    pub search_tab: SearchTab,

    /// Per-call override of the profile's short pacing delay (seconds)
    pub per_record_delay_secs: Option<f64>,

    /// Per-call override of the profile's per-100-records delay (seconds)
    pub per_hundred_delay_secs: Option<f64>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            search_keywords: None,
            search_usernames: vec![],
            thread_url: None,
            target_count: 10,
            search_from_date: None,
            search_to_date: None,
            search_tab: SearchTab::default(),
            per_record_delay_secs: None,
            per_hundred_delay_secs: None,
        }
    }
}

/// Request for a single-thread reply harvest
#[derive(Debug, Clone)]
pub struct RepliesRequest {
    /// URL of the thread page
    pub thread_url: String,

    /// Caller-side identifier carried into the returned replies
    pub external_id: Option<i64>,

    /// Replies to collect; -1 means unlimited
    pub max_replies: i64,
}

/// Crawl engine facade holding credentials and the run profile
///
/// Construction is cheap; every operation builds its own credential pool
/// and session state, so two invocations with separate drivers can run
/// concurrently from clones of the same `FeedCrawler`.
#[derive(Debug, Clone)]
pub struct FeedCrawler {
    primary: String,
    extras: Vec<String>,
    profile: Profile,
}

impl FeedCrawler {
    /// Creates a crawler with a named run profile
    ///
    /// # Arguments
    ///
    /// * `primary` - the credential sessions start under
    /// * `extras` - additional credentials available for rotation
    /// * `kind` - which preset profile to run with
    pub fn new(primary: impl Into<String>, extras: Vec<String>, kind: ProfileKind) -> Result<Self> {
        Self::with_profile(primary, extras, kind.profile())
    }

    /// Creates a crawler with a custom (e.g. file-loaded) profile
    pub fn with_profile(
        primary: impl Into<String>,
        extras: Vec<String>,
        profile: Profile,
    ) -> Result<Self> {
        let primary = primary.into();
        if primary.is_empty() {
            return Err(CrawlError::InvalidCredential(
                "a primary credential is required".to_string(),
            ));
        }
        config::validate(&profile)?;

        Ok(Self {
            primary,
            extras,
            profile,
        })
    }

    /// The profile this crawler runs with
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Crawls records for a search or an explicit thread
    ///
    /// Returns the deduplicated records collected before the session
    /// terminated; deadline and retry-budget exits return partial results
    /// rather than failing.
    pub async fn crawl<D, S>(
        &self,
        driver: &D,
        options: &CrawlOptions,
        sink: &S,
    ) -> Result<Vec<RawRecord>>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let result = self.crawl_inner(driver, options, sink).await;
        close_driver(driver).await;
        result
    }

    async fn crawl_inner<D, S>(
        &self,
        driver: &D,
        options: &CrawlOptions,
        sink: &S,
    ) -> Result<Vec<RawRecord>>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let search_mode = options
            .search_keywords
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
            || !options.search_usernames.is_empty();
        let detail_mode = options.thread_url.is_some();

        if !search_mode && !detail_mode {
            return Err(CrawlError::InvalidOptions(
                "provide search keywords, usernames, or a thread URL".to_string(),
            ));
        }

        let mut profile = self.profile.clone();
        if let Some(secs) = options.per_record_delay_secs {
            profile.pacing.per_record_secs = secs;
        }
        if let Some(secs) = options.per_hundred_delay_secs {
            profile.pacing.per_hundred_secs = secs;
        }

        let mut pool = self.build_pool(&profile);

        driver.inject_session_credential(&self.primary).await?;

        let page_url = match &options.thread_url {
            Some(url) => {
                Url::parse(url)?;
                url.clone()
            }
            None => options.search_tab.landing_url().to_string(),
        };
        driver
            .navigate(&page_url, profile.render.load_timeout())
            .await?;

        // A login wall right after navigation means the credential never
        // produced an authenticated session - fatal at startup
        for phrase in classify::LOGIN_WALL_MARKERS {
            if driver.text_present(phrase).await? {
                return Err(CrawlError::InvalidCredential(format!(
                    "login wall detected: \"{}\"",
                    phrase
                )));
            }
        }

        let from_date = parse_bound(options.search_from_date.as_deref());
        let to_date = parse_bound(options.search_to_date.as_deref());

        let search = search_mode.then(|| SearchPhase {
            query: query::build_search_query(
                options.search_keywords.as_deref(),
                &options.search_usernames,
                from_date,
                to_date,
            ),
            page_url: page_url.clone(),
        });

        let unlimited = options.target_count == -1;
        let params = SessionParams {
            target_count: options.target_count,
            lower_bound: from_date.map(start_of_day),
            limits: profile.limits.resolve(unlimited),
            search,
        };

        let outcome = run_session(driver, &mut pool, &profile, &params, sink).await?;
        Ok(outcome.records)
    }

    /// Harvests the replies of one thread
    pub async fn crawl_replies<D, S>(
        &self,
        driver: &D,
        request: &RepliesRequest,
        sink: &S,
    ) -> Result<Vec<Reply>>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let result = self.crawl_replies_inner(driver, request, sink).await;
        close_driver(driver).await;
        result
    }

    async fn crawl_replies_inner<D, S>(
        &self,
        driver: &D,
        request: &RepliesRequest,
        sink: &S,
    ) -> Result<Vec<Reply>>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        Url::parse(&request.thread_url)?;

        sink.on_log(&format!("Starting reply harvest: {}", request.thread_url));

        driver.inject_session_credential(&self.primary).await?;
        driver
            .navigate(&request.thread_url, self.profile.render.load_timeout())
            .await?;
        wait_for_thread_rendered(driver, &self.profile, sink).await?;

        harvest_replies(
            driver,
            &request.thread_url,
            request.external_id,
            request.max_replies,
            &self.profile,
            sink,
        )
        .await
    }

    /// Harvests replies for many threads in one browser session
    ///
    /// A failure on one thread never aborts the rest; it is recorded in
    /// that thread's [`crate::records::BatchResult`] instead.
    pub async fn crawl_replies_batch<D, S>(
        &self,
        driver: &D,
        threads: &[ThreadRef],
        max_replies: i64,
        sink: &S,
    ) -> Result<BatchOutcome>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let result = self.batch_inner(driver, threads, max_replies, sink).await;
        close_driver(driver).await;
        result
    }

    async fn batch_inner<D, S>(
        &self,
        driver: &D,
        threads: &[ThreadRef],
        max_replies: i64,
        sink: &S,
    ) -> Result<BatchOutcome>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        sink.on_log(&format!(
            "Starting reply harvest for {} threads",
            threads.len()
        ));

        driver.inject_session_credential(&self.primary).await?;

        Ok(harvest_replies_batch(driver, threads, max_replies, &self.profile, sink).await)
    }

    /// Reads one record's current metrics from its page
    pub async fn fetch_record_metrics<D, S>(
        &self,
        driver: &D,
        record_url: &str,
        sink: &S,
    ) -> Result<Option<RawRecord>>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        let result = self.metrics_inner(driver, record_url, sink).await;
        close_driver(driver).await;
        result
    }

    async fn metrics_inner<D, S>(
        &self,
        driver: &D,
        record_url: &str,
        sink: &S,
    ) -> Result<Option<RawRecord>>
    where
        D: PageDriver + ?Sized,
        S: ProgressSink + ?Sized,
    {
        Url::parse(record_url)?;

        driver.inject_session_credential(&self.primary).await?;
        driver
            .navigate(record_url, self.profile.render.load_timeout())
            .await?;
        wait_for_thread_rendered(driver, &self.profile, sink).await?;

        metrics::probe_record(driver, record_url, &self.profile, sink).await
    }

    fn build_pool(&self, profile: &Profile) -> CredentialPool {
        CredentialPool::new(
            &self.primary,
            &self.extras,
            profile.rotation.cooldown(),
            profile.rotation.settle(),
        )
    }
}

/// Parses a caller-supplied date bound, warning when it is unusable
fn parse_bound(text: Option<&str>) -> Option<chrono::NaiveDate> {
    let text = text?;
    let parsed = query::parse_date_bound(text);
    if parsed.is_none() {
        tracing::warn!("Ignoring unparseable date bound: {:?}", text);
    }
    parsed
}

fn start_of_day(date: chrono::NaiveDate) -> DateTime<Utc> {
    match date.and_hms_opt(0, 0, 0) {
        Some(naive) => Utc.from_utc_datetime(&naive),
        None => Utc::now(),
    }
}

/// Releases the driver, logging rather than masking a close failure
async fn close_driver<D>(driver: &D)
where
    D: PageDriver + ?Sized,
{
    if let Err(e) = driver.close().await {
        tracing::warn!("Failed to close page driver: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_primary_credential() {
        let result = FeedCrawler::new("", vec![], ProfileKind::Default);
        assert!(matches!(result, Err(CrawlError::InvalidCredential(_))));
    }

    #[test]
    fn test_new_with_valid_credential() {
        let crawler =
            FeedCrawler::new("session-secret", vec!["other".to_string()], ProfileKind::Default);
        assert!(crawler.is_ok());
    }

    #[test]
    fn test_with_profile_rejects_invalid_profile() {
        let mut profile = ProfileKind::Default.profile();
        profile.rotation.record_threshold = 0;

        let result = FeedCrawler::with_profile("secret", vec![], profile);
        assert!(matches!(result, Err(CrawlError::Config(_))));
    }

    #[test]
    fn test_default_options() {
        let options = CrawlOptions::default();
        assert_eq!(options.target_count, 10);
        assert_eq!(options.search_tab, SearchTab::Latest);
        assert!(options.search_keywords.is_none());
    }

    #[test]
    fn test_search_tab_landing_urls() {
        assert!(SearchTab::Latest.landing_url().contains("f=live"));
        assert!(!SearchTab::Top.landing_url().contains("f=live"));
    }
}
