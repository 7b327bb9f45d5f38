//! Single-target pagination session
//!
//! This is the main crawl loop: it runs as an explicit state machine
//! (search submission, pagination, terminated) with a single loop-top
//! predicate combining every termination condition, and drives one
//! scroll/wait/classify/extract cycle per iteration:
//! - waiting for the next paginated response within a bounded window
//! - classifying platform errors and rotating or backing off
//! - merging extracted records into the dedup collector
//! - consulting the end-of-feed detector whenever a cycle yields nothing new
//! - scrolling forward at the end of every cycle

use crate::config::{Profile, ResolvedLimits};
use crate::crawler::classify::{self, PlatformError};
use crate::crawler::detector::{feed_exhausted, PageSnapshot};
use crate::credentials::CredentialPool;
use crate::page::{ExtractionContext, PageDriver};
use crate::records::{Collector, RawRecord};
use crate::sink::ProgressSink;
use crate::state::{CrawlPhase, SessionState, StopReason};
use crate::{CrawlError, Result};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::sleep;

/// Consecutive response timeouts before the end detector is consulted
const TIMEOUTS_BEFORE_END_CHECK: u32 = 5;

/// Raw timeout count beyond which an empty response triggers recovery
/// scrolls
const EMPTY_RECOVERY_TIMEOUT_THRESHOLD: u32 = 2;

/// Up-and-down scroll pairs performed during empty-response recovery
const EMPTY_RECOVERY_SCROLLS: u32 = 2;

/// Pacing accumulator level that triggers the long per-100-records delay
const PACING_LONG_THRESHOLD: usize = 100;

/// Pacing accumulator level that triggers the short per-record delay
const PACING_SHORT_THRESHOLD: usize = 20;

/// Parameters for one pagination session
pub struct SessionParams {
    /// Records to collect; -1 means unlimited
    pub target_count: i64,

    /// Lower date bound requested for the crawl, if any
    pub lower_bound: Option<DateTime<Utc>>,

    /// Termination budgets resolved for this search mode
    pub limits: ResolvedLimits,

    /// Search phase to run before pagination, if the target is a search
    pub search: Option<SearchPhase>,
}

/// Search submission performed before pagination begins
pub struct SearchPhase {
    /// The assembled query string
    pub query: String,

    /// URL of the search page, used to recover after a failed submission
    pub page_url: String,
}

/// What a finished pagination session produced
#[derive(Debug)]
pub struct SessionOutcome {
    /// The deduplicated records, in first-collection order
    pub records: Vec<RawRecord>,

    /// Why the loop stopped
    pub reason: StopReason,
}

/// Computes the exponential rate-limit backoff wait
///
/// `min(base * 2^attempt, cap)`: attempt 0 waits the base, each further
/// attempt doubles, clamped at the cap.
pub fn backoff_delay(base: Duration, cap: Duration, attempt: u32) -> Duration {
    let factor = 1u128 << attempt.min(32);
    let wait = base.as_millis().saturating_mul(factor);
    Duration::from_millis(wait.min(cap.as_millis()) as u64)
}

/// Runs one pagination session against an already-navigated page
///
/// The driver must be authenticated and sitting on the target page (search
/// landing page or thread). Recoverable platform errors are fully handled
/// here; only invalid-search and unclassified failures surface as errors,
/// and every budget-driven exit returns the partial collection instead.
pub async fn run_session<D, S>(
    driver: &D,
    pool: &mut CredentialPool,
    profile: &Profile,
    params: &SessionParams,
    sink: &S,
) -> Result<SessionOutcome>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    let mut state = SessionState::new();
    let mut collector = Collector::new();
    let mut phase = if params.search.is_some() {
        CrawlPhase::Searching
    } else {
        CrawlPhase::Paginating
    };

    let reason = loop {
        match phase {
            CrawlPhase::Searching => {
                if let Some(search) = &params.search {
                    submit_search(driver, pool, profile, search, sink).await?;
                }
                phase = CrawlPhase::Paginating;
            }
            CrawlPhase::Paginating => {
                if let Some(reason) = loop_top_stop(&state, collector.len(), params) {
                    phase = CrawlPhase::Terminated(reason);
                    continue;
                }

                let outcome =
                    pagination_cycle(driver, pool, profile, params, sink, &mut state, &mut collector)
                        .await?;
                if let Some(reason) = outcome {
                    phase = CrawlPhase::Terminated(reason);
                }
            }
            CrawlPhase::Terminated(reason) => break reason,
        }
    };

    sink.on_log(&format!(
        "Collection loop finished ({}): {} records",
        reason,
        collector.len()
    ));

    Ok(SessionOutcome {
        records: collector.materialize(),
        reason,
    })
}

/// The single loop-top predicate combining every termination condition
fn loop_top_stop(
    state: &SessionState,
    collected: usize,
    params: &SessionParams,
) -> Option<StopReason> {
    if params.target_count >= 0 && collected >= params.target_count as usize {
        return Some(StopReason::TargetReached);
    }

    if state.timeout_count >= params.limits.timeout_limit
        && state.reach_timeout >= params.limits.reach_timeout_max
    {
        return Some(StopReason::TimeoutBudgetExhausted);
    }

    if state.elapsed() >= params.limits.max_execution {
        return Some(StopReason::DeadlineExceeded);
    }

    None
}

/// One scroll/wait/classify/extract cycle
async fn pagination_cycle<D, S>(
    driver: &D,
    pool: &mut CredentialPool,
    profile: &Profile,
    params: &SessionParams,
    sink: &S,
    state: &mut SessionState,
    collector: &mut Collector,
) -> Result<Option<StopReason>>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    let limits = params.limits;

    // The raw timeout counter overran but escalations remain: jostle the
    // feed by scrolling to the top and back down, then start a fresh budget
    if state.timeout_count > limits.timeout_limit && state.reach_timeout < limits.reach_timeout_max
    {
        state.note_jostle();
        driver.scroll_to_top().await?;
        sleep(profile.scroll.stabilization() / 2).await;
        driver.scroll_forward().await?;
    }

    match driver
        .wait_for_next_page_response(profile.scroll.response_wait())
        .await
    {
        Ok(Some(body)) => {
            state.note_response();

            if let Some(error) = classify::classify_response(&body) {
                if let Some(reason) =
                    handle_platform_error(driver, pool, profile, sink, state, error).await
                {
                    return Ok(Some(reason));
                }
            } else {
                state.rate_limit_retries = 0;
                let outcome =
                    process_response(driver, pool, profile, params, sink, state, collector, body)
                        .await?;
                if let Some(reason) = outcome {
                    return Ok(Some(reason));
                }
            }
        }
        Ok(None) => {
            state.note_timeout();

            if state.timeout_count >= TIMEOUTS_BEFORE_END_CHECK {
                let snapshot = gather_snapshot(driver).await?;
                if feed_exhausted(
                    &snapshot,
                    collector,
                    state,
                    params.lower_bound,
                    &profile.end_detection,
                ) {
                    return Ok(Some(StopReason::EndOfContent));
                }
            }
        }
        Err(e) => {
            let message = e.to_string();
            if classify::is_recoverable_message(&message) {
                tracing::warn!("Recoverable failure while waiting for a response: {}", message);
            } else {
                return Err(CrawlError::Unclassified(message));
            }
        }
    }

    // Surface the next batch regardless of the branch taken above
    driver.scroll_forward().await?;

    if state.timeout_count > 0 {
        let snapshot = gather_snapshot(driver).await?;
        if feed_exhausted(
            &snapshot,
            collector,
            state,
            params.lower_bound,
            &profile.end_detection,
        ) {
            return Ok(Some(StopReason::EndOfContent));
        }
    }

    Ok(None)
}

/// Handles a classified platform error: blacklist, rotate, back off
///
/// Returns a stop reason only when the recovery timeout has elapsed and
/// pagination should be abandoned with partial results.
async fn handle_platform_error<D, S>(
    driver: &D,
    pool: &mut CredentialPool,
    profile: &Profile,
    sink: &S,
    state: &mut SessionState,
    error: PlatformError,
) -> Option<StopReason>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    sink.on_log(&format!("Platform error: {}", error));
    pool.blacklist_current(error.reason());

    if pool.rotate(driver, error.reason()).await {
        // Fresh credential: continue without further delay
        state.rate_limit_retries = 0;
        state.records_with_credential = 0;
        return None;
    }

    if state.elapsed() > profile.rate_limit.recovery_timeout() {
        sink.on_log("Maximum retry time reached, returning what was collected");
        return Some(StopReason::RateLimitAbandoned);
    }

    if state.rate_limit_retries >= profile.rate_limit.max_retries {
        let cooldown = profile.rate_limit.base_wait();
        sink.on_log(&format!(
            "Retry budget exhausted, cooling down for {}s",
            cooldown.as_secs()
        ));
        sleep(cooldown).await;
        sleep(profile.scroll.stabilization()).await;
        state.rate_limit_retries = 0;
        state.timeout_count = 0;
        return None;
    }

    let wait = backoff_delay(
        profile.rate_limit.base_wait(),
        profile.rate_limit.max_wait(),
        state.rate_limit_retries,
    );
    state.rate_limit_retries += 1;
    sink.on_log(&format!("Rate limited, waiting {}s", wait.as_secs()));
    sleep(wait).await;

    None
}

/// Extracts and merges the records carried by a healthy response
#[allow(clippy::too_many_arguments)]
async fn process_response<D, S>(
    driver: &D,
    pool: &mut CredentialPool,
    profile: &Profile,
    params: &SessionParams,
    sink: &S,
    state: &mut SessionState,
    collector: &mut Collector,
    body: String,
) -> Result<Option<StopReason>>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    let records = match driver
        .extract_records(&ExtractionContext::PaginatedResponse { body })
        .await
    {
        Ok(records) => records,
        Err(e) => {
            let message = e.to_string();
            if classify::is_recoverable_message(&message) {
                tracing::warn!("Recoverable extraction failure: {}", message);
                return Ok(None);
            }
            return Err(CrawlError::Unclassified(message));
        }
    };

    if records.is_empty() {
        state.update_stagnation(collector.len());

        let snapshot = gather_snapshot(driver).await?;
        state.update_height(snapshot.height);
        if feed_exhausted(
            &snapshot,
            collector,
            state,
            params.lower_bound,
            &profile.end_detection,
        ) {
            return Ok(Some(StopReason::EndOfContent));
        }

        // Empty pages after repeated timeouts sometimes unstick after a
        // couple of up-and-down scroll passes
        if state.timeout_count > EMPTY_RECOVERY_TIMEOUT_THRESHOLD {
            for _ in 0..EMPTY_RECOVERY_SCROLLS {
                driver.scroll_to_top().await?;
                sleep(profile.scroll.stabilization() / 2).await;
                driver.scroll_forward().await?;
                sleep(profile.scroll.stabilization() / 2).await;
            }
        }

        return Ok(None);
    }

    // Merge up to the target; duplicates refresh counters in place
    let mut taken = 0;
    for record in records {
        if params.target_count > 0 && collector.len() >= params.target_count as usize {
            break;
        }
        collector.merge(std::iter::once(record));
        taken += 1;
    }

    state.records_with_credential += taken;
    state.pacing_accumulator += taken;

    sink.on_log(&format!("Total records collected: {}", collector.len()));
    sink.on_progress(collector.len());

    // Scheduled, non-error rotation after enough records on one credential
    if state.records_with_credential >= profile.rotation.record_threshold
        && pool.rotate(driver, "scheduled rotation").await
    {
        state.records_with_credential = 0;
        sleep(profile.scroll.stabilization()).await;
    }

    // Pacing to reduce rate-limit pressure
    if state.pacing_accumulator > PACING_LONG_THRESHOLD {
        state.pacing_accumulator = 0;
        sleep(profile.pacing.per_hundred()).await;
    } else if state.pacing_accumulator > PACING_SHORT_THRESHOLD {
        sleep(profile.pacing.per_record()).await;
    }

    state.update_stagnation(collector.len());
    state.update_height(driver.page_height().await?);

    // A fetch that only repeated known ids counts toward stagnation;
    // consult the detector so a saturated feed terminates the loop
    if state.empty_fetches > 0 {
        let snapshot = gather_snapshot(driver).await?;
        if feed_exhausted(
            &snapshot,
            collector,
            state,
            params.lower_bound,
            &profile.end_detection,
        ) {
            return Ok(Some(StopReason::EndOfContent));
        }
    }

    Ok(None)
}

/// Submits the search query, recovering once through credential rotation
async fn submit_search<D, S>(
    driver: &D,
    pool: &mut CredentialPool,
    profile: &Profile,
    search: &SearchPhase,
    sink: &S,
) -> Result<()>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    sink.on_log(&format!("Submitting search query: {}", search.query));

    let Err(e) = driver.submit_search_query(&search.query).await else {
        return Ok(());
    };

    sink.on_log(&format!("Search submission failed: {}", e));
    pool.blacklist_current("search submission failure");

    if !pool.rotate(driver, "search submission failure").await {
        return Err(CrawlError::SearchFailed(e.to_string()));
    }

    driver
        .navigate(&search.page_url, profile.render.load_timeout())
        .await?;
    sleep(profile.scroll.stabilization()).await;

    driver
        .submit_search_query(&search.query)
        .await
        .map_err(|e| CrawlError::SearchFailed(e.to_string()))
}

/// Reads the page facts the end-of-feed detector evaluates
pub(crate) async fn gather_snapshot<D>(driver: &D) -> Result<PageSnapshot>
where
    D: PageDriver + ?Sized,
{
    let mut end_marker = None;
    for phrase in classify::END_OF_FEED_MARKERS {
        if driver.text_present(phrase).await? {
            end_marker = Some((*phrase).to_string());
            break;
        }
    }

    let visible_ids = driver
        .extract_records(&ExtractionContext::RenderedFeed)
        .await?
        .into_iter()
        .map(|r| r.id)
        .filter(|id| !id.is_empty())
        .collect();

    let height = driver.page_height().await?;

    Ok(PageSnapshot {
        end_marker,
        visible_ids,
        height,
    })
}
