//! Reply harvesting
//!
//! Replies live on a single thread page, so pagination here is simpler
//! than the search loop: no search markers apply, and termination is
//! purely by reply cap or stagnation. The batch orchestrator runs the
//! same loop across many threads in one authenticated session, recording
//! per-thread outcomes without ever letting one failure abort the rest.

use crate::config::Profile;
use crate::page::{ExtractionContext, PageDriver};
use crate::records::{content_hash, BatchOutcome, BatchResult, Collector, Reply};
use crate::sink::ProgressSink;
use crate::{CrawlError, Result};
use tokio::time::sleep;

/// A thread whose replies should be harvested
#[derive(Debug, Clone)]
pub struct ThreadRef {
    /// Caller-side identifier carried through to the batch result
    pub id: i64,

    /// URL of the thread page
    pub url: String,

    /// Author handle, used only for logging
    pub handle: String,
}

/// Waits for thread content to render, nudging the page between attempts
///
/// Some loads stall until a small scroll forces the feed to hydrate, so
/// each failed attempt scrolls forward slightly before retrying. Runs the
/// profile's configured number of attempts, then gives up with
/// [`CrawlError::RenderTimeout`].
pub async fn wait_for_thread_rendered<D, S>(driver: &D, profile: &Profile, sink: &S) -> Result<()>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    let attempts = profile.render.attempts;

    for attempt in 1..=attempts {
        if driver
            .wait_for_content_rendered(profile.render.check_timeout())
            .await?
        {
            sink.on_log("Thread content rendered");
            return Ok(());
        }

        sink.on_log(&format!(
            "Attempt {}/{}: no content rendered yet, nudging the page",
            attempt, attempts
        ));
        sleep(profile.render.retry_delay()).await;
        driver.scroll_forward().await?;
        sleep(profile.render.retry_delay() / 2).await;
    }

    Err(CrawlError::RenderTimeout { attempts })
}

/// Harvests the replies of one already-rendered thread
///
/// Each cycle re-extracts whatever replies are visible, merges them by
/// id, and scrolls forward. The loop ends when the reply cap is reached
/// (-1 means unlimited) or after the configured number of cycles without
/// a new reply.
pub async fn harvest_replies<D, S>(
    driver: &D,
    parent_url: &str,
    parent_id: Option<i64>,
    max_replies: i64,
    profile: &Profile,
    sink: &S,
) -> Result<Vec<Reply>>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    let stagnation_limit = profile.end_detection.reply_stagnation_limit;
    let context = ExtractionContext::RenderedThread {
        parent_url: parent_url.to_string(),
    };

    let mut collector = Collector::new();
    let mut stagnant_cycles = 0u32;
    let mut last_count = 0usize;

    loop {
        let visible = driver.extract_records(&context).await?;
        collector.merge(visible);

        let count = collector.len();
        sink.on_log(&format!("Replies collected: {}", count));
        sink.on_progress(count);

        if max_replies > 0 && count >= max_replies as usize {
            sink.on_log(&format!("Reply limit reached: {}", count));
            break;
        }

        if count == last_count {
            stagnant_cycles += 1;
            sink.on_log(&format!(
                "No new replies ({}/{})",
                stagnant_cycles, stagnation_limit
            ));

            if stagnant_cycles >= stagnation_limit {
                sink.on_log("No more replies found, finishing");
                break;
            }
        } else {
            stagnant_cycles = 0;
        }
        last_count = count;

        driver.scroll_forward().await?;
        sleep(profile.end_detection.reply_scroll_delay()).await;
    }

    let replies = collector
        .materialize()
        .into_iter()
        .map(|record| {
            let content_hash = content_hash(&record);
            Reply {
                record,
                parent_url: parent_url.to_string(),
                parent_id,
                content_hash,
            }
        })
        .collect();

    Ok(replies)
}

/// Harvests replies for many threads in one authenticated session
///
/// Navigation, render detection and harvesting run per thread; any error
/// on one thread is downgraded to a recorded failure and the batch moves
/// on. The returned outcome keeps the input order.
pub async fn harvest_replies_batch<D, S>(
    driver: &D,
    threads: &[ThreadRef],
    max_replies: i64,
    profile: &Profile,
    sink: &S,
) -> BatchOutcome
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    let mut results = Vec::with_capacity(threads.len());

    for (index, thread) in threads.iter().enumerate() {
        sink.on_log(&format!(
            "Processing thread {}/{}: {}",
            index + 1,
            threads.len(),
            thread.handle
        ));

        match harvest_one(driver, thread, max_replies, profile, sink).await {
            Ok(replies) => {
                sink.on_log(&format!(
                    "Thread {} finished with {} replies",
                    thread.id,
                    replies.len()
                ));
                results.push(BatchResult {
                    thread_id: thread.id,
                    reply_count: replies.len(),
                    replies,
                    success: true,
                    error: None,
                });
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!("Error processing thread {}: {}", thread.id, message);
                sink.on_log(&format!("Error processing thread {}: {}", thread.id, message));
                results.push(BatchResult {
                    thread_id: thread.id,
                    reply_count: 0,
                    replies: vec![],
                    success: false,
                    error: Some(message),
                });
            }
        }
    }

    let outcome = BatchOutcome::from_results(results);
    sink.on_log(&format!(
        "Batch finished: {} succeeded, {} failed",
        outcome.succeeded, outcome.failed
    ));
    outcome
}

/// Navigate + render-check + harvest for a single batch entry
async fn harvest_one<D, S>(
    driver: &D,
    thread: &ThreadRef,
    max_replies: i64,
    profile: &Profile,
    sink: &S,
) -> Result<Vec<Reply>>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    driver
        .navigate(&thread.url, profile.render.load_timeout())
        .await?;
    wait_for_thread_rendered(driver, profile, sink).await?;
    harvest_replies(driver, &thread.url, Some(thread.id), max_replies, profile, sink).await
}
