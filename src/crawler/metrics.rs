//! Single-record metrics probe
//!
//! A degenerate crawl with target count 1 and no dedup: one bounded wait
//! for the authoritative network response, with the rendered page as the
//! fallback when the response never arrives. Never retries beyond that.

use crate::config::Profile;
use crate::page::{ExtractionContext, PageDriver};
use crate::records::RawRecord;
use crate::sink::ProgressSink;
use crate::Result;

/// Reads one record's current metrics from an already-rendered post page
///
/// The intercepted response carries fresher counters than the DOM, so it
/// wins the race when it arrives within the render-check window;
/// otherwise the probe falls back to extracting the rendered page
/// directly. Returns `None` when neither source yields the record.
pub async fn probe_record<D, S>(
    driver: &D,
    record_url: &str,
    profile: &Profile,
    sink: &S,
) -> Result<Option<RawRecord>>
where
    D: PageDriver + ?Sized,
    S: ProgressSink + ?Sized,
{
    if let Some(body) = driver
        .wait_for_next_page_response(profile.render.check_timeout())
        .await?
    {
        let records = driver
            .extract_records(&ExtractionContext::PaginatedResponse { body })
            .await?;
        if let Some(record) = records.into_iter().next() {
            sink.on_log(&format!("Record metrics read from response: {}", record.id));
            return Ok(Some(record));
        }
    }

    // The response lost the race (or carried nothing usable); read the
    // rendered page instead
    let records = driver
        .extract_records(&ExtractionContext::RenderedRecord {
            url: record_url.to_string(),
        })
        .await?;

    match records.into_iter().next() {
        Some(record) => {
            sink.on_log(&format!("Record metrics read from page: {}", record.id));
            Ok(Some(record))
        }
        None => {
            sink.on_log("Could not extract record metrics");
            Ok(None)
        }
    }
}
