//! End-of-pagination detection
//!
//! Infinite-scroll feeds have no authoritative "done" signal, so the
//! engine decides from several weaker ones, evaluated in order of
//! reliability and stopping at the first that fires. The inputs are a
//! [`PageSnapshot`] gathered from the live page plus the session's own
//! counters, which keeps every signal testable with synthetic state.

use crate::config::EndDetectionConfig;
use crate::records::Collector;
use crate::state::SessionState;
use chrono::{DateTime, Utc};

/// Records already collected before the full-overlap signal is considered
const OVERLAP_MIN_COLLECTED: usize = 10;

/// How many of the most recently collected ids the overlap signal compares
/// the visible ids against
const OVERLAP_WINDOW: usize = 10;

/// Records already collected before the date-boundary signal is considered
const DATE_BOUND_MIN_COLLECTED: usize = 5;

/// Stagnant cycles required before the height signal may be evaluated
const HEIGHT_GATE_MIN_STAGNATION: u32 = 3;

/// Consecutive response timeouts required before the height signal may be
/// evaluated (a merely slow network must not confirm an end)
const HEIGHT_GATE_MIN_TIMEOUTS: u32 = 2;

/// What the session loop read off the live page for one detector pass
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// First end-of-feed phrase found visible on the page, if any
    pub end_marker: Option<String>,

    /// Ids of the records currently visible on the page
    pub visible_ids: Vec<String>,

    /// Current page scroll height
    pub height: u64,
}

/// Decides whether the feed has genuinely exhausted
///
/// Consulted whenever a fetch cycle yields nothing new. Never errors; a
/// `false` simply means "keep scrolling".
///
/// The full-overlap signal deliberately treats "everything currently
/// visible was already collected" as an end even though more content
/// might exist below the fold - the threshold is tuned against the live
/// platform, where repeated visibility without growth means saturation.
pub fn feed_exhausted(
    snapshot: &PageSnapshot,
    collector: &Collector,
    state: &SessionState,
    lower_bound: Option<DateTime<Utc>>,
    config: &EndDetectionConfig,
) -> bool {
    // 1. Explicit end markers rendered by the platform
    if let Some(marker) = &snapshot.end_marker {
        tracing::info!("End of content detected by marker: \"{}\"", marker);
        return true;
    }

    // 2. Full overlap with recently collected ids
    if collector.len() >= OVERLAP_MIN_COLLECTED && !snapshot.visible_ids.is_empty() {
        let recent = collector.last_ids(OVERLAP_WINDOW);
        let all_known = snapshot
            .visible_ids
            .iter()
            .all(|id| recent.contains(&id.as_str()));
        if all_known {
            tracing::info!(
                "End detected: all {} visible records were already collected",
                snapshot.visible_ids.len()
            );
            return true;
        }
    }

    // 3. Scrolled past the requested lower date bound
    if let Some(bound) = lower_bound {
        if collector.len() >= DATE_BOUND_MIN_COLLECTED {
            if let Some(last) = collector.last_timestamp() {
                if last < bound {
                    tracing::info!("End detected: reached records older than {}", bound);
                    return true;
                }
            }
        }
    }

    // 4. Too many consecutive cycles without new records
    if state.empty_fetches >= config.max_empty_fetches {
        tracing::info!(
            "End detected: {} consecutive cycles without new records",
            state.empty_fetches
        );
        return true;
    }

    // 5. Last resort: page height stopped growing. Only meaningful once
    // several other negative indicators have accumulated.
    if state.empty_fetches >= HEIGHT_GATE_MIN_STAGNATION
        && state.consecutive_timeouts >= HEIGHT_GATE_MIN_TIMEOUTS
        && snapshot.height == state.last_height
        && state.same_height_count >= config.max_same_height
    {
        tracing::info!(
            "End detected as last resort: height unchanged after {} checks",
            state.same_height_count
        );
        return true;
    }

    false
}
