use std::time::Duration;
use tokio::time::Instant;

/// Ephemeral counters scoped to one pagination loop execution
///
/// All fields reset at loop entry and are mutated only by the loop itself;
/// nothing here is persisted. Two timeout tallies are tracked
/// independently: `timeout_count` is the raw consecutive-miss counter that
/// triggers a jostle scroll when it overruns, and `reach_timeout` counts
/// those escalations; the loop keeps running while either budget remains.
#[derive(Debug)]
pub struct SessionState {
    /// Consecutive response waits that came back empty since the last
    /// response or jostle
    pub timeout_count: u32,

    /// Number of jostle-scroll escalations performed
    pub reach_timeout: u32,

    /// Consecutive response timeouts since the last successful response
    /// (feeds the height-stagnation gate in the end detector)
    pub consecutive_timeouts: u32,

    /// Consecutive fetch cycles that produced no new records
    pub empty_fetches: u32,

    /// Consecutive height checks that saw no scroll-height growth
    pub same_height_count: u32,

    /// Page scroll height at the previous height check
    pub last_height: u64,

    /// Collected-record count at the previous stagnation check
    pub last_record_count: usize,

    /// Records collected under the current credential (drives scheduled
    /// rotation)
    pub records_with_credential: usize,

    /// Consecutive rate-limit classifications being backed off
    pub rate_limit_retries: u32,

    /// Records processed since the last pacing delay
    pub pacing_accumulator: usize,

    /// When the loop started (deadline checks compare against this)
    pub started: Instant,
}

impl SessionState {
    /// Creates a fresh counter block with the clock started now
    pub fn new() -> Self {
        Self {
            timeout_count: 0,
            reach_timeout: 0,
            consecutive_timeouts: 0,
            empty_fetches: 0,
            same_height_count: 0,
            last_height: 0,
            last_record_count: 0,
            records_with_credential: 0,
            rate_limit_retries: 0,
            pacing_accumulator: 0,
            started: Instant::now(),
        }
    }

    /// Time elapsed since loop entry
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Records that a paginated response arrived, clearing the timeout
    /// tallies
    pub fn note_response(&mut self) {
        self.timeout_count = 0;
        self.consecutive_timeouts = 0;
    }

    /// Records a response-wait timeout
    pub fn note_timeout(&mut self) {
        self.timeout_count += 1;
        self.consecutive_timeouts += 1;
    }

    /// Records a jostle-scroll escalation, resetting the raw timeout
    /// counter so the loop gets a fresh budget
    pub fn note_jostle(&mut self) {
        self.reach_timeout += 1;
        self.timeout_count = 0;
    }

    /// Updates the no-new-records stagnation counter from the current
    /// collected count
    pub fn update_stagnation(&mut self, collected: usize) {
        if collected == self.last_record_count {
            self.empty_fetches += 1;
        } else {
            self.empty_fetches = 0;
            self.last_record_count = collected;
        }
    }

    /// Updates the same-height stagnation counter from the current page
    /// height
    pub fn update_height(&mut self, height: u64) {
        if height == self.last_height {
            self.same_height_count += 1;
        } else {
            self.last_height = height;
            self.same_height_count = 0;
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
