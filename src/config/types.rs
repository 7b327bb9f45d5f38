use serde::Deserialize;
use std::time::Duration;

/// Run profile parameterizing one crawl engine instance
///
/// Selecting a profile is a pure configuration lookup (see
/// [`super::ProfileKind`]); nothing in here is consulted globally or
/// mutated at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub rotation: RotationConfig,
    pub limits: LimitsConfig,
    pub pacing: PacingConfig,
    #[serde(rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    pub scroll: ScrollConfig,
    pub render: RenderConfig,
    #[serde(rename = "end-detection")]
    pub end_detection: EndDetectionConfig,
}

impl Default for Profile {
    fn default() -> Self {
        super::ProfileKind::Default.profile()
    }
}

/// Credential rotation behavior
#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    /// Records collected on one credential before a scheduled rotation
    #[serde(rename = "record-threshold")]
    pub record_threshold: usize,

    /// How long a blacklisted credential stays excluded (milliseconds)
    #[serde(rename = "cooldown-ms")]
    pub cooldown_ms: u64,

    /// Pause after a successful credential injection (milliseconds)
    #[serde(rename = "settle-ms")]
    pub settle_ms: u64,
}

impl RotationConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// A limit that differs between unlimited (-1) and bounded target counts
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SearchSplit {
    pub unlimited: u64,
    pub limited: u64,
}

impl SearchSplit {
    /// Picks the value for the current search mode
    pub fn pick(&self, unlimited_search: bool) -> u64 {
        if unlimited_search {
            self.unlimited
        } else {
            self.limited
        }
    }
}

/// Loop termination budgets
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Consecutive response-wait timeouts tolerated before a jostle scroll
    #[serde(rename = "timeout-limit")]
    pub timeout_limit: SearchSplit,

    /// Jostle-scroll escalations tolerated before giving up
    #[serde(rename = "reach-timeout-max")]
    pub reach_timeout_max: SearchSplit,

    /// Wall-clock execution deadline (milliseconds)
    #[serde(rename = "max-execution-ms")]
    pub max_execution_ms: SearchSplit,
}

/// Limits resolved for one concrete crawl invocation
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLimits {
    pub timeout_limit: u32,
    pub reach_timeout_max: u32,
    pub max_execution: Duration,
}

impl LimitsConfig {
    /// Resolves the unlimited/limited split for the given search mode
    pub fn resolve(&self, unlimited_search: bool) -> ResolvedLimits {
        ResolvedLimits {
            timeout_limit: self.timeout_limit.pick(unlimited_search) as u32,
            reach_timeout_max: self.reach_timeout_max.pick(unlimited_search) as u32,
            max_execution: Duration::from_millis(self.max_execution_ms.pick(unlimited_search)),
        }
    }
}

/// Pacing delays applied while merging collected records
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Delay applied per fetch cycle once a burst exceeds 20 records
    /// (seconds; fractional values allowed)
    #[serde(rename = "per-record-secs")]
    pub per_record_secs: f64,

    /// Longer delay applied after every ~100 records (seconds)
    #[serde(rename = "per-hundred-secs")]
    pub per_hundred_secs: f64,
}

impl PacingConfig {
    pub fn per_record(&self) -> Duration {
        Duration::from_secs_f64(self.per_record_secs)
    }

    pub fn per_hundred(&self) -> Duration {
        Duration::from_secs_f64(self.per_hundred_secs)
    }
}

/// Rate-limit retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Backoff attempts before falling back to a flat cooldown
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base wait for the exponential backoff (milliseconds)
    #[serde(rename = "base-wait-ms")]
    pub base_wait_ms: u64,

    /// Cap for the exponential backoff (milliseconds)
    #[serde(rename = "max-wait-ms")]
    pub max_wait_ms: u64,

    /// Total time spent rate limited before pagination is abandoned
    /// (milliseconds)
    #[serde(rename = "recovery-timeout-ms")]
    pub recovery_timeout_ms: u64,
}

impl RateLimitConfig {
    pub fn base_wait(&self) -> Duration {
        Duration::from_millis(self.base_wait_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }
}

/// Scroll-and-wait cycle timing
#[derive(Debug, Clone, Deserialize)]
pub struct ScrollConfig {
    /// How long each cycle waits for a paginated response (milliseconds)
    #[serde(rename = "response-wait-ms")]
    pub response_wait_ms: u64,

    /// Settle delay after scroll disruptions such as a jostle
    /// (milliseconds)
    #[serde(rename = "stabilization-ms")]
    pub stabilization_ms: u64,
}

impl ScrollConfig {
    pub fn response_wait(&self) -> Duration {
        Duration::from_millis(self.response_wait_ms)
    }

    pub fn stabilization(&self) -> Duration {
        Duration::from_millis(self.stabilization_ms)
    }
}

/// Content render detection for thread pages
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Navigation timeout (milliseconds)
    #[serde(rename = "load-timeout-ms")]
    pub load_timeout_ms: u64,

    /// Per-attempt wait for content to appear (milliseconds)
    #[serde(rename = "check-timeout-ms")]
    pub check_timeout_ms: u64,

    /// Delay between detection attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Detection attempts before the target is declared unrenderable
    pub attempts: u32,
}

impl RenderConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// End-of-feed detection thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct EndDetectionConfig {
    /// Consecutive no-new-record cycles that confirm exhaustion
    #[serde(rename = "max-empty-fetches")]
    pub max_empty_fetches: u32,

    /// Consecutive unchanged-height checks for the last-resort signal
    #[serde(rename = "max-same-height")]
    pub max_same_height: u32,

    /// Stagnant cycles that end a reply-harvesting loop
    #[serde(rename = "reply-stagnation-limit")]
    pub reply_stagnation_limit: u32,

    /// Delay between reply-harvesting scroll cycles (milliseconds)
    #[serde(rename = "reply-scroll-delay-ms")]
    pub reply_scroll_delay_ms: u64,
}

impl EndDetectionConfig {
    pub fn reply_scroll_delay(&self) -> Duration {
        Duration::from_millis(self.reply_scroll_delay_ms)
    }
}
