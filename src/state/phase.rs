/// Phase definitions for the single-target crawl loop
///
/// The pagination loop runs as an explicit state machine: an optional
/// search-submission phase, the pagination phase, and a terminal phase
/// carrying the reason the loop ended.
use std::fmt;

/// Why a pagination loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested record count was collected
    TargetReached,

    /// The end-of-feed detector confirmed the feed is exhausted
    EndOfContent,

    /// Both timeout counters ran out without the feed producing anything
    TimeoutBudgetExhausted,

    /// The wall-clock execution deadline elapsed
    DeadlineExceeded,

    /// Rate limiting persisted past the recovery timeout; partial results
    /// were returned
    RateLimitAbandoned,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TargetReached => "target count reached",
            Self::EndOfContent => "end of content confirmed",
            Self::TimeoutBudgetExhausted => "timeout budget exhausted",
            Self::DeadlineExceeded => "execution deadline exceeded",
            Self::RateLimitAbandoned => "rate limit recovery timeout",
        };
        write!(f, "{}", text)
    }
}

/// Current phase of the single-target crawl state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Submitting the search query before pagination begins
    Searching,

    /// Driving infinite-scroll pagination
    Paginating,

    /// The loop has ended
    Terminated(StopReason),
}

impl CrawlPhase {
    /// Returns true once the loop has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated(_))
    }

    /// The stop reason, if the loop has ended
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Terminated(reason) => Some(*reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_detection() {
        assert!(!CrawlPhase::Searching.is_terminal());
        assert!(!CrawlPhase::Paginating.is_terminal());
        assert!(CrawlPhase::Terminated(StopReason::TargetReached).is_terminal());
    }

    #[test]
    fn test_stop_reason_extraction() {
        assert_eq!(CrawlPhase::Paginating.stop_reason(), None);
        assert_eq!(
            CrawlPhase::Terminated(StopReason::EndOfContent).stop_reason(),
            Some(StopReason::EndOfContent)
        );
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(
            StopReason::EndOfContent.to_string(),
            "end of content confirmed"
        );
        assert_eq!(
            StopReason::DeadlineExceeded.to_string(),
            "execution deadline exceeded"
        );
    }
}
