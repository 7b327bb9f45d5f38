use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One collected post, normalized by the extraction collaborator
///
/// The engine never builds these itself; it only merges, counts, and
/// returns them. The `id` must be the platform's stable identifier for the
/// post - records with an empty id are dropped at merge time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    /// Stable platform identifier for the post
    pub id: String,

    /// Author handle, without the leading '@'
    pub handle: String,

    /// Post body text
    pub body: String,

    /// Canonical URL of the post
    pub record_url: String,

    /// Publication timestamp (UTC; timezone presentation is the caller's concern)
    pub created_at: DateTime<Utc>,

    /// Reply counter as displayed at collection time
    pub reply_count: u64,

    /// Repost counter as displayed at collection time
    pub repost_count: u64,

    /// Like counter as displayed at collection time
    pub like_count: u64,

    /// Quote counter as displayed at collection time
    pub quote_count: u64,

    /// View counter as displayed at collection time
    pub view_count: u64,

    /// First attached media URL, if any
    #[serde(default)]
    pub media_url: Option<String>,

    /// Author avatar URL, if the extractor could resolve one
    #[serde(default)]
    pub avatar_url: Option<String>,

    /// Handle this post replies to, if it is itself a reply
    #[serde(default)]
    pub in_reply_to: Option<String>,

    /// Whether the body carries quoted text from another post
    #[serde(default)]
    pub has_quoted_text: bool,

    /// Language tag reported by the platform
    #[serde(default)]
    pub lang: String,

    /// Platform identifier of the author
    #[serde(default)]
    pub author_id: String,

    /// Conversation (thread) identifier
    #[serde(default)]
    pub conversation_id: String,

    /// Free-text author location, if public
    #[serde(default)]
    pub location: String,
}

/// A reply record with parent linkage and a content hash
///
/// Produced by the reply-harvesting loops; the hash is stable across
/// re-crawls of the same reply (see [`super::content_hash`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// The reply itself
    pub record: RawRecord,

    /// URL of the thread this reply was harvested from
    pub parent_url: String,

    /// Caller-supplied external identifier for the parent, if any
    pub parent_id: Option<i64>,

    /// Hex-encoded SHA-256 over the reply's immutable fields
    pub content_hash: String,
}

/// Outcome of harvesting replies for a single thread within a batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Caller-supplied identifier of the thread
    pub thread_id: i64,

    /// Number of replies collected
    pub reply_count: usize,

    /// The collected replies (empty on failure)
    pub replies: Vec<Reply>,

    /// Whether this thread completed without a fatal error
    pub success: bool,

    /// Error text when `success` is false
    pub error: Option<String>,
}

/// Aggregate outcome of a multi-thread reply harvest
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Per-thread results, in the order the threads were supplied
    pub results: Vec<BatchResult>,

    /// Number of threads that completed successfully
    pub succeeded: usize,

    /// Number of threads recorded as failed
    pub failed: usize,
}

impl BatchOutcome {
    /// Builds an outcome from per-thread results, counting successes and failures
    pub fn from_results(results: Vec<BatchResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;
        Self {
            results,
            succeeded,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_outcome_counts() {
        let results = vec![
            BatchResult {
                thread_id: 1,
                reply_count: 2,
                replies: vec![],
                success: true,
                error: None,
            },
            BatchResult {
                thread_id: 2,
                reply_count: 0,
                replies: vec![],
                success: false,
                error: Some("render timeout".to_string()),
            },
        ];

        let outcome = BatchOutcome::from_results(results);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.results.len(), 2);
    }

    #[test]
    fn test_record_serde_roundtrip_defaults() {
        // Optional fields may be absent in serialized form
        let json = r#"{
            "id": "42",
            "handle": "someone",
            "body": "hello",
            "record_url": "https://example.social/someone/status/42",
            "created_at": "2024-05-01T12:00:00Z",
            "reply_count": 1,
            "repost_count": 2,
            "like_count": 3,
            "quote_count": 0,
            "view_count": 100
        }"#;

        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "42");
        assert!(record.media_url.is_none());
        assert!(!record.has_quoted_text);
    }
}
