use crate::records::RawRecord;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Content-addressed accumulator for collected records
///
/// Records are keyed by their stable id: merging a batch upserts each
/// record, so a post that scrolls into view twice refreshes its counters
/// instead of duplicating. First-insertion order is retained, which gives
/// the end-of-feed detector a notion of "most recently collected" and
/// makes `materialize` deterministic.
///
/// Created fresh per crawl invocation; never shared across sessions.
#[derive(Debug, Default)]
pub struct Collector {
    records: HashMap<String, RawRecord>,
    order: Vec<String>,
}

impl Collector {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a batch of records, returning how many ids were new
    ///
    /// Records with an empty id are dropped. Re-insertion of a known id
    /// overwrites the stored record in place (last write wins) without
    /// affecting its position in the output order.
    pub fn merge<I>(&mut self, batch: I) -> usize
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut fresh = 0;
        for record in batch {
            if record.id.is_empty() {
                continue;
            }
            let id = record.id.clone();
            if self.records.insert(id.clone(), record).is_none() {
                self.order.push(id);
                fresh += 1;
            }
        }
        fresh
    }

    /// Number of distinct records collected so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been collected yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns whether the given id has already been collected
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// The ids of the `n` most recently collected records, oldest first
    pub fn last_ids(&self, n: usize) -> Vec<&str> {
        let start = self.order.len().saturating_sub(n);
        self.order[start..].iter().map(String::as_str).collect()
    }

    /// Timestamp of the most recently collected record
    ///
    /// Feeds paginate reverse-chronologically, so this is the oldest
    /// timestamp seen - the value the date-boundary end signal compares
    /// against the requested lower bound.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        let id = self.order.last()?;
        self.records.get(id).map(|r| r.created_at)
    }

    /// Materializes the collected records in first-insertion order
    pub fn materialize(self) -> Vec<RawRecord> {
        let mut records = self.records;
        self.order
            .iter()
            .filter_map(|id| records.remove(id))
            .collect()
    }

    /// Snapshot of the collected records without consuming the collector
    pub fn snapshot(&self) -> Vec<RawRecord> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_record(id: &str, like_count: u64) -> RawRecord {
        RawRecord {
            id: id.to_string(),
            handle: "someone".to_string(),
            body: format!("post {}", id),
            record_url: format!("https://example.social/someone/status/{}", id),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            reply_count: 0,
            repost_count: 0,
            like_count,
            quote_count: 0,
            view_count: 0,
            media_url: None,
            avatar_url: None,
            in_reply_to: None,
            has_quoted_text: false,
            lang: "en".to_string(),
            author_id: String::new(),
            conversation_id: id.to_string(),
            location: String::new(),
        }
    }

    #[test]
    fn test_merge_counts_only_new_ids() {
        let mut collector = Collector::new();

        let fresh = collector.merge(vec![
            create_test_record("1", 0),
            create_test_record("2", 0),
        ]);
        assert_eq!(fresh, 2);

        let fresh = collector.merge(vec![
            create_test_record("2", 5),
            create_test_record("3", 0),
        ]);
        assert_eq!(fresh, 1);
        assert_eq!(collector.len(), 3);
    }

    #[test]
    fn test_duplicate_id_last_write_wins() {
        let mut collector = Collector::new();
        collector.merge(vec![create_test_record("1", 10)]);
        collector.merge(vec![create_test_record("1", 99)]);

        let records = collector.materialize();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].like_count, 99);
    }

    #[test]
    fn test_empty_id_dropped() {
        let mut collector = Collector::new();
        let fresh = collector.merge(vec![create_test_record("", 0)]);
        assert_eq!(fresh, 0);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_materialize_preserves_insertion_order() {
        let mut collector = Collector::new();
        collector.merge(vec![create_test_record("b", 0)]);
        collector.merge(vec![create_test_record("a", 0), create_test_record("c", 0)]);
        // Re-inserting "b" must not move it to the back
        collector.merge(vec![create_test_record("b", 7)]);

        let ids: Vec<String> = collector.materialize().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_last_ids() {
        let mut collector = Collector::new();
        for id in ["1", "2", "3", "4", "5"] {
            collector.merge(vec![create_test_record(id, 0)]);
        }

        assert_eq!(collector.last_ids(3), vec!["3", "4", "5"]);
        assert_eq!(collector.last_ids(10).len(), 5);
    }

    #[test]
    fn test_last_timestamp_tracks_most_recent_insertion() {
        let mut collector = Collector::new();
        assert!(collector.last_timestamp().is_none());

        let mut older = create_test_record("2", 0);
        older.created_at = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        collector.merge(vec![create_test_record("1", 0)]);
        collector.merge(vec![older.clone()]);

        assert_eq!(collector.last_timestamp(), Some(older.created_at));
    }
}
