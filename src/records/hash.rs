use crate::records::RawRecord;
use sha2::{Digest, Sha256};

/// Computes the content hash for a collected record
///
/// The hash covers the fields that never change after publication
/// (author handle, timestamp, id, body), so re-crawling the same reply
/// with refreshed counters produces the same hash.
pub fn content_hash(record: &RawRecord) -> String {
    let data = format!(
        "{}_{}_{}_{}",
        record.handle,
        record.created_at.to_rfc3339(),
        record.id,
        record.body
    );
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}
