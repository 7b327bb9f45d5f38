//! Record types and the dedup collector
//!
//! This module contains everything the engine accumulates:
//! - `RawRecord`: one normalized post as produced by the extraction collaborator
//! - `Reply`: a record tagged with parent linkage and a content hash
//! - `Collector`: the id-keyed accumulator that prevents duplicates across
//!   overlapping page fetches
//! - Batch result types returned by the multi-thread orchestrator

mod collector;
mod hash;
mod record;

pub use collector::Collector;
pub use hash::content_hash;
pub use record::{BatchOutcome, BatchResult, RawRecord, Reply};
