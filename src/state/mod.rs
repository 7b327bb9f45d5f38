//! State tracking for one crawl session
//!
//! # Components
//!
//! - `SessionState`: the ephemeral counter block scoped to one pagination
//!   loop execution (timeouts, stagnation, per-credential tallies)
//! - `CrawlPhase` / `StopReason`: the explicit state machine the
//!   single-target loop runs as, and the reason it terminated

mod phase;
mod session;

// Re-export main types
pub use phase::{CrawlPhase, StopReason};
pub use session::SessionState;
