//! Credential pool management
//!
//! Holds the ordered set of session credentials available to one crawl
//! session and the blacklist-with-recovery bookkeeping that decides which
//! credential pagination runs under after a rate limit or block.

mod pool;

pub use pool::{CredentialPool, NextCredential};
