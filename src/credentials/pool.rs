use crate::page::PageDriver;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Extra wait added on top of the earliest recovery time when every
/// credential is blacklisted, so the recovering entry is definitely usable
const ROTATION_WAIT_MARGIN: Duration = Duration::from_secs(5);

/// Outcome of asking the pool for the next usable credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextCredential {
    /// Index of a non-blacklisted credential after the current cursor
    Available(usize),

    /// Every credential is blacklisted; `wait` is the time until the
    /// earliest one recovers
    Exhausted { wait: Duration },
}

/// Ordered pool of session credentials with blacklist/recovery semantics
///
/// The primary credential is always present at index 0 and duplicates are
/// removed. A pool is owned by exactly one crawl session; rotation walks
/// the entries after the current cursor, skipping blacklisted ones, and
/// when all entries are blacklisted it waits out the earliest recovery
/// time before trying again.
pub struct CredentialPool {
    credentials: Vec<String>,
    current: usize,
    blacklist: HashMap<usize, Instant>,
    cooldown: Duration,
    settle: Duration,
}

impl CredentialPool {
    /// Creates a pool from the primary credential and an optional set of
    /// extras
    ///
    /// # Arguments
    ///
    /// * `primary` - the credential the session starts under
    /// * `extras` - additional credentials available for rotation
    /// * `cooldown` - how long a blacklisted credential stays excluded
    /// * `settle` - pause applied after a successful credential injection
    pub fn new(primary: &str, extras: &[String], cooldown: Duration, settle: Duration) -> Self {
        let mut credentials = vec![primary.to_string()];
        for extra in extras {
            if !credentials.contains(extra) {
                credentials.push(extra.clone());
            }
        }

        Self {
            credentials,
            current: 0,
            blacklist: HashMap::new(),
            cooldown,
            settle,
        }
    }

    /// Number of credentials in the pool
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Returns true if the pool holds no credentials (never the case for
    /// a pool built through `new`)
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Index of the credential the session is currently running under
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The credential the session is currently running under
    pub fn current_credential(&self) -> &str {
        &self.credentials[self.current]
    }

    /// Marks the credential at `index` as blacklisted until the cool-down
    /// elapses
    ///
    /// Calling again before recovery leaves the existing recovery time in
    /// place.
    pub fn blacklist(&mut self, index: usize, reason: &str) {
        let recovery = Instant::now() + self.cooldown;
        self.blacklist.entry(index).or_insert(recovery);
        tracing::info!(
            "Credential {}/{} marked as problematic: {}",
            index + 1,
            self.credentials.len(),
            reason
        );
    }

    /// Marks the current credential as blacklisted
    pub fn blacklist_current(&mut self, reason: &str) {
        self.blacklist(self.current, reason);
    }

    /// Number of currently blacklisted credentials (expired entries included
    /// until the next cleanup)
    pub fn blacklisted_count(&self) -> usize {
        self.blacklist.len()
    }

    /// Drops blacklist entries whose recovery time has passed
    pub fn cleanup_expired(&mut self) {
        let now = Instant::now();
        self.blacklist.retain(|_, recovery| *recovery > now);
    }

    /// Finds the next usable credential after the current cursor
    ///
    /// Walks the pool in order starting just past the cursor, wrapping
    /// around, and returns the first non-blacklisted index. When every
    /// entry is blacklisted, reports the minimum wait until one recovers.
    /// Callers should run `cleanup_expired` first.
    pub fn next_available(&self) -> NextCredential {
        if self.blacklist.len() >= self.credentials.len() {
            let now = Instant::now();
            let wait = self
                .blacklist
                .values()
                .map(|recovery| recovery.saturating_duration_since(now))
                .min()
                .unwrap_or(Duration::ZERO);
            return NextCredential::Exhausted { wait };
        }

        for i in 0..self.credentials.len() {
            let index = (self.current + i + 1) % self.credentials.len();
            if !self.blacklist.contains_key(&index) {
                return NextCredential::Available(index);
            }
        }

        // Unreachable: the exhaustion check above covers a full blacklist
        NextCredential::Exhausted {
            wait: self.cooldown,
        }
    }

    /// Rotates to the next usable credential and injects it into the page
    ///
    /// Returns `Ok(false)` without side effects when the pool has a single
    /// entry. When every credential is blacklisted, sleeps until the
    /// earliest recovery (plus a safety margin) and tries again. A failed
    /// injection blacklists the target credential and counts as a failed
    /// rotation, not a fatal error; the session keeps running under
    /// whatever credential the page still holds.
    pub async fn rotate<D>(&mut self, driver: &D, reason: &str) -> bool
    where
        D: PageDriver + ?Sized,
    {
        if self.credentials.len() <= 1 {
            return false;
        }

        loop {
            self.cleanup_expired();

            match self.next_available() {
                NextCredential::Exhausted { wait } => {
                    tracing::info!(
                        "All {} credentials are marked, waiting {:?} for recovery",
                        self.credentials.len(),
                        wait
                    );
                    sleep(wait + ROTATION_WAIT_MARGIN).await;
                }
                NextCredential::Available(index) => {
                    let previous = self.current;
                    self.current = index;
                    tracing::info!(
                        "Rotating credential: {} -> {} ({})",
                        previous + 1,
                        index + 1,
                        reason
                    );

                    match driver
                        .inject_session_credential(&self.credentials[index])
                        .await
                    {
                        Ok(()) => {
                            sleep(self.settle).await;
                            return true;
                        }
                        Err(e) => {
                            self.blacklist(index, &format!("Rotation error: {}", e));
                            return false;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{ExtractionContext, PageDriver};
    use crate::records::RawRecord;
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    /// Driver stub that only implements credential injection
    struct StubDriver {
        fail_injection: bool,
    }

    #[async_trait]
    impl PageDriver for StubDriver {
        async fn navigate(&self, _url: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }

        async fn inject_session_credential(&self, _value: &str) -> Result<()> {
            if self.fail_injection {
                bail!("cookie store unavailable");
            }
            Ok(())
        }

        async fn wait_for_next_page_response(&self, _timeout: Duration) -> Result<Option<String>> {
            Ok(None)
        }

        async fn scroll_forward(&self) -> Result<()> {
            Ok(())
        }

        async fn scroll_to_top(&self) -> Result<()> {
            Ok(())
        }

        async fn extract_records(&self, _ctx: &ExtractionContext) -> Result<Vec<RawRecord>> {
            Ok(vec![])
        }

        async fn wait_for_content_rendered(&self, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }

        async fn page_height(&self) -> Result<u64> {
            Ok(0)
        }

        async fn text_present(&self, _phrase: &str) -> Result<bool> {
            Ok(false)
        }

        async fn submit_search_query(&self, _query: &str) -> Result<()> {
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }

    fn create_test_pool(extras: &[&str]) -> CredentialPool {
        let extras: Vec<String> = extras.iter().map(|s| s.to_string()).collect();
        CredentialPool::new(
            "primary",
            &extras,
            Duration::from_secs(60),
            Duration::from_millis(0),
        )
    }

    #[test]
    fn test_new_deduplicates_and_keeps_primary_first() {
        let pool = create_test_pool(&["primary", "second", "second", "third"]);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.current_credential(), "primary");
    }

    #[test]
    fn test_next_available_skips_blacklisted() {
        let mut pool = create_test_pool(&["second", "third"]);

        // Natural successor of index 0 is index 1
        assert_eq!(pool.next_available(), NextCredential::Available(1));

        pool.blacklist(1, "rate limit");
        assert_eq!(pool.next_available(), NextCredential::Available(2));

        // With 1 and 2 marked, the wrap-around lands back on the current
        // credential, which is still usable
        pool.blacklist(2, "rate limit");
        assert_eq!(pool.next_available(), NextCredential::Available(0));

        pool.blacklist(0, "rate limit");
        assert!(matches!(
            pool.next_available(),
            NextCredential::Exhausted { .. }
        ));
    }

    #[tokio::test]
    async fn test_rotate_noop_on_single_credential() {
        let mut pool = create_test_pool(&[]);
        let driver = StubDriver {
            fail_injection: false,
        };

        assert!(!pool.rotate(&driver, "scheduled rotation").await);
        assert_eq!(pool.current_index(), 0);
    }

    #[tokio::test]
    async fn test_rotate_selects_next_and_injects() {
        let mut pool = create_test_pool(&["second", "third"]);
        let driver = StubDriver {
            fail_injection: false,
        };

        assert!(pool.rotate(&driver, "rate limit").await);
        assert_eq!(pool.current_index(), 1);
        assert_eq!(pool.current_credential(), "second");
    }

    #[tokio::test]
    async fn test_rotate_skips_blacklisted_credential() {
        let mut pool = create_test_pool(&["second", "third"]);
        let driver = StubDriver {
            fail_injection: false,
        };

        pool.blacklist(1, "blocked");
        assert!(pool.rotate(&driver, "blocked").await);
        assert_eq!(pool.current_index(), 2);
    }

    #[tokio::test]
    async fn test_failed_injection_blacklists_target() {
        let mut pool = create_test_pool(&["second"]);
        let driver = StubDriver {
            fail_injection: true,
        };

        assert!(!pool.rotate(&driver, "rate limit").await);
        assert_eq!(pool.blacklisted_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotate_waits_out_full_blacklist() {
        let mut pool = create_test_pool(&["second", "third"]);
        let driver = StubDriver {
            fail_injection: false,
        };

        pool.blacklist(0, "blocked");
        pool.blacklist(1, "blocked");
        pool.blacklist(2, "blocked");

        let start = Instant::now();
        assert!(pool.rotate(&driver, "all marked").await);

        // Must have slept at least the cool-down before recovering
        assert!(start.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired_frees_credentials() {
        let mut pool = create_test_pool(&["second"]);
        pool.blacklist(1, "rate limit");

        pool.cleanup_expired();
        assert_eq!(pool.blacklisted_count(), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        pool.cleanup_expired();
        assert_eq!(pool.blacklisted_count(), 0);
    }

    #[test]
    fn test_blacklist_is_idempotent_before_recovery() {
        let mut pool = create_test_pool(&["second"]);
        pool.blacklist(1, "rate limit");
        pool.blacklist(1, "rate limit again");
        assert_eq!(pool.blacklisted_count(), 1);
    }
}
