//! Time-bounded memoization of verification verdicts.
//!
//! Verification is re-queried by several independent flows (access checks,
//! receipt display, explicit re-verify) for the same hash in short
//! succession; the cache bounds RPC volume without staleness risk for money
//! movement: a cached `Valid` reflects an immutable on-chain fact, and a
//! cached `Invalid` is cheap to refresh once the TTL lapses.
//!
//! Entries are keyed by transaction hash alone - the engine assumes one
//! payment obligation per hash, so repeated queries carry the same recipient
//! and amount. Absence of an entry means "unknown, re-verify"; the cache is
//! a load-shedding optimization, never a correctness dependency. Transient
//! `Unavailable` outcomes are never stored.

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::TxHash;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use paylink::verdict::VerificationResult;

/// Default time-to-live for cached verdicts.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Default interval for the background sweep of expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry {
    result: VerificationResult,
    expires_at: Instant,
}

/// Concurrent TTL cache of verification verdicts, keyed by transaction hash.
#[derive(Debug, Clone)]
pub struct VerificationCache {
    entries: Arc<DashMap<TxHash, CacheEntry>>,
    ttl: Duration,
}

impl VerificationCache {
    /// Creates a cache with the given entry time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Returns the cached verdict for a hash, purging it lazily if expired.
    #[must_use]
    pub fn get(&self, tx_hash: &TxHash) -> Option<VerificationResult> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(tx_hash) {
            if entry.expires_at > now {
                return Some(entry.result.clone());
            }
        } else {
            return None;
        }
        // Expired: drop it unless a concurrent put already refreshed the slot.
        self.entries
            .remove_if(tx_hash, |_, entry| entry.expires_at <= now);
        None
    }

    /// Stores a definitive verdict for a hash.
    pub fn put(&self, tx_hash: TxHash, result: VerificationResult) {
        self.entries.insert(
            tx_hash,
            CacheEntry {
                result,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drops all expired entries, returning how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of live (possibly expired, not yet swept) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawns the periodic sweep task; it runs until `shutdown` is
    /// cancelled and is torn down together with the service.
    pub fn spawn_sweeper(
        &self,
        every: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so an idle
            // service does not sweep at startup.
            interval.tick().await;
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            debug!(removed, remaining = cache.len(), "Swept expired verification cache entries");
                        }
                    }
                }
            }
            debug!("Verification cache sweeper stopped");
        })
    }
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
