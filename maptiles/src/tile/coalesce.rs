//! Fetch coalescing.
//!
//! When several callers miss the cache for the same tile at once, only the
//! first one fetches it. The rest subscribe to the leader's broadcast and
//! receive the same outcome, success or failure.
//!
//! ```text
//! get_tile A ─┐
//!             │                         spawned
//! get_tile B ─┼──► FetchCoalescer ────► fetch task
//!             │         │                  │
//! get_tile C ─┘         ▼                  ▼
//!                 [A, B, C receive ◄── InFlightGuard::complete
//!                  one outcome]
//! ```
//!
//! The leader holds an [`InFlightGuard`]. Dropping it without completing
//! (task panic or abort) removes the entry and closes the channel, so
//! waiters observe [`TileError::FetchAborted`] instead of hanging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{TileError, TileKey};

/// Outcome shared between every caller of a coalesced fetch.
pub type FetchOutcome = Result<Bytes, TileError>;

/// Tracks in-flight tile fetches.
pub struct FetchCoalescer {
    in_flight: DashMap<TileKey, broadcast::Sender<FetchOutcome>>,
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    new_requests: AtomicU64,
}

/// Snapshot of coalescing counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerStats {
    pub total_requests: u64,
    pub coalesced_requests: u64,
    pub new_requests: u64,
}

impl CoalescerStats {
    /// Returns the coalescing ratio (0.0 to 1.0)
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Result of registering interest in a tile.
pub enum CoalesceResult {
    /// No fetch was running; the caller is now responsible for it.
    NewRequest(InFlightGuard),
    /// A fetch is already running; wait on the receiver.
    Coalesced(broadcast::Receiver<FetchOutcome>),
}

impl FetchCoalescer {
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
            total_requests: AtomicU64::new(0),
            coalesced_requests: AtomicU64::new(0),
            new_requests: AtomicU64::new(0),
        }
    }

    /// Registers a request for `key`.
    pub fn register(self: &Arc<Self>, key: TileKey) -> CoalesceResult {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let rx = entry.get().subscribe();
                self.coalesced_requests.fetch_add(1, Ordering::Relaxed);
                debug!(tile = %key, "Coalescing request onto in-flight fetch");
                CoalesceResult::Coalesced(rx)
            }
            Entry::Vacant(entry) => {
                // One message per fetch; capacity 1 is enough
                let (tx, _rx) = broadcast::channel(1);
                entry.insert(tx);
                self.new_requests.fetch_add(1, Ordering::Relaxed);
                debug!(tile = %key, "New fetch");
                CoalesceResult::NewRequest(InFlightGuard {
                    coalescer: Arc::clone(self),
                    key,
                    completed: false,
                })
            }
        }
    }

    fn complete(&self, key: &TileKey, outcome: FetchOutcome) {
        if let Some((_, tx)) = self.in_flight.remove(key) {
            let waiters = tx.receiver_count();
            // Err only means nobody is waiting
            let _ = tx.send(outcome);
            if waiters > 0 {
                debug!(tile = %key, waiters, "Broadcast fetch outcome");
            }
        }
    }

    fn cancel(&self, key: &TileKey) {
        if self.in_flight.remove(key).is_some() {
            debug!(tile = %key, "Fetch abandoned - waiters will see an abort");
        }
    }

    /// Returns a snapshot of the current statistics.
    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced_requests.load(Ordering::Relaxed),
            new_requests: self.new_requests.load(Ordering::Relaxed),
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Logs the statistics at info level, tagged with the owning provider.
    pub fn log_stats(&self, provider: &str) {
        let stats = self.stats();
        info!(
            provider,
            total_requests = stats.total_requests,
            coalesced = stats.coalesced_requests,
            new_requests = stats.new_requests,
            in_flight = self.in_flight.len(),
            coalescing_ratio = format!("{:.1}%", stats.coalescing_ratio() * 100.0),
            "Fetch coalescing statistics"
        );
    }
}

impl Default for FetchCoalescer {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for the leader's outcome on a coalesced receiver.
pub(crate) async fn await_outcome(
    mut rx: broadcast::Receiver<FetchOutcome>,
    key: &TileKey,
) -> FetchOutcome {
    match rx.recv().await {
        Ok(outcome) => outcome,
        Err(_) => Err(TileError::FetchAborted(key.clone())),
    }
}

/// Leadership of a single in-flight fetch.
///
/// Must be finished with [`InFlightGuard::complete`]; dropping it cancels
/// the fetch for every waiter.
pub struct InFlightGuard {
    coalescer: Arc<FetchCoalescer>,
    key: TileKey,
    completed: bool,
}

impl InFlightGuard {
    pub fn key(&self) -> &TileKey {
        &self.key
    }

    /// Publishes the outcome to all waiters and ends the in-flight entry.
    pub fn complete(mut self, outcome: FetchOutcome) {
        self.completed = true;
        self.coalescer.complete(&self.key, outcome);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.coalescer.cancel(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> TileKey {
        TileKey::new("osm", 4, 3, 2)
    }

    fn leader(result: CoalesceResult) -> InFlightGuard {
        match result {
            CoalesceResult::NewRequest(guard) => guard,
            CoalesceResult::Coalesced(_) => panic!("Expected NewRequest"),
        }
    }

    fn follower(result: CoalesceResult) -> broadcast::Receiver<FetchOutcome> {
        match result {
            CoalesceResult::Coalesced(rx) => rx,
            CoalesceResult::NewRequest(_) => panic!("Expected Coalesced"),
        }
    }

    #[tokio::test]
    async fn test_first_request_leads() {
        let coalescer = Arc::new(FetchCoalescer::new());
        let guard = leader(coalescer.register(key()));

        assert_eq!(guard.key(), &key());
        assert!(coalescer.is_in_flight(&key()));
        assert_eq!(coalescer.in_flight_count(), 1);
    }

    #[tokio::test]
    async fn test_followers_receive_leader_outcome() {
        let coalescer = Arc::new(FetchCoalescer::new());
        let guard = leader(coalescer.register(key()));
        let rx1 = follower(coalescer.register(key()));
        let rx2 = follower(coalescer.register(key()));

        guard.complete(Ok(Bytes::from_static(b"png")));

        assert_eq!(
            await_outcome(rx1, &key()).await.unwrap(),
            Bytes::from_static(b"png")
        );
        assert_eq!(
            await_outcome(rx2, &key()).await.unwrap(),
            Bytes::from_static(b"png")
        );
        assert_eq!(coalescer.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_followers_receive_failure() {
        let coalescer = Arc::new(FetchCoalescer::new());
        let guard = leader(coalescer.register(key()));
        let rx = follower(coalescer.register(key()));

        guard.complete(Err(TileError::TileFetchFailed {
            key: key(),
            failures: vec![],
        }));

        assert!(matches!(
            await_outcome(rx, &key()).await,
            Err(TileError::TileFetchFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropped_guard_aborts_waiters() {
        let coalescer = Arc::new(FetchCoalescer::new());
        let guard = leader(coalescer.register(key()));
        let rx = follower(coalescer.register(key()));

        drop(guard);

        assert_eq!(
            await_outcome(rx, &key()).await,
            Err(TileError::FetchAborted(key()))
        );
        assert!(!coalescer.is_in_flight(&key()));
    }

    #[tokio::test]
    async fn test_new_leader_after_completion() {
        let coalescer = Arc::new(FetchCoalescer::new());
        leader(coalescer.register(key())).complete(Ok(Bytes::new()));

        let _again = leader(coalescer.register(key()));
    }

    #[test]
    fn test_distinct_keys_do_not_coalesce() {
        let coalescer = Arc::new(FetchCoalescer::new());
        let _a = leader(coalescer.register(TileKey::new("osm", 1, 0, 0)));
        let _b = leader(coalescer.register(TileKey::new("osm", 1, 1, 0)));
        let _c = leader(coalescer.register(TileKey::new("topo", 1, 0, 0)));
        assert_eq!(coalescer.in_flight_count(), 3);
    }

    #[test]
    fn test_stats() {
        let coalescer = Arc::new(FetchCoalescer::new());
        let _guard = leader(coalescer.register(key()));
        let _rx1 = follower(coalescer.register(key()));
        let _rx2 = follower(coalescer.register(key()));
        let _rx3 = follower(coalescer.register(key()));

        let stats = coalescer.stats();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.new_requests, 1);
        assert_eq!(stats.coalesced_requests, 3);
        assert!((stats.coalescing_ratio() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats_ratio() {
        assert_eq!(CoalescerStats::default().coalescing_ratio(), 0.0);
    }
}
