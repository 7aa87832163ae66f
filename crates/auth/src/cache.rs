//! Credential cache
//!
//! Maps a presented API key to the username it resolved to, so repeated
//! requests skip the store query and the password hash comparison.
//!
//! # Freshness
//!
//! An entry is fresh while `now - inserted_at <= ttl`. Staleness is checked on
//! read; stale entries stay in memory until a sweep removes them. Every
//! [`SWEEP_EVERY`]th insertion asks the background sweeper (if one is running)
//! for a pass, without waiting for it.
//!
//! # Revocation
//!
//! Revoking or expiring a key record does not touch the cache. A cached grant
//! keeps working until its TTL runs out unless the revocation path calls
//! [`CredentialCache::invalidate_user`]. The window is bounded by the TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default time-to-live for cached grants
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// A sweep is requested each time the entry count hits a multiple of this
pub const SWEEP_EVERY: usize = 50;

#[derive(Debug, Clone)]
struct CacheEntry {
    username: String,
    inserted_at: Instant,
}

impl CacheEntry {
    #[inline]
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() <= ttl
    }
}

type Entries = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Process-local TTL cache of verified API keys
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sublink_auth::CredentialCache;
///
/// let cache = CredentialCache::new(Duration::from_secs(300));
/// cache.set("subX_1Pq8Ab_00ff", "alice");
/// assert_eq!(cache.get("subX_1Pq8Ab_00ff").as_deref(), Some("alice"));
/// ```
#[derive(Debug)]
pub struct CredentialCache {
    entries: Entries,
    ttl: Duration,
    /// Present when a [`CacheSweeper`] is running
    sweep_tx: Option<mpsc::Sender<()>>,
}

impl Default for CredentialCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl CredentialCache {
    /// Create a cache without a background sweeper
    ///
    /// Stale entries are only removed by explicit [`sweep`](Self::sweep) calls.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            sweep_tx: None,
        }
    }

    /// Create a cache with a background sweeper task
    ///
    /// Must be called inside a tokio runtime. The returned handle stops the
    /// sweeper; call [`CacheSweeper::shutdown`] during teardown.
    pub fn with_sweeper(ttl: Duration) -> (Self, CacheSweeper) {
        let entries: Entries = Arc::new(RwLock::new(HashMap::new()));

        // One pending request is enough: a queued sweep covers later writes too
        let (sweep_tx, sweep_rx) = mpsc::channel(1);
        let sweeper = CacheSweeper::spawn(Arc::clone(&entries), ttl, sweep_rx);

        let cache = Self {
            entries,
            ttl,
            sweep_tx: Some(sweep_tx),
        };

        (cache, sweeper)
    }

    /// Configured time-to-live
    #[inline]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a key, returning the username if the entry is fresh
    ///
    /// A stale entry reads as a miss and is left in place.
    pub fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.username.clone())
    }

    /// Insert or refresh a key
    ///
    /// Never blocks on the sweep it may trigger.
    pub fn set(&self, key: impl Into<String>, username: impl Into<String>) {
        let len = {
            let mut entries = self.entries.write();
            entries.insert(
                key.into(),
                CacheEntry {
                    username: username.into(),
                    inserted_at: Instant::now(),
                },
            );
            entries.len()
        };

        if len % SWEEP_EVERY == 0
            && let Some(tx) = &self.sweep_tx
        {
            // Full channel means a sweep is already queued
            let _ = tx.try_send(());
        }
    }

    /// Remove every entry that resolved to `username`
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_user(&self, username: &str) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, entry| entry.username != username);
            before - entries.len()
        };

        info!(user = %username, removed, "Cleared cached API keys");
        removed
    }

    /// Remove all stale entries now
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        sweep_entries(&self.entries, self.ttl)
    }

    /// Number of entries, including stale ones not yet swept
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache holds no entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// One pass over the map under a single write lock
fn sweep_entries(entries: &RwLock<HashMap<String, CacheEntry>>, ttl: Duration) -> usize {
    let mut entries = entries.write();
    let before = entries.len();
    entries.retain(|_, entry| entry.is_fresh(ttl));
    before - entries.len()
}

/// Handle to the background sweeper task
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also stops
/// the task, but does not wait for it.
#[derive(Debug)]
pub struct CacheSweeper {
    shutdown_tx: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    fn spawn(entries: Entries, ttl: Duration, mut sweep_rx: mpsc::Receiver<()>) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());

        let handle = tokio::spawn(async move {
            debug!("Credential cache sweeper started");

            loop {
                tokio::select! {
                    request = sweep_rx.recv() => {
                        if request.is_none() {
                            break;
                        }
                        let removed = sweep_entries(&entries, ttl);
                        debug!(removed, "Credential cache swept");
                    }
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }

            debug!("Credential cache sweeper stopped");
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the sweeper and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }

    /// Check if the sweeper task has exited
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
