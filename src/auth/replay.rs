// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Nonce replay cache.
//!
//! Each `(app_id, nonce)` pair is admitted at most once while its entry is
//! alive. An entry lives until the token itself can no longer pass the
//! freshness check: one window past the later of the client timestamp and the
//! server time at admission.
//!
//! ## Expiry
//!
//! Lookups treat an expired entry as absent, so eviction timing never causes
//! a false "already seen". The background sweeper only bounds memory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How the cache key is derived from app id and nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayKeyMode {
    /// `(app_id, nonce)` kept as separate fields.
    #[default]
    Structured,
    /// `app_id ‖ nonce` as one string. `"ab" + "c"` and `"a" + "bc"` share a
    /// slot; only useful for interop with deployments keyed this way.
    Concatenated,
}

/// How far a client timestamp may be ahead of the server clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FutureSkew {
    /// Same bound as the replay window.
    #[default]
    Window,
    /// Explicit bound in seconds.
    Bounded(u64),
    /// Any future timestamp is accepted.
    Unbounded,
}

impl FutureSkew {
    fn allows(&self, ahead: i64, window: i64) -> bool {
        match self {
            FutureSkew::Window => ahead <= window,
            FutureSkew::Bounded(secs) => ahead <= clamp_secs(*secs),
            FutureSkew::Unbounded => true,
        }
    }
}

/// Outcome of [`ReplayGuard::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReplayKey {
    app_id: String,
    nonce: String,
}

#[derive(Debug, Clone, Copy)]
struct ReplayEntry {
    /// Client timestamp the nonce was admitted with.
    timestamp: i64,
    /// Last second (inclusive) during which the slot is taken.
    expires_at: i64,
}

/// In-memory replay cache shared by all request handlers.
#[derive(Debug, Default)]
pub struct ReplayGuard {
    entries: Mutex<HashMap<ReplayKey, ReplayEntry>>,
    key_mode: ReplayKeyMode,
    future_skew: FutureSkew,
}

impl ReplayGuard {
    /// Create an empty guard.
    pub fn new(key_mode: ReplayKeyMode, future_skew: FutureSkew) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            key_mode,
            future_skew,
        }
    }

    /// Admit `(app_id, nonce)` once within the window.
    ///
    /// Rejected when the pair is already present, when the request is older
    /// than `window_secs`, or when it is further in the future than the
    /// configured skew allows. The lookup and the insert happen under one
    /// lock, so concurrent callers with the same pair see exactly one
    /// `Accepted`.
    pub fn admit(
        &self,
        app_id: &str,
        nonce: &str,
        client_timestamp: i64,
        server_timestamp: i64,
        window_secs: u64,
    ) -> Admission {
        let window = clamp_secs(window_secs);
        let drift = server_timestamp.saturating_sub(client_timestamp);

        if drift > window {
            debug!(drift, window, "request timestamp outside replay window");
            return Admission::Rejected;
        }
        if drift < 0 && !self.future_skew.allows(drift.saturating_neg(), window) {
            debug!(drift, "request timestamp too far in the future");
            return Admission::Rejected;
        }

        let key = self.key(app_id, nonce);
        let mut entries = self.lock();

        if let Some(entry) = entries.get(&key) {
            if entry.expires_at >= server_timestamp {
                debug!(
                    first_timestamp = entry.timestamp,
                    client_timestamp, "nonce already used"
                );
                return Admission::Rejected;
            }
        }

        // A token stays fresh until `client_timestamp + window`, so the slot
        // must not free up before then.
        let expires_at = server_timestamp
            .max(client_timestamp)
            .saturating_add(window);
        entries.insert(
            key,
            ReplayEntry {
                timestamp: client_timestamp,
                expires_at,
            },
        );
        Admission::Accepted
    }

    /// Drop every entry whose expiry is before `now`.
    ///
    /// Returns the number of removed entries.
    pub fn sweep(&self, now: i64) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at >= now);
        before - entries.len()
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Spawn a task that sweeps expired entries every `interval` until
    /// `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Replay cache sweeper starting");
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let removed = guard.sweep(chrono::Utc::now().timestamp());
                        if removed > 0 {
                            debug!(removed, remaining = guard.len(), "Swept expired nonces");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        info!("Replay cache sweeper shutting down");
                        return;
                    }
                }
            }
        })
    }

    fn key(&self, app_id: &str, nonce: &str) -> ReplayKey {
        match self.key_mode {
            ReplayKeyMode::Structured => ReplayKey {
                app_id: app_id.to_string(),
                nonce: nonce.to_string(),
            },
            ReplayKeyMode::Concatenated => ReplayKey {
                app_id: format!("{app_id}{nonce}"),
                nonce: String::new(),
            },
        }
    }

    // Every critical section leaves the map consistent, so a poisoned lock
    // is still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<ReplayKey, ReplayEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    const NOW: i64 = 1_700_000_000;
    const WINDOW: u64 = 300;

    fn guard() -> ReplayGuard {
        ReplayGuard::default()
    }

    #[test]
    fn first_admit_accepted_second_rejected() {
        let guard = guard();
        assert_eq!(guard.admit("app1", "n1", NOW, NOW, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("app1", "n1", NOW, NOW, WINDOW), Admission::Rejected);
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn distinct_nonces_and_apps_are_independent() {
        let guard = guard();
        assert_eq!(guard.admit("app1", "n1", NOW, NOW, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("app1", "n2", NOW, NOW, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("app2", "n1", NOW, NOW, WINDOW), Admission::Accepted);
    }

    #[test]
    fn stale_request_rejected_without_caching() {
        let guard = guard();
        let stale = NOW - WINDOW as i64 - 1;
        assert_eq!(guard.admit("app1", "n1", stale, NOW, WINDOW), Admission::Rejected);
        assert!(guard.is_empty());

        // Exactly at the window edge is still fresh.
        let edge = NOW - WINDOW as i64;
        assert_eq!(guard.admit("app1", "n1", edge, NOW, WINDOW), Admission::Accepted);
    }

    #[test]
    fn future_skew_defaults_to_window() {
        let guard = guard();
        let ahead = NOW + WINDOW as i64;
        assert_eq!(guard.admit("app1", "n1", ahead, NOW, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("app1", "n2", ahead + 1, NOW, WINDOW), Admission::Rejected);
    }

    #[test]
    fn future_skew_bounded_and_unbounded() {
        let bounded = ReplayGuard::new(ReplayKeyMode::Structured, FutureSkew::Bounded(5));
        assert_eq!(bounded.admit("app1", "n1", NOW + 5, NOW, WINDOW), Admission::Accepted);
        assert_eq!(bounded.admit("app1", "n2", NOW + 6, NOW, WINDOW), Admission::Rejected);

        let unbounded = ReplayGuard::new(ReplayKeyMode::Structured, FutureSkew::Unbounded);
        assert_eq!(
            unbounded.admit("app1", "n1", NOW + 86_400 * 365, NOW, WINDOW),
            Admission::Accepted
        );
    }

    #[test]
    fn expired_entry_is_not_reported_present() {
        let guard = guard();
        assert_eq!(guard.admit("app1", "n1", NOW, NOW, WINDOW), Admission::Accepted);

        // The first token is stale by now; a new token may reuse the slot.
        let later = NOW + WINDOW as i64 + 1;
        assert_eq!(guard.admit("app1", "n1", NOW, later, WINDOW), Admission::Rejected);
        assert_eq!(guard.admit("app1", "n1", later, later, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("app1", "n1", later, later, WINDOW), Admission::Rejected);
    }

    #[test]
    fn replay_rejected_at_window_edge() {
        let guard = guard();
        let edge = NOW + WINDOW as i64;
        assert_eq!(guard.admit("app1", "n1", NOW, NOW, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("app1", "n1", NOW, edge, WINDOW), Admission::Rejected);
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn future_dated_token_held_until_it_goes_stale() {
        let guard = guard();
        let ts = NOW + 200;
        assert_eq!(guard.admit("app1", "n1", ts, NOW, WINDOW), Admission::Accepted);

        // Still fresh at every one of these server times.
        for now in [NOW + 301, NOW + 450, ts + WINDOW as i64] {
            assert_eq!(guard.admit("app1", "n1", ts, now, WINDOW), Admission::Rejected);
        }
        assert_eq!(guard.sweep(ts + WINDOW as i64), 0);
        assert_eq!(guard.sweep(ts + WINDOW as i64 + 1), 1);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let guard = guard();
        guard.admit("app1", "old", NOW, NOW, 10);
        guard.admit("app1", "new", NOW + 100, NOW + 100, 10);
        assert_eq!(guard.len(), 2);

        assert_eq!(guard.sweep(NOW + 10), 0);
        assert_eq!(guard.sweep(NOW + 11), 1);
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.sweep(NOW + 11), 0);
    }

    #[test]
    fn structured_keys_do_not_collide() {
        let guard = guard();
        assert_eq!(guard.admit("ab", "c", NOW, NOW, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("a", "bc", NOW, NOW, WINDOW), Admission::Accepted);
    }

    #[test]
    fn concatenated_keys_collide() {
        let guard = ReplayGuard::new(ReplayKeyMode::Concatenated, FutureSkew::Window);
        assert_eq!(guard.admit("ab", "c", NOW, NOW, WINDOW), Admission::Accepted);
        assert_eq!(guard.admit("a", "bc", NOW, NOW, WINDOW), Admission::Rejected);
    }

    #[test]
    fn concurrent_admits_accept_exactly_once() {
        let guard = Arc::new(guard());
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    guard.admit("app1", "shared", NOW, NOW, WINDOW)
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|a| *a == Admission::Accepted)
            .count();
        assert_eq!(accepted, 1);
    }

    #[tokio::test]
    async fn sweeper_stops_on_cancel() {
        let guard = Arc::new(guard());
        let shutdown = CancellationToken::new();
        let handle = guard.spawn_sweeper(Duration::from_secs(3600), shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
