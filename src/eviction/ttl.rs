// Copyright 2026 Nearcache Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Supplementary TTL-sweeper policy.
//!
//! Tracks per-key expiry independently of the shard's own `Entry::is_expired`
//! check. A background ticker fires at `ttl / 2` and purges expired keys
//! from the policy's own tracking map; this does **not** remove entries from
//! shards (that stays driven by `Entry::is_expired` at lookup time, per
//! `spec.md` §4.3) — it only keeps `select_victim` honest for a cache that
//! wants TTL to double as an eviction signal.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::EvictionPolicy;

struct Inner<K> {
    expiry: HashMap<K, Instant>,
}

/// TTL-sweeper policy. `close()` stops the background ticker deterministically;
/// it also runs on `Drop` so a forgotten `close()` doesn't leak the thread.
pub struct TtlSweeper<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<Inner<K>>>,
    ttl: Duration,
    stop: crossbeam::channel::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl<K> TtlSweeper<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            expiry: HashMap::new(),
        }));
        let (stop_tx, stop_rx) = crossbeam::channel::bounded::<()>(0);
        let tick = if ttl.is_zero() { Duration::from_secs(1) } else { ttl / 2 };

        let sweep_inner = inner.clone();
        let handle = std::thread::spawn(move || loop {
            match stop_rx.recv_timeout(tick) {
                Ok(()) | Err(crossbeam::channel::RecvTimeoutError::Disconnected) => break,
                Err(crossbeam::channel::RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    let mut guard = sweep_inner.lock();
                    let before = guard.expiry.len();
                    guard.expiry.retain(|_, at| *at >= now);
                    let purged = before - guard.expiry.len();
                    if purged > 0 {
                        tracing::debug!(purged, "ttl sweeper purged tracking entries");
                    }
                }
            }
        });

        Self {
            inner,
            ttl,
            stop: stop_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stop the background ticker deterministically. Idempotent.
    pub fn close(&self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
        }
    }
}

impl<K> Drop for TtlSweeper<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}

impl<K> EvictionPolicy<K> for TtlSweeper<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn on_access(&self, _key: &K) {}

    fn on_add(&self, key: &K, _access_count: u64, created_at: Instant, _accessed_at: Instant) {
        self.inner
            .lock()
            .expiry
            .insert(key.clone(), created_at + self.ttl);
    }

    fn on_remove(&self, key: &K) {
        self.inner.lock().expiry.remove(key);
    }

    fn select_victim(&self) -> Option<K> {
        let now = Instant::now();
        self.inner
            .lock()
            .expiry
            .iter()
            .find(|(_, at)| **at <= now)
            .map(|(k, _)| k.clone())
    }

    fn len(&self) -> usize {
        self.inner.lock().expiry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Instant {
        Instant::now()
    }

    #[test]
    fn no_victim_before_expiry() {
        let sweeper: TtlSweeper<u32> = TtlSweeper::new(Duration::from_secs(60));
        sweeper.on_add(&1, 0, now(), now());
        assert_eq!(sweeper.select_victim(), None);
        sweeper.close();
    }

    #[test]
    fn victim_after_expiry() {
        let sweeper: TtlSweeper<u32> = TtlSweeper::new(Duration::from_millis(10));
        sweeper.on_add(&1, 0, now(), now());
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(sweeper.select_victim(), Some(1));
        sweeper.close();
    }

    #[test]
    fn close_is_idempotent_and_stops_thread() {
        let sweeper: TtlSweeper<u32> = TtlSweeper::new(Duration::from_millis(10));
        sweeper.close();
        sweeper.close();
    }

    #[test]
    fn on_remove_drops_tracking() {
        let sweeper: TtlSweeper<u32> = TtlSweeper::new(Duration::from_secs(60));
        sweeper.on_add(&1, 0, now(), now());
        sweeper.on_remove(&1);
        assert_eq!(sweeper.len(), 0);
        sweeper.close();
    }
}
