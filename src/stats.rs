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

//! Per-shard atomic counters and their cache-wide aggregate.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters owned by one shard. Kept or skipped entirely depending on
/// `enable_stats` (see `spec.md` §6); when disabled, a shard's `ShardStats`
/// is simply never incremented and the aggregate reads back all zero.
#[derive(Default)]
pub struct ShardStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    similar_searches: AtomicU64,
    similar_hits: AtomicU64,
    evictions: AtomicU64,
    expired: AtomicU64,
}

macro_rules! counter_ops {
    ($($name:ident),+ $(,)?) => {
        impl ShardStats {
            $(
                pub fn $name(&self) {
                    self.$name.fetch_add(1, Ordering::Relaxed);
                }
            )+
        }
    };
}

counter_ops!(hits, misses, sets, deletes, similar_searches, similar_hits, evictions, expired);

/// Aggregated, cache-wide snapshot. Not an atomic cross-shard snapshot —
/// `spec.md` §5 explicitly does not promise one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub similar_searches: u64,
    pub similar_hits: u64,
    pub evictions: u64,
    pub expired: u64,
}

impl ShardStats {
    pub fn snapshot(&self) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            similar_searches: self.similar_searches.load(Ordering::Relaxed),
            similar_hits: self.similar_hits.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

impl Stats {
    pub fn merge(mut self, other: Stats) -> Self {
        self.hits += other.hits;
        self.misses += other.misses;
        self.sets += other.sets;
        self.deletes += other.deletes;
        self.similar_searches += other.similar_searches;
        self.similar_hits += other.similar_hits;
        self.evictions += other.evictions;
        self.expired += other.expired;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_are_zero() {
        let stats = ShardStats::default();
        assert_eq!(stats.snapshot(), Stats::default());
    }

    #[test]
    fn counters_increment_independently() {
        let stats = ShardStats::default();
        stats.hits();
        stats.hits();
        stats.misses();
        let snap = stats.snapshot();
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.sets, 0);
    }

    #[test]
    fn merge_sums_fields() {
        let a = Stats { hits: 1, misses: 2, ..Default::default() };
        let b = Stats { hits: 3, sets: 4, ..Default::default() };
        let merged = a.merge(b);
        assert_eq!(merged.hits, 4);
        assert_eq!(merged.misses, 2);
        assert_eq!(merged.sets, 4);
    }
}
