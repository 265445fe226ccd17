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

//! The cache facade: a vector of [`Shard`]s, key routing, and the
//! cross-shard similarity fallback.
//!
//! Grounded on the teacher's `Cache<K, V, H, E, I, S>` (shard vector built
//! from an options struct, hash-routed access) and `src/container.rs`'s
//! `Container` (shard count fixed at construction, `hash_and_shard` routing).

use std::hash::Hash;
use std::sync::Arc;

use itertools::Itertools;

use crate::{
    context::Context,
    error::{Error, Result},
    eviction::EvictionPolicy,
    options::{CacheBuilder, Options},
    shard::{Shard, SimilarMatch},
    similarity::{SimilarityBinding, SimilarityFn},
    stats::{ShardStats, Stats},
};

/// An in-process, sharded cache with an optional similarity-based fallback
/// lookup.
///
/// Keys are routed to a shard by hashing `format!("{key:?}")` with FNV-1a —
/// `spec.md` §9 names this the behavior-preserving routing path. Two keys
/// that format identically collide onto the same shard; this only affects
/// which shard owns a key, never correctness of lookup (`Eq` still decides
/// membership within the shard).
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    shards: Vec<Shard<K, V>>,
    similarity: Arc<SimilarityBinding<K>>,
    stats: Option<Vec<Arc<ShardStats>>>,
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

struct FormatHasher<'a, K: std::fmt::Debug>(&'a K);

impl<K> FormatHasher<'_, K>
where
    K: std::fmt::Debug,
{
    fn shard_index(&self, shard_count: usize) -> usize {
        let formatted = format!("{:?}", self.0);
        (fnv1a(formatted.as_bytes()) as usize) % shard_count
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Build a cache from validated [`Options`].
    pub fn new(options: Options<K>) -> Self {
        let similarity = Arc::new(SimilarityBinding::new(options.threshold));
        let per_shard_capacity = (options.max_size / options.shards.max(1)).max(1);

        let per_shard_stats = (0..options.shards)
            .map(|_| options.enable_stats.then(|| Arc::new(ShardStats::default())))
            .collect_vec();

        let shards = per_shard_stats
            .iter()
            .map(|shard_stats| {
                Shard::new(
                    per_shard_capacity,
                    options.ttl,
                    options.eviction.clone(),
                    similarity.clone(),
                    shard_stats.clone(),
                )
            })
            .collect_vec();

        tracing::debug!(shards = shards.len(), per_shard_capacity, "cache constructed");

        Self {
            shards,
            similarity,
            stats: options
                .enable_stats
                .then(|| per_shard_stats.into_iter().flatten().collect_vec()),
        }
    }

    /// Start building a cache with a fluent [`CacheBuilder`].
    pub fn builder() -> CacheBuilder<K> {
        CacheBuilder::new()
    }

    fn shard_for(&self, key: &K) -> &Shard<K, V> {
        let index = FormatHasher(key).shard_index(self.shards.len());
        &self.shards[index]
    }

    /// Exact-key lookup. `ctx.is_cancelled()` before the call short-circuits
    /// to `None`.
    pub fn get(&self, ctx: &Context, key: &K) -> Option<V> {
        self.shard_for(key).get(ctx, key)
    }

    /// Insert or overwrite. Returns [`Error::Cancelled`] if `ctx` was already
    /// cancelled; otherwise always succeeds.
    pub fn set(&self, ctx: &Context, key: K, value: V) -> Result<()> {
        let shard = self.shard_for(&key);
        if shard.set(ctx, key, value) {
            Ok(())
        } else {
            Err(Error::Cancelled)
        }
    }

    /// Remove a key. Returns whether a key was present.
    pub fn delete(&self, ctx: &Context, key: &K) -> bool {
        self.shard_for(key).delete(ctx, key)
    }

    /// Bind the cache-wide similarity function. Intended to be called once,
    /// before the cache is shared across threads that call `get_similar`;
    /// later calls replace the function for subsequent lookups (`spec.md`
    /// §4.1 leaves races during a live swap unspecified).
    pub fn with_similarity(&self, func: SimilarityFn<K>) {
        self.similarity.set(func);
    }

    /// Similarity-based fallback lookup: fan out across every shard, scoring
    /// each shard's best candidate, and pick the cache-wide best by score,
    /// breaking ties by lower shard index and then earlier insertion within
    /// that shard (the order `Shard::get_similar` already walks in). Returns
    /// the matched key and score alongside the value, per `spec.md` §4.1's
    /// `(value, matched_key, score, found)` result shape.
    ///
    /// Cancellation is polled between shards; a cancellation observed
    /// mid-fan-out returns `None` with whatever touches already landed on
    /// shards scanned before the flag was raised.
    pub fn get_similar(&self, ctx: &Context, query: &K) -> Option<SimilarMatch<K, V>> {
        if ctx.is_cancelled() {
            tracing::trace!("get_similar observed cancellation before fan-out");
            return None;
        }
        let mut best: Option<SimilarMatch<K, V>> = None;
        for shard in &self.shards {
            if ctx.is_cancelled() {
                tracing::trace!("get_similar observed cancellation between shards");
                return None;
            }
            let Some(found) = shard.get_similar(ctx, query) else {
                continue;
            };
            let better = match &best {
                None => true,
                Some(current) => found.score > current.score,
            };
            if better {
                best = Some(found);
            }
        }
        best
    }

    /// Total number of live entries across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregate stats across shards, or `None` if stats were not enabled at
    /// construction.
    pub fn stats(&self) -> Option<Stats> {
        self.stats.as_ref().map(|shards| {
            shards
                .iter()
                .fold(Stats::default(), |acc, s| acc.merge(s.snapshot()))
        })
    }
}

impl<K> Options<K>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    /// Build a [`Cache`] directly from this option set.
    pub fn build<V>(self) -> Cache<K, V>
    where
        V: Clone + Send + Sync + 'static,
    {
        Cache::new(self)
    }
}

impl<K> CacheBuilder<K>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Debug + 'static,
{
    /// Build the [`Cache`] directly, skipping the intermediate [`Options`].
    pub fn build<V>(self) -> Cache<K, V>
    where
        V: Clone + Send + Sync + 'static,
    {
        Cache::new(self.build_options())
    }
}
