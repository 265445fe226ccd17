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

//! Recognized configuration options (`spec.md` §6) and the fluent builder
//! that validates them.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::eviction::EvictionPolicy;

/// Validated option set. Construct via [`CacheBuilder`], not directly.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Options<K> {
    pub(crate) shards: usize,
    pub(crate) max_size: usize,
    pub(crate) threshold: f32,
    pub(crate) ttl: Duration,
    pub(crate) enable_stats: bool,
    #[serde(skip)]
    pub(crate) eviction: Option<Arc<dyn EvictionPolicy<K>>>,
}

impl<K> Default for Options<K> {
    fn default() -> Self {
        Self {
            shards: 16,
            max_size: 1000,
            threshold: 0.8,
            ttl: Duration::ZERO,
            enable_stats: false,
            eviction: None,
        }
    }
}

/// Fluent, functional-style options builder. Invalid values are rejected
/// with a logged warning and the previous (default, or last-accepted) value
/// is retained — `spec.md` §6 explicitly permits silent-ignore; this crate
/// logs the rejection instead, matching the ambient logging the rest of the
/// crate does.
pub struct CacheBuilder<K> {
    options: Options<K>,
}

impl<K> Default for CacheBuilder<K> {
    fn default() -> Self {
        Self {
            options: Options::default(),
        }
    }
}

impl<K> CacheBuilder<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shards. Accepted range: `1..=256`.
    #[must_use]
    pub fn shards(mut self, shards: usize) -> Self {
        if (1..=256).contains(&shards) {
            self.options.shards = shards;
        } else {
            tracing::warn!(shards, "rejected out-of-range shard count, keeping previous value");
        }
        self
    }

    /// Total capacity across all shards. Accepted range: `> 0`.
    #[must_use]
    pub fn max_size(mut self, max_size: usize) -> Self {
        if max_size > 0 {
            self.options.max_size = max_size;
        } else {
            tracing::warn!("rejected zero max_size, keeping previous value");
        }
        self
    }

    /// Minimum similarity score for `get_similar`. Accepted range: `0.0..=1.0`.
    #[must_use]
    pub fn threshold(mut self, threshold: f32) -> Self {
        if (0.0..=1.0).contains(&threshold) {
            self.options.threshold = threshold;
        } else {
            tracing::warn!(threshold, "rejected out-of-range threshold, keeping previous value");
        }
        self
    }

    /// Eviction policy; `None` (the default) falls back to shard-local FIFO.
    #[must_use]
    pub fn eviction(mut self, policy: Arc<dyn EvictionPolicy<K>>) -> Self {
        self.options.eviction = Some(policy);
        self
    }

    /// Per-entry expiry; `Duration::ZERO` means no expiry. Negative
    /// durations don't exist in `Duration`, so there is nothing to reject
    /// here beyond the type system itself.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.options.ttl = ttl;
        self
    }

    /// Turn on per-shard atomic counters.
    #[must_use]
    pub fn enable_stats(mut self, enable: bool) -> Self {
        self.options.enable_stats = enable;
        self
    }

    pub(crate) fn build_options(self) -> Options<K> {
        self.options
    }
}
