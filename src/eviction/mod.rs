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

//! Pluggable eviction. A single [`EvictionPolicy`] instance is shared by
//! every shard of a [`crate::Cache`]; implementations must be internally
//! synchronized, since the shard lock only guards the shard's own map.

pub mod combined;
pub mod lru;
pub mod ttl;

use std::time::Instant;

/// Lifecycle callbacks an eviction policy receives, plus victim selection.
///
/// All methods take `&self`: policies own their synchronization (typically
/// one internal `parking_lot::Mutex`), because the caller only holds its
/// shard's lock, not a lock over the policy.
pub trait EvictionPolicy<K>: Send + Sync {
    /// Called after every exact-hit and every similar-hit.
    fn on_access(&self, key: &K);

    /// Called after insertion of a new key.
    fn on_add(&self, key: &K, access_count: u64, created_at: Instant, accessed_at: Instant);

    /// Called after deletion or eviction of a key.
    fn on_remove(&self, key: &K);

    /// Choose a key to evict. `None` means the policy has no suggestion;
    /// the shard tolerates transient overflow in that case rather than
    /// treating it as an error.
    fn select_victim(&self) -> Option<K>;

    /// Number of keys currently tracked by the policy.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
