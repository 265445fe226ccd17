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

//! The per-record payload stored by a [`crate::shard::Shard`].

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use parking_lot::Mutex;

/// A metadata value attached to an entry at creation time. Closed over a
/// small set of scalar kinds rather than an unconstrained `Box<dyn Any>` so
/// entries stay `Debug`-able and the crate stays free of `unsafe` downcasts.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Str(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

/// A single stored record.
///
/// `created_at <= accessed_at` holds for the lifetime of the entry.
/// `expires_at` of `None` means the entry never expires.
#[derive(Debug)]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
    pub created_at: Instant,
    accessed_at: Mutex<Instant>,
    access_count: AtomicU64,
    pub expires_at: Option<Instant>,
    pub metadata: Arc<HashMap<String, MetaValue>>,
    pub namespace: String,
}

impl<K, V> Entry<K, V> {
    pub fn new(
        key: K,
        value: V,
        ttl: Duration,
        namespace: String,
        metadata: Arc<HashMap<String, MetaValue>>,
    ) -> Self {
        let now = Instant::now();
        let expires_at = if ttl.is_zero() { None } else { Some(now + ttl) };
        Self {
            key,
            value,
            created_at: now,
            accessed_at: Mutex::new(now),
            access_count: AtomicU64::new(0),
            expires_at,
            metadata,
            namespace,
        }
    }

    /// Record a hit: bump the access counter and move the access timestamp
    /// forward. Safe to call while only holding a shared (read) lock on the
    /// owning shard — the counter is atomic and the timestamp is behind its
    /// own mutex, per `spec.md` §4.2's "mutation under a read lock" note.
    pub fn touch(&self) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        *self.accessed_at.lock() = Instant::now();
    }

    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Relaxed)
    }

    pub fn accessed_at(&self) -> Instant {
        *self.accessed_at.lock()
    }

    /// An entry is expired iff it carries an expiry and that expiry has
    /// strictly passed. There is no "unexpire" transition.
    pub fn is_expired(&self) -> bool {
        matches!(self.expires_at, Some(at) if Instant::now() > at)
    }

    /// Replace the value in place, as `set` does when overwriting an
    /// existing key. Does not reset `created_at`, `expires_at` or
    /// `namespace` — only `touch` bumps the access bookkeeping.
    pub fn replace_value(&mut self, value: V) {
        self.value = value;
    }
}
