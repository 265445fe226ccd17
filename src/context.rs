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

//! The ambient context carried into every cache operation: an optional
//! namespace, free-form metadata, and a cancellation signal. The core never
//! mutates a [`Context`]; `with_*` methods return a new carrier.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::entry::MetaValue;

/// A cancellation signal observable as a "done" condition.
///
/// Implementations must not block and must not acquire cache locks — the
/// core polls this from inside shard locks.
pub trait Cancellation: Send + Sync {
    fn is_cancelled(&self) -> bool;
}

/// A cancellation signal that never fires.
struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A simple `Arc<AtomicBool>`-backed cancellation flag a caller can flip
/// from another thread, or use with a deadline-polling timer to express a
/// timeout (`spec.md` §5 notes timeouts are expressed this way; the core
/// does not enforce them internally).
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Cancellation for CancellationFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ambient per-call context: namespace, metadata, and cancellation.
///
/// Cloning a `Context` is cheap (it's `Arc` internals); `with_namespace` and
/// `with_metadata` produce a new carrier rather than mutating in place.
#[derive(Clone)]
pub struct Context {
    namespace: String,
    metadata: Arc<HashMap<String, MetaValue>>,
    cancellation: Arc<dyn Cancellation>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            metadata: Arc::new(HashMap::new()),
            cancellation: Arc::new(NeverCancel),
        }
    }
}

impl Context {
    /// A context that is never cancelled and carries no namespace or
    /// metadata.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context bound to a cancellation signal, otherwise empty.
    pub fn with_cancellation(cancellation: Arc<dyn Cancellation>) -> Self {
        Self {
            cancellation,
            ..Self::default()
        }
    }

    /// Returns a new carrier tagging operations with `namespace`.
    #[must_use]
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            metadata: self.metadata.clone(),
            cancellation: self.cancellation.clone(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns a new carrier with augmented metadata (copy-on-write: `self`
    /// is unchanged).
    #[must_use]
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        let mut metadata = (*self.metadata).clone();
        metadata.insert(key.into(), value.into());
        Self {
            namespace: self.namespace.clone(),
            metadata: Arc::new(metadata),
            cancellation: self.cancellation.clone(),
        }
    }

    pub fn metadata(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.get(key)
    }

    /// The full metadata map, shared (not copied) with this carrier. Used by
    /// [`crate::shard::Shard::set`] to attach the ambient metadata to a newly
    /// created [`crate::entry::Entry`].
    pub fn metadata_map(&self) -> Arc<HashMap<String, MetaValue>> {
        self.metadata.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_namespace_is_empty() {
        assert_eq!(Context::background().namespace(), "");
    }

    #[test]
    fn with_namespace_does_not_mutate_original() {
        let base = Context::background();
        let ns = base.with_namespace("a");
        assert_eq!(base.namespace(), "");
        assert_eq!(ns.namespace(), "a");
    }

    #[test]
    fn with_metadata_is_copy_on_write() {
        let base = Context::background().with_metadata("k", "v1");
        let next = base.with_metadata("k", "v2");
        assert_eq!(base.metadata("k"), Some(&MetaValue::from("v1")));
        assert_eq!(next.metadata("k"), Some(&MetaValue::from("v2")));
    }

    #[test]
    fn metadata_map_reflects_all_entries() {
        let ctx = Context::background().with_metadata("a", "1").with_metadata("b", 2i64);
        let map = ctx.metadata_map();
        assert_eq!(map.get("a"), Some(&MetaValue::from("1")));
        assert_eq!(map.get("b"), Some(&MetaValue::from(2i64)));
    }

    #[test]
    fn cancellation_flag_observed() {
        let flag = CancellationFlag::new();
        let ctx = Context::with_cancellation(Arc::new(flag.clone()));
        assert!(!ctx.is_cancelled());
        flag.cancel();
        assert!(ctx.is_cancelled());
    }
}
