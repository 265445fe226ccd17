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

//! Least-recently-used eviction.
//!
//! Expressed as a key-keyed doubly linked list (a `HashMap<K, Node<K>>` of
//! `prev`/`next` key links plus head/tail pointers) instead of an intrusive
//! list of raw pointers, per `spec.md` §9's invitation to prefer an
//! arena-of-nodes-indexed-by-map approach in ownership-checked languages.
//! `on_access`/`on_add`/`on_remove`/`select_victim` are all O(1).

use std::hash::Hash;
use std::time::Instant;

use hashbrown::HashMap;
use parking_lot::Mutex;

use super::EvictionPolicy;

struct Node<K> {
    prev: Option<K>,
    next: Option<K>,
}

struct Inner<K> {
    nodes: HashMap<K, Node<K>>,
    head: Option<K>, // most recently used
    tail: Option<K>, // least recently used
}

impl<K> Inner<K>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    fn unlink(&mut self, key: &K) {
        let Node { prev, next } = match self.nodes.get(key) {
            Some(node) => Node {
                prev: node.prev.clone(),
                next: node.next.clone(),
            },
            None => return,
        };

        match &prev {
            Some(p) => self.nodes.get_mut(p).unwrap().next = next.clone(),
            None => self.head = next.clone(),
        }
        match &next {
            Some(n) => self.nodes.get_mut(n).unwrap().prev = prev.clone(),
            None => self.tail = prev.clone(),
        }
    }

    fn push_front(&mut self, key: K) {
        let old_head = self.head.take();
        self.nodes.insert(
            key.clone(),
            Node {
                prev: None,
                next: old_head.clone(),
            },
        );
        if let Some(h) = &old_head {
            self.nodes.get_mut(h).unwrap().prev = Some(key.clone());
        }
        self.head = Some(key.clone());
        if self.tail.is_none() {
            self.tail = Some(key);
        }
    }

    fn move_to_front(&mut self, key: &K) {
        if self.head.as_ref() == Some(key) {
            return;
        }
        if self.nodes.contains_key(key) {
            self.unlink(key);
            self.nodes.remove(key);
        }
        self.push_front(key.clone());
    }
}

/// Shared, internally-synchronized LRU policy.
pub struct Lru<K> {
    inner: Mutex<Inner<K>>,
}

impl<K> Default for Lru<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Lru<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::new()),
        }
    }
}

impl<K> EvictionPolicy<K> for Lru<K>
where
    K: Eq + Hash + Clone + Send + Sync,
{
    fn on_access(&self, key: &K) {
        let mut inner = self.inner.lock();
        if inner.nodes.contains_key(key) {
            inner.move_to_front(key);
        }
    }

    fn on_add(&self, key: &K, _access_count: u64, _created_at: Instant, _accessed_at: Instant) {
        self.inner.lock().move_to_front(key);
    }

    fn on_remove(&self, key: &K) {
        let mut inner = self.inner.lock();
        inner.unlink(key);
        inner.nodes.remove(key);
    }

    fn select_victim(&self) -> Option<K> {
        self.inner.lock().tail.clone()
    }

    fn len(&self) -> usize {
        self.inner.lock().nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Instant {
        Instant::now()
    }

    #[test]
    fn victim_is_least_recently_used() {
        let lru: Lru<u32> = Lru::new();
        lru.on_add(&1, 0, now(), now());
        lru.on_add(&2, 0, now(), now());
        lru.on_add(&3, 0, now(), now());
        assert_eq!(lru.select_victim(), Some(1));
    }

    #[test]
    fn access_moves_to_front() {
        let lru: Lru<u32> = Lru::new();
        lru.on_add(&1, 0, now(), now());
        lru.on_add(&2, 0, now(), now());
        lru.on_add(&3, 0, now(), now());
        lru.on_access(&1);
        assert_eq!(lru.select_victim(), Some(2));
    }

    #[test]
    fn remove_unlinks_node() {
        let lru: Lru<u32> = Lru::new();
        lru.on_add(&1, 0, now(), now());
        lru.on_add(&2, 0, now(), now());
        lru.on_remove(&1);
        assert_eq!(lru.len(), 1);
        assert_eq!(lru.select_victim(), Some(2));
    }

    #[test]
    fn re_adding_existing_key_moves_to_front() {
        let lru: Lru<u32> = Lru::new();
        lru.on_add(&1, 0, now(), now());
        lru.on_add(&2, 0, now(), now());
        lru.on_add(&1, 0, now(), now());
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.select_victim(), Some(2));
    }

    #[test]
    fn empty_policy_has_no_victim() {
        let lru: Lru<u32> = Lru::new();
        assert_eq!(lru.select_victim(), None);
    }
}
