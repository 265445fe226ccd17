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

//! A policy that fans lifecycle callbacks out to an ordered list of
//! sub-policies.
//!
//! `select_victim` only ever consults sub-policy 0. Per `spec.md` §9 this is
//! documented as-is rather than "fixed" into a weighted vote: the weights
//! are notification-weighting plumbing, not an eviction-selection input, and
//! the spec explicitly asks implementers not to invent a weighted vote
//! without a concrete product requirement.

use std::time::Instant;

use super::EvictionPolicy;

/// Constructor error: the number of policies must match the number of
/// weights. This is a programmer error, not a runtime condition — `spec.md`
/// §7 allows combined-policy constructors to reject mismatched lengths.
#[derive(Debug, thiserror::Error)]
#[error("combined policy given {policies} policies but {weights} weights")]
pub struct WeightMismatch {
    policies: usize,
    weights: usize,
}

pub struct Combined<K> {
    policies: Vec<Box<dyn EvictionPolicy<K>>>,
    #[allow(dead_code)]
    weights: Vec<f64>,
}

impl<K> Combined<K> {
    /// `weights` are normalized to sum to 1.0 at construction.
    pub fn new(
        policies: Vec<Box<dyn EvictionPolicy<K>>>,
        weights: Vec<f64>,
    ) -> Result<Self, WeightMismatch> {
        if policies.len() != weights.len() {
            return Err(WeightMismatch {
                policies: policies.len(),
                weights: weights.len(),
            });
        }
        let total: f64 = weights.iter().sum();
        let normalized = if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            weights
        };
        Ok(Self {
            policies,
            weights: normalized,
        })
    }
}

impl<K> EvictionPolicy<K> for Combined<K>
where
    K: Send + Sync,
{
    fn on_access(&self, key: &K) {
        for policy in &self.policies {
            policy.on_access(key);
        }
    }

    fn on_add(&self, key: &K, access_count: u64, created_at: Instant, accessed_at: Instant) {
        for policy in &self.policies {
            policy.on_add(key, access_count, created_at, accessed_at);
        }
    }

    fn on_remove(&self, key: &K) {
        for policy in &self.policies {
            policy.on_remove(key);
        }
    }

    fn select_victim(&self) -> Option<K> {
        self.policies.first().and_then(|p| p.select_victim())
    }

    fn len(&self) -> usize {
        self.policies.first().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eviction::lru::Lru;

    #[test]
    fn mismatched_lengths_rejected() {
        let policies: Vec<Box<dyn EvictionPolicy<u32>>> = vec![Box::new(Lru::new())];
        let err = Combined::new(policies, vec![0.5, 0.5]).unwrap_err();
        assert_eq!(err.policies, 1);
        assert_eq!(err.weights, 2);
    }

    #[test]
    fn weights_are_normalized() {
        let policies: Vec<Box<dyn EvictionPolicy<u32>>> =
            vec![Box::new(Lru::new()), Box::new(Lru::new())];
        let combined = Combined::new(policies, vec![1.0, 3.0]).unwrap();
        assert!((combined.weights[0] - 0.25).abs() < 1e-9);
        assert!((combined.weights[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn select_victim_delegates_to_first_policy() {
        let first: Lru<u32> = Lru::new();
        first.on_add(&1, 0, Instant::now(), Instant::now());
        let second: Lru<u32> = Lru::new();
        second.on_add(&2, 0, Instant::now(), Instant::now());
        let policies: Vec<Box<dyn EvictionPolicy<u32>>> = vec![Box::new(first), Box::new(second)];
        let combined = Combined::new(policies, vec![0.5, 0.5]).unwrap();
        assert_eq!(combined.select_victim(), Some(1));
    }

    #[test]
    fn callbacks_fan_out_to_every_sub_policy() {
        let policies: Vec<Box<dyn EvictionPolicy<u32>>> =
            vec![Box::new(Lru::new()), Box::new(Lru::new())];
        let combined = Combined::new(policies, vec![0.5, 0.5]).unwrap();
        combined.on_add(&1, 0, Instant::now(), Instant::now());
        assert_eq!(combined.policies[0].len(), 1);
        assert_eq!(combined.policies[1].len(), 1);
    }
}
