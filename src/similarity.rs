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

//! The similarity-function contract and a shared, settable binding of a
//! function plus threshold (`spec.md` §4.4, §4.1).

use std::sync::Arc;

use parking_lot::RwLock;

/// `sim(a, b) -> [0.0, 1.0]`, 1.0 meaning identical. Must be total; the core
/// calls it under a shard read lock, so implementations must not block on
/// I/O or attempt to acquire cache locks.
pub type SimilarityFn<K> = Arc<dyn Fn(&K, &K) -> f32 + Send + Sync>;

/// The cache-wide similarity binding: a settable function slot plus a fixed
/// threshold. Shared (one instance) across every shard of a `Cache`. The
/// function starts absent, so `get_similar` never matches until
/// `Cache::with_similarity` is called — matching `spec.md` §4.1's
/// "the similarity function is initially absent".
pub struct SimilarityBinding<K> {
    func: RwLock<Option<SimilarityFn<K>>>,
    threshold: f32,
}

impl<K> SimilarityBinding<K> {
    pub fn new(threshold: f32) -> Self {
        Self {
            func: RwLock::new(None),
            threshold,
        }
    }

    pub fn set(&self, func: SimilarityFn<K>) {
        *self.func.write() = Some(func);
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn score(&self, a: &K, b: &K) -> Option<f32> {
        self.func.read().as_ref().map(|f| f(a, b))
    }
}

/// Built-in distance functions, enumerated per `spec.md` §6 as swappable
/// (they're not the hard part of this crate) but still shipped so the crate
/// is usable without pulling in a separate string-distance dependency.
pub mod builtins {
    /// Normalized Levenshtein similarity over `&str`: `1 - edit_distance / max_len`.
    pub fn levenshtein(a: &str, b: &str) -> f32 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let distance = levenshtein_distance(&a, &b);
        normalize(distance, a.len().max(b.len()))
    }

    fn levenshtein_distance(a: &[char], b: &[char]) -> usize {
        let (n, m) = (a.len(), b.len());
        let mut row: Vec<usize> = (0..=m).collect();
        for i in 1..=n {
            let mut prev_diag = row[0];
            row[0] = i;
            for j in 1..=m {
                let temp = row[j];
                row[j] = if a[i - 1] == b[j - 1] {
                    prev_diag
                } else {
                    1 + row[j].min(row[j - 1]).min(prev_diag)
                };
                prev_diag = temp;
            }
        }
        row[m]
    }

    /// Normalized Damerau-Levenshtein similarity over `&str` (allows
    /// adjacent-transposition as a single edit, unlike plain Levenshtein).
    pub fn damerau_levenshtein(a: &str, b: &str) -> f32 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let distance = damerau_distance(&a, &b);
        normalize(distance, a.len().max(b.len()))
    }

    fn damerau_distance(a: &[char], b: &[char]) -> usize {
        let (n, m) = (a.len(), b.len());
        let mut d = vec![vec![0usize; m + 1]; n + 1];
        for (i, row) in d.iter_mut().enumerate().take(n + 1) {
            row[0] = i;
        }
        for j in 0..=m {
            d[0][j] = j;
        }
        for i in 1..=n {
            for j in 1..=m {
                let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
                d[i][j] = (d[i - 1][j] + 1)
                    .min(d[i][j - 1] + 1)
                    .min(d[i - 1][j - 1] + cost);
                if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                    d[i][j] = d[i][j].min(d[i - 2][j - 2] + cost);
                }
            }
        }
        d[n][m]
    }

    /// Normalized Hamming similarity over equal-length `&str`; unequal
    /// lengths are padded conceptually to the longer length (every excess
    /// character counts as a mismatch).
    pub fn hamming(a: &str, b: &str) -> f32 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let max_len = a.len().max(b.len());
        if max_len == 0 {
            return 1.0;
        }
        let mismatches = (0..max_len)
            .filter(|&i| a.get(i) != b.get(i))
            .count();
        normalize(mismatches, max_len)
    }

    /// Similarity from Euclidean distance over equal-dimension vectors,
    /// folded into `[0, 1]` via `1 / (1 + distance)`.
    pub fn euclidean(a: &[f64], b: &[f64]) -> f32 {
        let sum_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
        fold_distance(sum_sq.sqrt())
    }

    /// Similarity from Manhattan distance over equal-dimension vectors,
    /// folded into `[0, 1]` via `1 / (1 + distance)`.
    pub fn manhattan(a: &[f64], b: &[f64]) -> f32 {
        let sum: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum();
        fold_distance(sum)
    }

    fn normalize(distance: usize, max_len: usize) -> f32 {
        if max_len == 0 {
            1.0
        } else {
            1.0 - (distance as f32 / max_len as f32)
        }
    }

    fn fold_distance(distance: f64) -> f32 {
        (1.0 / (1.0 + distance)) as f32
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_starts_absent() {
        let binding: SimilarityBinding<u32> = SimilarityBinding::new(0.8);
        assert_eq!(binding.score(&1, &2), None);
    }

    #[test]
    fn binding_can_be_set_once() {
        let binding: SimilarityBinding<u32> = SimilarityBinding::new(0.8);
        binding.set(Arc::new(|a: &u32, b: &u32| if a == b { 1.0 } else { 0.0 }));
        assert_eq!(binding.score(&1, &1), Some(1.0));
        assert_eq!(binding.score(&1, &2), Some(0.0));
    }
}
