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

//! An in-process, sharded, thread-safe key-value cache with a pluggable
//! eviction policy and an optional similarity-based fallback lookup for
//! near-miss queries.
//!
//! ```
//! use nearcache::prelude::*;
//!
//! let cache: Cache<u32, String> = CacheBuilder::new()
//!     .shards(8)
//!     .max_size(10_000)
//!     .build();
//!
//! let ctx = Context::background();
//! cache.set(&ctx, 1, "hello".to_string()).unwrap();
//! assert_eq!(cache.get(&ctx, &1), Some("hello".to_string()));
//! ```

pub mod cache;
pub mod context;
pub mod entry;
pub mod error;
pub mod eviction;
pub mod options;
pub mod shard;
pub mod similarity;
pub mod stats;

pub use cache::Cache;
pub use context::Context;
pub use entry::{Entry, MetaValue};
pub use error::{Error, Result};
pub use eviction::EvictionPolicy;
pub use options::{CacheBuilder, Options};
pub use shard::SimilarMatch;
pub use similarity::{builtins, SimilarityFn};
pub use stats::Stats;

/// Convenience re-exports for the common call shape.
pub mod prelude {
    pub use crate::{Cache, CacheBuilder, Context, Error, EvictionPolicy, Options, SimilarMatch, Stats};
}
