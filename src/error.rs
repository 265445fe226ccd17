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

//! Error taxonomy for the cache. Deliberately small: most operations signal
//! failure through their `bool`/`Option` return shape rather than a distinct
//! error (see `spec.md` §7).

use thiserror::Error;

/// Errors produced by cache operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned by [`crate::Cache::set`] when the ambient context was
    /// already cancelled before any mutation happened.
    #[error("operation cancelled before mutation")]
    Cancelled,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
