// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Vigia Cache
//!
//! A three-layer in-memory cache. Small payloads land in the fast `L1`
//! layer, larger ones further down. Entries expire by TTL, are evicted by
//! priority then recency, and frequently read entries are copied into the
//! next faster layer.
//!
//! The cache never reads the wall clock: every operation takes `now`.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod entry;
pub mod stats;

pub use config::{CacheConfig, LayerConfig};
pub use engine::{EvictionContext, EvictionReason, PutOptions, TieredCache};
pub use entry::{CacheEntry, CacheLayer, CachePriority, CacheWeight};
pub use stats::{CacheStats, LayerStats};
