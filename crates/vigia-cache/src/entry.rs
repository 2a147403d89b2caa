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

//! Cache entries, layers and priorities.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One of the three cache tiers. `L1` is the fastest and smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CacheLayer {
    /// Hot, small payloads.
    L1,
    /// Warm, medium payloads.
    L2,
    /// Cold, large payloads.
    L3,
}

impl CacheLayer {
    /// All layers, fastest first.
    pub const ALL: [CacheLayer; 3] = [CacheLayer::L1, CacheLayer::L2, CacheLayer::L3];

    /// Position in [`CacheLayer::ALL`].
    pub fn index(self) -> usize {
        match self {
            CacheLayer::L1 => 0,
            CacheLayer::L2 => 1,
            CacheLayer::L3 => 2,
        }
    }

    /// The next faster layer, if any.
    pub fn faster(self) -> Option<CacheLayer> {
        match self {
            CacheLayer::L1 => None,
            CacheLayer::L2 => Some(CacheLayer::L1),
            CacheLayer::L3 => Some(CacheLayer::L2),
        }
    }
}

/// Eviction priority. Lower priorities are evicted first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CachePriority {
    /// Evicted first.
    Low,
    /// The default.
    #[default]
    Medium,
    /// Evicted last.
    High,
}

/// Estimates how many bytes a cached value occupies.
pub trait CacheWeight {
    /// Approximate payload size in bytes.
    fn weight(&self) -> usize;
}

impl CacheWeight for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl CacheWeight for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl CacheWeight for serde_json::Value {
    fn weight(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }
}

/// A value held by exactly one layer.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached payload.
    pub value: V,
    /// When the value was first stored. Promotion keeps it.
    pub created_at: Instant,
    /// Lifetime measured from `created_at`.
    pub ttl: Duration,
    /// Eviction priority.
    pub priority: CachePriority,
    /// Reads served from this copy.
    pub access_count: u32,
    /// Last read, or `created_at` if never read.
    pub last_accessed_at: Instant,
    /// Estimated payload size.
    pub size_bytes: usize,
}

impl<V> CacheEntry<V> {
    /// Returns `true` once the entry has outlived its TTL.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) > self.ttl
    }

    /// Time left before expiry.
    pub fn remaining_ttl(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_ordering() {
        assert_eq!(CacheLayer::L3.faster(), Some(CacheLayer::L2));
        assert_eq!(CacheLayer::L1.faster(), None);
        assert!(CacheLayer::L1 < CacheLayer::L3);
        assert!(CachePriority::Low < CachePriority::High);
    }

    #[test]
    fn test_entry_expiry_is_strict() {
        let t0 = Instant::now();
        let entry = CacheEntry {
            value: 1u8,
            created_at: t0,
            ttl: Duration::from_millis(100),
            priority: CachePriority::Medium,
            access_count: 0,
            last_accessed_at: t0,
            size_bytes: 1,
        };
        assert!(!entry.is_expired(t0 + Duration::from_millis(100)));
        assert!(entry.is_expired(t0 + Duration::from_millis(101)));
        assert_eq!(
            entry.remaining_ttl(t0 + Duration::from_millis(40)),
            Duration::from_millis(60)
        );
    }

    #[test]
    fn test_json_weight() {
        let v = serde_json::json!({"a": "bcd"});
        assert_eq!(v.weight(), r#"{"a":"bcd"}"#.len());
    }
}
