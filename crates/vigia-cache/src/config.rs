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

//! Cache configuration.

use crate::entry::CacheLayer;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capacity and default lifetime of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// Maximum number of entries. A layer with zero capacity stores nothing.
    pub max_entries: usize,
    /// TTL applied when a put does not specify one, in milliseconds.
    pub default_ttl_ms: u64,
}

impl LayerConfig {
    /// Default TTL as a [`Duration`].
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }
}

/// Configuration for a [`TieredCache`](crate::TieredCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Fast layer.
    pub l1: LayerConfig,
    /// Middle layer.
    pub l2: LayerConfig,
    /// Slow layer.
    pub l3: LayerConfig,
    /// Payloads strictly smaller than this go to `L1` when no layer is requested.
    pub l1_max_bytes: usize,
    /// Payloads strictly smaller than this (and not `L1`) go to `L2`.
    pub l2_max_bytes: usize,
    /// An entry read more than this many times is copied into the next faster layer.
    pub promotion_threshold: u32,
    /// Upper bound on puts queued by the eviction listener and applied per operation.
    pub max_deferred_puts: usize,
}

impl CacheConfig {
    /// Configuration of `layer`.
    pub fn layer(&self, layer: CacheLayer) -> &LayerConfig {
        match layer {
            CacheLayer::L1 => &self.l1,
            CacheLayer::L2 => &self.l2,
            CacheLayer::L3 => &self.l3,
        }
    }

    /// Picks a layer for a payload of `size_bytes`.
    pub fn layer_for_size(&self, size_bytes: usize) -> CacheLayer {
        if size_bytes < self.l1_max_bytes {
            CacheLayer::L1
        } else if size_bytes < self.l2_max_bytes {
            CacheLayer::L2
        } else {
            CacheLayer::L3
        }
    }

    /// Sum of every layer's capacity.
    pub fn total_capacity(&self) -> usize {
        self.l1.max_entries + self.l2.max_entries + self.l3.max_entries
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            l1: LayerConfig {
                max_entries: 100,
                default_ttl_ms: 5 * 60 * 1000,
            },
            l2: LayerConfig {
                max_entries: 500,
                default_ttl_ms: 30 * 60 * 1000,
            },
            l3: LayerConfig {
                max_entries: 2000,
                default_ttl_ms: 2 * 60 * 60 * 1000,
            },
            l1_max_bytes: 1024,
            l2_max_bytes: 64 * 1024,
            promotion_threshold: 3,
            max_deferred_puts: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_for_size_boundaries() {
        let config = CacheConfig::default();
        assert_eq!(config.layer_for_size(0), CacheLayer::L1);
        assert_eq!(config.layer_for_size(1023), CacheLayer::L1);
        assert_eq!(config.layer_for_size(1024), CacheLayer::L2);
        assert_eq!(config.layer_for_size(64 * 1024 - 1), CacheLayer::L2);
        assert_eq!(config.layer_for_size(64 * 1024), CacheLayer::L3);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"promotion_threshold": 5}"#).unwrap();
        assert_eq!(config.promotion_threshold, 5);
        assert_eq!(config.l1.max_entries, 100);
    }
}
