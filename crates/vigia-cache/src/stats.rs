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

//! Cache statistics.

use crate::entry::CacheLayer;
use serde::Serialize;

/// Occupancy of one layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerStats {
    /// Which layer.
    pub layer: CacheLayer,
    /// Entries currently held.
    pub entries: usize,
    /// Configured capacity.
    pub capacity: usize,
    /// Sum of estimated payload sizes.
    pub bytes: usize,
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups served from any layer.
    pub hits: u64,
    /// Lookups that found nothing live.
    pub misses: u64,
    /// Entries removed to make room.
    pub evictions: u64,
    /// Entries removed because their TTL elapsed.
    pub expirations: u64,
    /// Copies made into a faster layer.
    pub promotions: u64,
    /// `hits / (hits + misses)` as a percentage, if any lookup happened.
    pub hit_rate: Option<f64>,
    /// Per-layer occupancy, fastest first.
    pub layers: Vec<LayerStats>,
}

impl CacheStats {
    /// Total entries across layers.
    pub fn total_entries(&self) -> usize {
        self.layers.iter().map(|l| l.entries).sum()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub promotions: u64,
}

impl Counters {
    pub fn hit_rate(&self) -> Option<f64> {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            None
        } else {
            Some(self.hits as f64 / lookups as f64 * 100.0)
        }
    }
}
