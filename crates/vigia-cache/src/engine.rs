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

//! The tiered cache itself.

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, CacheLayer, CachePriority, CacheWeight};
use crate::stats::{CacheStats, Counters, LayerStats};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

/// Why an entry left the cache on the cache's own initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    /// Its TTL elapsed.
    Expired,
    /// Its layer was full.
    Capacity,
    /// It was dropped by an explicit trim.
    Trimmed,
}

/// Optional parameters of a put.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PutOptions {
    /// Lifetime; defaults to the target layer's TTL.
    pub ttl: Option<Duration>,
    /// Eviction priority; defaults to [`CachePriority::Medium`].
    pub priority: Option<CachePriority>,
    /// Target layer; defaults to a layer chosen by payload size.
    pub layer: Option<CacheLayer>,
}

impl PutOptions {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: CachePriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Forces the target layer.
    pub fn in_layer(mut self, layer: CacheLayer) -> Self {
        self.layer = Some(layer);
        self
    }
}

struct DeferredPut<V> {
    key: String,
    value: V,
    options: PutOptions,
}

/// Handed to the eviction listener.
///
/// The listener cannot touch the cache directly. Puts requested here are
/// queued and applied once the eviction that triggered the listener has
/// finished its bookkeeping.
pub struct EvictionContext<V> {
    pending: Vec<DeferredPut<V>>,
}

impl<V> EvictionContext<V> {
    /// Queues a put.
    pub fn put(&mut self, key: impl Into<String>, value: V, options: PutOptions) {
        self.pending.push(DeferredPut {
            key: key.into(),
            value,
            options,
        });
    }

    /// Number of queued puts.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

type EvictionListener<V> =
    Box<dyn FnMut(&str, &CacheEntry<V>, EvictionReason, &mut EvictionContext<V>) + Send>;

struct Slot<V> {
    entry: CacheEntry<V>,
    touch_seq: u64,
}

/// A three-layer cache with TTL expiry, priority/LRU eviction and promotion.
pub struct TieredCache<V> {
    config: CacheConfig,
    layers: [HashMap<String, Slot<V>>; 3],
    counters: Counters,
    touch_seq: u64,
    listener: Option<EvictionListener<V>>,
    in_eviction: bool,
    deferred: VecDeque<DeferredPut<V>>,
}

impl<V> fmt::Debug for TieredCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TieredCache")
            .field("l1", &self.layers[0].len())
            .field("l2", &self.layers[1].len())
            .field("l3", &self.layers[2].len())
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl<V: Clone + CacheWeight> Default for TieredCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl<V: Clone + CacheWeight> TieredCache<V> {
    /// Creates an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            layers: [HashMap::new(), HashMap::new(), HashMap::new()],
            counters: Counters::default(),
            touch_seq: 0,
            listener: None,
            in_eviction: false,
            deferred: VecDeque::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Installs a callback invoked for every entry the cache removes on its own.
    pub fn set_eviction_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&str, &CacheEntry<V>, EvictionReason, &mut EvictionContext<V>) + Send + 'static,
    {
        self.listener = Some(Box::new(listener));
    }

    /// Removes the eviction callback.
    pub fn clear_eviction_listener(&mut self) {
        self.listener = None;
    }

    /// Stores `value` under `key`, replacing every existing copy.
    ///
    /// Returns the layer the value landed in, or `None` if the target layer
    /// has no capacity.
    pub fn put(
        &mut self,
        key: impl Into<String>,
        value: V,
        options: PutOptions,
        now: Instant,
    ) -> Option<CacheLayer> {
        let key = key.into();
        if self.in_eviction {
            self.deferred.push_back(DeferredPut {
                key,
                value,
                options,
            });
            return None;
        }
        let placed = self.insert(key, value, options, now);
        self.apply_deferred(now);
        placed
    }

    /// Looks `key` up from the fastest layer down.
    ///
    /// Expired entries are removed and reported as a miss.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<V> {
        let found = CacheLayer::ALL.into_iter().find_map(|layer| {
            self.layers[layer.index()]
                .get(key)
                .map(|slot| (layer, slot.entry.is_expired(now)))
        });

        let Some((layer, expired)) = found else {
            self.counters.misses += 1;
            return None;
        };

        if expired {
            self.expire_everywhere(key);
            self.counters.misses += 1;
            self.apply_deferred(now);
            return None;
        }

        self.touch_seq += 1;
        let seq = self.touch_seq;
        let threshold = self.config.promotion_threshold;
        let slot = self.layers[layer.index()].get_mut(key)?;
        slot.entry.access_count = slot.entry.access_count.saturating_add(1);
        slot.entry.last_accessed_at = now;
        slot.touch_seq = seq;
        let value = slot.entry.value.clone();
        let promote = slot.entry.access_count > threshold;

        self.counters.hits += 1;
        if promote {
            if let Some(target) = layer.faster() {
                self.promote(key, layer, target, now);
            }
        }
        self.apply_deferred(now);
        Some(value)
    }

    /// Returns the fastest live copy of `key` without counting a lookup.
    pub fn peek(&self, key: &str, now: Instant) -> Option<&CacheEntry<V>> {
        CacheLayer::ALL
            .into_iter()
            .find_map(|layer| self.layers[layer.index()].get(key))
            .map(|slot| &slot.entry)
            .filter(|entry| !entry.is_expired(now))
    }

    /// The fastest layer holding `key`, live or not.
    pub fn layer_of(&self, key: &str) -> Option<CacheLayer> {
        CacheLayer::ALL
            .into_iter()
            .find(|layer| self.layers[layer.index()].contains_key(key))
    }

    /// Removes `key` from every layer. Returns whether anything was removed.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.remove_everywhere(key) > 0
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    /// Removes every expired entry. Returns how many were removed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let removed = CacheLayer::ALL
            .into_iter()
            .map(|layer| self.purge_layer(layer, now))
            .sum();
        self.apply_deferred(now);
        removed
    }

    /// Shrinks each layer to `fraction` of its capacity, expired entries first,
    /// then in eviction order. Returns how many entries were removed.
    pub fn trim_to(&mut self, fraction: f64, now: Instant) -> usize {
        let fraction = fraction.clamp(0.0, 1.0);
        let mut removed = 0;
        for layer in CacheLayer::ALL {
            let target = (self.config.layer(layer).max_entries as f64 * fraction).floor() as usize;
            removed += self.purge_layer(layer, now);
            while self.layers[layer.index()].len() > target {
                if !self.evict_one(layer, EvictionReason::Trimmed) {
                    break;
                }
                removed += 1;
            }
        }
        self.apply_deferred(now);
        removed
    }

    /// Drops low-priority entries that have not been read for `idle`.
    pub fn evict_cold(&mut self, idle: Duration, now: Instant) -> usize {
        let mut removed = 0;
        for layer in CacheLayer::ALL {
            let cold: Vec<String> = self.layers[layer.index()]
                .iter()
                .filter(|(_, slot)| {
                    slot.entry.priority == CachePriority::Low
                        && now.saturating_duration_since(slot.entry.last_accessed_at) >= idle
                })
                .map(|(key, _)| key.clone())
                .collect();
            for key in cold {
                if let Some(slot) = self.layers[layer.index()].remove(&key) {
                    self.counters.evictions += 1;
                    self.notify(&key, &slot.entry, EvictionReason::Trimmed);
                    removed += 1;
                }
            }
        }
        self.apply_deferred(now);
        removed
    }

    /// Raises entries read at least `min_accesses` times to high priority.
    pub fn boost_hot(&mut self, min_accesses: u32) -> usize {
        let mut boosted = 0;
        for slots in &mut self.layers {
            for slot in slots.values_mut() {
                if slot.entry.access_count >= min_accesses
                    && slot.entry.priority != CachePriority::High
                {
                    slot.entry.priority = CachePriority::High;
                    boosted += 1;
                }
            }
        }
        boosted
    }

    /// Entries held across all layers, counting promoted copies separately.
    pub fn len(&self) -> usize {
        self.layers.iter().map(HashMap::len).sum()
    }

    /// Returns `true` if no layer holds anything.
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(HashMap::is_empty)
    }

    /// Entries held by `layer`.
    pub fn layer_len(&self, layer: CacheLayer) -> usize {
        self.layers[layer.index()].len()
    }

    /// Hit rate as a percentage, if any lookup happened.
    pub fn hit_rate(&self) -> Option<f64> {
        self.counters.hit_rate()
    }

    /// Fraction of total capacity in use, 0.0 to 1.0.
    pub fn utilization(&self) -> f64 {
        let capacity = self.config.total_capacity();
        if capacity == 0 {
            return 0.0;
        }
        self.len() as f64 / capacity as f64
    }

    /// Current counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
            expirations: self.counters.expirations,
            promotions: self.counters.promotions,
            hit_rate: self.counters.hit_rate(),
            layers: CacheLayer::ALL
                .into_iter()
                .map(|layer| {
                    let slots = &self.layers[layer.index()];
                    LayerStats {
                        layer,
                        entries: slots.len(),
                        capacity: self.config.layer(layer).max_entries,
                        bytes: slots.values().map(|s| s.entry.size_bytes).sum(),
                    }
                })
                .collect(),
        }
    }

    fn insert(
        &mut self,
        key: String,
        value: V,
        options: PutOptions,
        now: Instant,
    ) -> Option<CacheLayer> {
        self.remove_everywhere(&key);

        let size_bytes = value.weight();
        let layer = options
            .layer
            .unwrap_or_else(|| self.config.layer_for_size(size_bytes));
        let layer_config = *self.config.layer(layer);
        if layer_config.max_entries == 0 {
            log::debug!("Cache: {:?} has no capacity, dropping '{}'", layer, key);
            return None;
        }

        self.make_room(layer, now);

        self.touch_seq += 1;
        let entry = CacheEntry {
            value,
            created_at: now,
            ttl: options.ttl.unwrap_or_else(|| layer_config.default_ttl()),
            priority: options.priority.unwrap_or_default(),
            access_count: 0,
            last_accessed_at: now,
            size_bytes,
        };
        self.layers[layer.index()].insert(
            key,
            Slot {
                entry,
                touch_seq: self.touch_seq,
            },
        );
        Some(layer)
    }

    fn promote(&mut self, key: &str, from: CacheLayer, to: CacheLayer, now: Instant) {
        if self.config.layer(to).max_entries == 0 {
            return;
        }
        let Some(source) = self.layers[from.index()].get(key) else {
            return;
        };
        let mut copy = source.entry.clone();
        copy.access_count = 0;
        let touch_seq = source.touch_seq;

        self.make_room(to, now);
        self.layers[to.index()].insert(
            key.to_owned(),
            Slot {
                entry: copy,
                touch_seq,
            },
        );
        self.counters.promotions += 1;
        log::trace!("Cache: promoted '{}' {:?} -> {:?}", key, from, to);
    }

    fn make_room(&mut self, layer: CacheLayer, now: Instant) {
        let capacity = self.config.layer(layer).max_entries;
        if self.layers[layer.index()].len() < capacity {
            return;
        }
        self.purge_layer(layer, now);
        while self.layers[layer.index()].len() >= capacity {
            if !self.evict_one(layer, EvictionReason::Capacity) {
                break;
            }
        }
    }

    /// Evicts the lowest-priority, least recently touched entry of `layer`.
    fn evict_one(&mut self, layer: CacheLayer, reason: EvictionReason) -> bool {
        let victim = self.layers[layer.index()]
            .iter()
            .min_by(|a, b| {
                a.1.entry
                    .priority
                    .cmp(&b.1.entry.priority)
                    .then(a.1.touch_seq.cmp(&b.1.touch_seq))
            })
            .map(|(key, _)| key.clone());

        let Some(key) = victim else {
            return false;
        };
        let Some(slot) = self.layers[layer.index()].remove(&key) else {
            return false;
        };
        self.counters.evictions += 1;
        log::trace!("Cache: evicted '{}' from {:?} ({:?})", key, layer, reason);
        self.notify(&key, &slot.entry, reason);
        true
    }

    fn purge_layer(&mut self, layer: CacheLayer, now: Instant) -> usize {
        let expired: Vec<String> = self.layers[layer.index()]
            .iter()
            .filter(|(_, slot)| slot.entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        let mut removed = 0;
        for key in expired {
            if let Some(slot) = self.layers[layer.index()].remove(&key) {
                self.counters.expirations += 1;
                self.notify(&key, &slot.entry, EvictionReason::Expired);
                removed += 1;
            }
        }
        removed
    }

    fn expire_everywhere(&mut self, key: &str) {
        for layer in CacheLayer::ALL {
            if let Some(slot) = self.layers[layer.index()].remove(key) {
                self.counters.expirations += 1;
                self.notify(key, &slot.entry, EvictionReason::Expired);
            }
        }
    }

    fn remove_everywhere(&mut self, key: &str) -> usize {
        self.layers
            .iter_mut()
            .filter_map(|layer| layer.remove(key))
            .count()
    }

    fn notify(&mut self, key: &str, entry: &CacheEntry<V>, reason: EvictionReason) {
        let Some(mut listener) = self.listener.take() else {
            return;
        };
        self.in_eviction = true;
        let mut ctx = EvictionContext {
            pending: Vec::new(),
        };
        listener(key, entry, reason, &mut ctx);
        self.in_eviction = false;
        self.listener = Some(listener);
        self.deferred.extend(ctx.pending);
    }

    fn apply_deferred(&mut self, now: Instant) {
        let mut applied = 0;
        while let Some(pending) = self.deferred.pop_front() {
            if applied >= self.config.max_deferred_puts {
                log::warn!(
                    "Cache: dropping {} puts queued during eviction",
                    self.deferred.len() + 1
                );
                self.deferred.clear();
                break;
            }
            self.insert(pending.key, pending.value, pending.options, now);
            applied += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerConfig;
    use std::sync::{Arc, Mutex};

    fn small_config(l1: usize, l2: usize, l3: usize) -> CacheConfig {
        let ttl = 60_000;
        CacheConfig {
            l1: LayerConfig {
                max_entries: l1,
                default_ttl_ms: ttl,
            },
            l2: LayerConfig {
                max_entries: l2,
                default_ttl_ms: ttl,
            },
            l3: LayerConfig {
                max_entries: l3,
                default_ttl_ms: ttl,
            },
            ..CacheConfig::default()
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_put_routes_by_size() {
        let mut cache = TieredCache::<String>::default();
        let now = Instant::now();
        assert_eq!(
            cache.put("small", "x".repeat(10), PutOptions::new(), now),
            Some(CacheLayer::L1)
        );
        assert_eq!(
            cache.put("medium", "x".repeat(2048), PutOptions::new(), now),
            Some(CacheLayer::L2)
        );
        assert_eq!(
            cache.put("large", "x".repeat(70_000), PutOptions::new(), now),
            Some(CacheLayer::L3)
        );
        assert_eq!(
            cache.put("hinted", "x".into(), PutOptions::new().in_layer(CacheLayer::L3), now),
            Some(CacheLayer::L3)
        );
        assert_eq!(cache.get("medium", now).map(|v| v.len()), Some(2048));
    }

    #[test]
    fn test_ttl_expiry_is_a_miss_and_never_resurrects() {
        let mut cache = TieredCache::<String>::default();
        let t0 = Instant::now();
        cache.put("k", "v".into(), PutOptions::new().with_ttl(ms(100)), t0);

        assert_eq!(cache.get("k", t0 + ms(50)).as_deref(), Some("v"));
        assert_eq!(cache.get("k", t0 + ms(101)), None);
        assert_eq!(cache.get("k", t0 + ms(102)), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_holds_after_every_put() {
        let mut cache = TieredCache::<String>::new(small_config(3, 2, 2));
        let now = Instant::now();
        for i in 0..20 {
            cache.put(format!("k{i}"), "v".into(), PutOptions::new(), now);
            assert!(cache.layer_len(CacheLayer::L1) <= 3);
        }
        assert_eq!(cache.layer_len(CacheLayer::L1), 3);
        assert_eq!(cache.stats().evictions, 17);
    }

    #[test]
    fn test_eviction_prefers_expired_then_low_priority_then_lru() {
        let mut cache = TieredCache::<String>::new(small_config(3, 1, 1));
        let t0 = Instant::now();
        cache.put(
            "short",
            "v".into(),
            PutOptions::new().with_ttl(ms(10)).with_priority(CachePriority::High),
            t0,
        );
        cache.put("a", "v".into(), PutOptions::new(), t0);
        cache.put("b", "v".into(), PutOptions::new(), t0);

        // Full: the expired high-priority entry goes first.
        cache.put("c", "v".into(), PutOptions::new(), t0 + ms(20));
        assert!(cache.peek("short", t0 + ms(20)).is_none());
        assert_eq!(cache.stats().expirations, 1);

        // "a" is the least recently touched entry.
        cache.put(
            "low",
            "v".into(),
            PutOptions::new().with_priority(CachePriority::Low),
            t0 + ms(30),
        );
        assert_eq!(cache.layer_of("a"), None);

        // Low priority beats recency.
        cache.get("b", t0 + ms(40));
        cache.put("d", "v".into(), PutOptions::new(), t0 + ms(50));
        assert_eq!(cache.layer_of("low"), None);
        assert_eq!(cache.layer_of("b"), Some(CacheLayer::L1));
        cache.put("e", "v".into(), PutOptions::new(), t0 + ms(60));
        assert_eq!(cache.layer_of("c"), None);
        assert_eq!(cache.layer_of("b"), Some(CacheLayer::L1));
    }

    #[test]
    fn test_promotion_copies_upward_with_same_expiry() {
        let mut cache = TieredCache::<String>::default();
        let t0 = Instant::now();
        cache.put(
            "hot",
            "v".into(),
            PutOptions::new().in_layer(CacheLayer::L3).with_ttl(ms(1000)),
            t0,
        );
        for i in 1..=3 {
            cache.get("hot", t0 + ms(i));
            assert_eq!(cache.layer_of("hot"), Some(CacheLayer::L3));
        }
        cache.get("hot", t0 + ms(4));
        assert_eq!(cache.layer_of("hot"), Some(CacheLayer::L2));
        assert_eq!(cache.layer_len(CacheLayer::L3), 1);
        assert_eq!(cache.stats().promotions, 1);

        let copy = cache.peek("hot", t0 + ms(5)).unwrap();
        assert_eq!(copy.created_at, t0);
        assert_eq!(copy.ttl, ms(1000));

        assert_eq!(cache.get("hot", t0 + ms(1001)), None);
        assert_eq!(cache.layer_of("hot"), None);
    }

    #[test]
    fn test_put_replaces_every_copy() {
        let mut cache = TieredCache::<String>::default();
        let t0 = Instant::now();
        cache.put("k", "old".into(), PutOptions::new().in_layer(CacheLayer::L2), t0);
        for _ in 0..4 {
            cache.get("k", t0);
        }
        assert_eq!(cache.len(), 2);

        cache.put("k", "new".into(), PutOptions::new().in_layer(CacheLayer::L3), t0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k", t0).as_deref(), Some("new"));
    }

    #[test]
    fn test_listener_puts_are_deferred_and_respect_capacity() {
        let mut cache = TieredCache::<String>::new(small_config(2, 0, 5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        cache.set_eviction_listener(move |key, entry, reason, ctx| {
            log.lock().unwrap().push((key.to_owned(), reason));
            if reason == EvictionReason::Capacity {
                ctx.put(
                    format!("spill_{key}"),
                    entry.value.clone(),
                    PutOptions::new().in_layer(CacheLayer::L3),
                );
            }
        });

        let now = Instant::now();
        for i in 0..4 {
            cache.put(format!("k{i}"), "v".into(), PutOptions::new(), now);
        }

        assert_eq!(cache.layer_len(CacheLayer::L1), 2);
        assert_eq!(cache.layer_len(CacheLayer::L3), 2);
        assert_eq!(cache.layer_of("spill_k0"), Some(CacheLayer::L3));
        assert_eq!(cache.layer_of("spill_k1"), Some(CacheLayer::L3));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_zero_capacity_layer_stores_nothing() {
        let mut cache = TieredCache::<String>::new(small_config(0, 1, 1));
        assert_eq!(cache.put("k", "v".into(), PutOptions::new(), Instant::now()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_trim_and_cold_eviction() {
        let mut cache = TieredCache::<String>::new(small_config(10, 10, 10));
        let t0 = Instant::now();
        for i in 0..10 {
            let priority = if i < 3 {
                CachePriority::Low
            } else {
                CachePriority::Medium
            };
            cache.put(
                format!("k{i}"),
                "v".into(),
                PutOptions::new().with_priority(priority),
                t0,
            );
        }
        assert!(cache.invalidate("k9"));
        assert!(!cache.invalidate("k9"));

        assert_eq!(cache.evict_cold(ms(500), t0 + ms(100)), 0);
        assert_eq!(cache.evict_cold(ms(500), t0 + ms(600)), 3);

        assert_eq!(cache.trim_to(0.5, t0 + ms(700)), 1);
        assert_eq!(cache.layer_len(CacheLayer::L1), 5);
        assert!((cache.utilization() - 5.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_requires_lookups() {
        let mut cache = TieredCache::<String>::default();
        let now = Instant::now();
        assert_eq!(cache.hit_rate(), None);
        cache.put("k", "v".into(), PutOptions::new(), now);
        cache.get("k", now);
        cache.get("missing", now);
        assert_eq!(cache.hit_rate(), Some(50.0));
        assert_eq!(cache.stats().total_entries(), 1);
    }

    #[test]
    fn test_boost_hot_raises_priority_once() {
        let mut cache = TieredCache::<String>::default();
        let now = Instant::now();
        cache.put("hot", "v".into(), PutOptions::new(), now);
        cache.put("cold", "v".into(), PutOptions::new(), now);
        cache.get("hot", now);
        cache.get("hot", now);

        assert_eq!(cache.boost_hot(2), 1);
        assert_eq!(cache.boost_hot(2), 0);
        assert_eq!(cache.peek("hot", now).map(|e| e.priority), Some(CachePriority::High));
        assert_eq!(cache.peek("cold", now).map(|e| e.priority), Some(CachePriority::Medium));
    }
}
