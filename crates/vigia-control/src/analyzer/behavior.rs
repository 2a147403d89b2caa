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

//! Recurrence tracking for discrete user events.

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Upper bound on the staleness adjustment applied to a prediction.
const MAX_STALENESS: f64 = 4.0;

/// How often an event of a given kind and key has been seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviorPattern {
    /// Event kind, e.g. `"navigation"`.
    pub kind: String,
    /// Event key within the kind, e.g. a route.
    pub pattern_key: String,
    /// Times observed.
    pub frequency: u64,
    /// First observation.
    #[serde(skip)]
    pub first_seen_at: Instant,
    /// Latest observation.
    #[serde(skip)]
    pub last_seen_at: Instant,
    /// Estimated next occurrence. Requires two observations.
    #[serde(skip)]
    pub predicted_next_at: Option<Instant>,
}

impl BehaviorPattern {
    /// Average time between observations.
    pub fn mean_interval(&self) -> Option<Duration> {
        if self.frequency < 2 {
            return None;
        }
        let span = self.last_seen_at.saturating_duration_since(self.first_seen_at);
        Some(span.div_f64((self.frequency - 1) as f64))
    }

    /// Re-derives the next occurrence, stretched when the pattern has gone quiet.
    fn refresh_prediction(&mut self, now: Instant) {
        self.predicted_next_at = self.mean_interval().filter(|i| !i.is_zero()).and_then(|interval| {
            let elapsed = now.saturating_duration_since(self.last_seen_at);
            let staleness = (elapsed.as_secs_f64() / interval.as_secs_f64() - 1.0)
                .clamp(0.0, MAX_STALENESS);
            self.last_seen_at.checked_add(interval.mul_f64(1.0 + staleness))
        });
    }
}

/// Behavior patterns keyed by `(kind, key)`.
#[derive(Debug, Default)]
pub struct BehaviorTracker {
    patterns: HashMap<(String, String), BehaviorPattern>,
}

impl BehaviorTracker {
    /// Counts one occurrence.
    pub fn record(&mut self, kind: &str, key: &str, now: Instant) {
        let pattern = self
            .patterns
            .entry((kind.to_owned(), key.to_owned()))
            .or_insert_with(|| BehaviorPattern {
                kind: kind.to_owned(),
                pattern_key: key.to_owned(),
                frequency: 0,
                first_seen_at: now,
                last_seen_at: now,
                predicted_next_at: None,
            });
        pattern.frequency += 1;
        pattern.last_seen_at = now;
        pattern.refresh_prediction(now);
    }

    /// The `limit` most frequent patterns, optionally of one kind.
    ///
    /// Ties go to the most recently seen pattern.
    pub fn top(&mut self, kind: Option<&str>, limit: usize, now: Instant) -> Vec<BehaviorPattern> {
        let mut matching: Vec<&mut BehaviorPattern> = self
            .patterns
            .values_mut()
            .filter(|p| kind.map_or(true, |k| p.kind == k))
            .collect();
        matching.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then(b.last_seen_at.cmp(&a.last_seen_at))
                .then_with(|| a.pattern_key.cmp(&b.pattern_key))
        });
        matching
            .into_iter()
            .take(limit)
            .map(|p| {
                p.refresh_prediction(now);
                p.clone()
            })
            .collect()
    }

    /// Forgets patterns not seen within `retention`. Returns how many were removed.
    pub fn gc(&mut self, retention: Duration, now: Instant) -> usize {
        let before = self.patterns.len();
        self.patterns
            .retain(|_, p| now.saturating_duration_since(p.last_seen_at) <= retention);
        before - self.patterns.len()
    }

    /// Number of tracked patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_prediction_follows_mean_interval() {
        let t0 = Instant::now();
        let mut tracker = BehaviorTracker::default();
        tracker.record("navigation", "/planning", t0);
        tracker.record("navigation", "/planning", t0 + secs(10));
        tracker.record("navigation", "/planning", t0 + secs(20));

        let top = tracker.top(None, 5, t0 + secs(20));
        assert_eq!(top[0].frequency, 3);
        assert_eq!(top[0].predicted_next_at, Some(t0 + secs(30)));
    }

    #[test]
    fn test_stale_pattern_prediction_is_pushed_out() {
        let t0 = Instant::now();
        let mut tracker = BehaviorTracker::default();
        tracker.record("click", "save", t0);
        tracker.record("click", "save", t0 + secs(10));

        // 30 s of silence on a 10 s rhythm: staleness 2, next at last + 3 intervals.
        let top = tracker.top(Some("click"), 5, t0 + secs(40));
        assert_eq!(top[0].predicted_next_at, Some(t0 + secs(40)));

        // Staleness saturates.
        let top = tracker.top(Some("click"), 5, t0 + secs(1000));
        assert_eq!(top[0].predicted_next_at, Some(t0 + secs(60)));
    }

    #[test]
    fn test_mean_interval_handles_counts_past_u32() {
        let t0 = Instant::now();
        let pattern = BehaviorPattern {
            kind: "poll".into(),
            pattern_key: "tick".into(),
            frequency: u64::from(u32::MAX) + 2,
            first_seen_at: t0,
            last_seen_at: t0 + secs(1 << 32),
            predicted_next_at: None,
        };
        assert_eq!(pattern.mean_interval(), Some(secs(1)));
    }

    #[test]
    fn test_top_filters_orders_and_limits() {
        let t0 = Instant::now();
        let mut tracker = BehaviorTracker::default();
        for i in 0..7u64 {
            for _ in 0..=i {
                tracker.record("navigation", &format!("/r{i}"), t0);
            }
        }
        tracker.record("click", "x", t0);

        let top = tracker.top(Some("navigation"), 5, t0);
        let keys: Vec<&str> = top.iter().map(|p| p.pattern_key.as_str()).collect();
        assert_eq!(keys, vec!["/r6", "/r5", "/r4", "/r3", "/r2"]);
        assert!(top.iter().all(|p| p.predicted_next_at.is_none()));
        assert_eq!(tracker.top(None, 10, t0).len(), 8);
    }

    #[test]
    fn test_gc_drops_only_expired_patterns() {
        let t0 = Instant::now();
        let mut tracker = BehaviorTracker::default();
        tracker.record("a", "old", t0);
        tracker.record("a", "new", t0 + secs(100));
        assert_eq!(tracker.gc(secs(50), t0 + secs(120)), 1);
        assert_eq!(tracker.len(), 1);
    }
}
