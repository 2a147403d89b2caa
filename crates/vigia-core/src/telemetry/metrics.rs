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

//! Metric identifiers, the closed set of metric kinds, and sampled snapshots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::time::Instant;

/// A unique, structured identifier for a metric stream.
///
/// Composed of a namespace, a name, and optional sorted key/value labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricId {
    /// The broad category of the metric (e.g. "memory", "render").
    pub namespace: String,
    /// The specific name of the metric (e.g. "usage_percent").
    pub name: String,
    /// Optional key/value pairs, kept sorted by key.
    pub labels: Vec<(String, String)>,
}

impl MetricId {
    /// Creates a new `MetricId` with a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: Vec::new(),
        }
    }

    /// Adds a label, keeping labels sorted by key.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self.labels.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }

    /// Parses the `namespace:name` form produced by [`Display`]. Labels are not parsed.
    pub fn parse(text: &str) -> Option<Self> {
        let (namespace, name) = text.split_once(':')?;
        if namespace.is_empty() || name.is_empty() || name.contains('[') {
            return None;
        }
        Some(Self::new(namespace, name))
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            write!(f, "{}:{}", self.namespace, self.name)
        } else {
            let labels = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "{}:{}[{}]", self.namespace, self.name, labels)
        }
    }
}

/// Every runtime signal the governor knows how to sample, analyse and act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Heap usage as a percentage of the heap limit.
    MemoryUsagePercent,
    /// Heap usage in bytes.
    HeapUsedBytes,
    /// CPU load, 0.0 to 1.0.
    CpuLoad,
    /// Cache hit rate as a percentage.
    CacheHitRate,
    /// Renders observed since the previous sample.
    RenderCount,
    /// Errors observed since the previous sample.
    ErrorRate,
    /// Mean response time of interactions observed since the previous sample (ms).
    ResponseTimeMs,
    /// Slowest render observed since the previous sample (ms).
    RenderTimeMs,
    /// Live component/node count reported by the host.
    ComponentCount,
    /// Registered event listener count reported by the host.
    ListenerCount,
    /// DOM-content-loaded duration (ms).
    DomContentLoadedMs,
    /// Full load duration (ms).
    LoadCompleteMs,
    /// First contentful paint (ms).
    FirstContentfulPaintMs,
    /// Largest contentful paint (ms).
    LargestContentfulPaintMs,
    /// First input delay (ms).
    FirstInputDelayMs,
    /// Cumulative layout shift (unitless).
    CumulativeLayoutShift,
    /// Time to first byte (ms).
    TimeToFirstByteMs,
    /// Slowest user interaction observed since the previous sample (ms).
    SlowestInteractionMs,
}

impl MetricKind {
    /// All metric kinds, in declaration order.
    pub const ALL: [MetricKind; 18] = [
        MetricKind::MemoryUsagePercent,
        MetricKind::HeapUsedBytes,
        MetricKind::CpuLoad,
        MetricKind::CacheHitRate,
        MetricKind::RenderCount,
        MetricKind::ErrorRate,
        MetricKind::ResponseTimeMs,
        MetricKind::RenderTimeMs,
        MetricKind::ComponentCount,
        MetricKind::ListenerCount,
        MetricKind::DomContentLoadedMs,
        MetricKind::LoadCompleteMs,
        MetricKind::FirstContentfulPaintMs,
        MetricKind::LargestContentfulPaintMs,
        MetricKind::FirstInputDelayMs,
        MetricKind::CumulativeLayoutShift,
        MetricKind::TimeToFirstByteMs,
        MetricKind::SlowestInteractionMs,
    ];

    /// The stream identifier used when this kind is recorded for prediction.
    pub fn id(self) -> MetricId {
        let (namespace, name) = match self {
            MetricKind::MemoryUsagePercent => ("memory", "usage_percent"),
            MetricKind::HeapUsedBytes => ("memory", "heap_used_bytes"),
            MetricKind::CpuLoad => ("host", "cpu_load"),
            MetricKind::CacheHitRate => ("cache", "hit_rate"),
            MetricKind::RenderCount => ("render", "count"),
            MetricKind::ErrorRate => ("errors", "rate"),
            MetricKind::ResponseTimeMs => ("interaction", "response_time"),
            MetricKind::RenderTimeMs => ("render", "time"),
            MetricKind::ComponentCount => ("render", "component_count"),
            MetricKind::ListenerCount => ("render", "listener_count"),
            MetricKind::DomContentLoadedMs => ("navigation", "dom_content_loaded"),
            MetricKind::LoadCompleteMs => ("navigation", "load_complete"),
            MetricKind::FirstContentfulPaintMs => ("paint", "fcp"),
            MetricKind::LargestContentfulPaintMs => ("paint", "lcp"),
            MetricKind::FirstInputDelayMs => ("interaction", "fid"),
            MetricKind::CumulativeLayoutShift => ("layout", "cls"),
            MetricKind::TimeToFirstByteMs => ("navigation", "ttfb"),
            MetricKind::SlowestInteractionMs => ("interaction", "slowest"),
        };
        MetricId::new(namespace, name)
    }

    /// Unit of measurement, for display.
    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::MemoryUsagePercent | MetricKind::CacheHitRate => "%",
            MetricKind::HeapUsedBytes => "bytes",
            MetricKind::CpuLoad | MetricKind::CumulativeLayoutShift => "",
            MetricKind::RenderCount
            | MetricKind::ErrorRate
            | MetricKind::ComponentCount
            | MetricKind::ListenerCount => "count",
            _ => "ms",
        }
    }
}

impl Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// A timestamped set of sampled metric values.
///
/// Kinds the host could not measure are simply absent.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// When the snapshot was taken.
    pub taken_at: Instant,
    values: BTreeMap<MetricKind, f64>,
}

impl MetricsSnapshot {
    /// Creates an empty snapshot.
    pub fn new(taken_at: Instant) -> Self {
        Self {
            taken_at,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter.
    pub fn with(mut self, kind: MetricKind, value: f64) -> Self {
        self.set(kind, value);
        self
    }

    /// Sets a value. Non-finite values are ignored.
    pub fn set(&mut self, kind: MetricKind, value: f64) {
        if value.is_finite() {
            self.values.insert(kind, value);
        }
    }

    /// Returns the value for `kind`, if sampled.
    pub fn get(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    /// Returns `true` if `kind` was sampled.
    pub fn contains(&self, kind: MetricKind) -> bool {
        self.values.contains_key(&kind)
    }

    /// Iterates over all sampled values.
    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Number of sampled kinds.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was sampled.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copies the values into an ordered map, for status reports.
    pub fn to_map(&self) -> BTreeMap<MetricKind, f64> {
        self.values.clone()
    }

    /// Overlays every value present in `other` onto this snapshot.
    pub fn merge(&mut self, other: &MetricsSnapshot) {
        for (kind, value) in other.iter() {
            self.set(kind, value);
        }
    }
}
