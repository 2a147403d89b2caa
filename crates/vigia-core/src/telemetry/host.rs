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

//! The read-only boundary to the host runtime's performance primitives.

use super::metrics::{MetricKind, MetricsSnapshot};
use serde::{Deserialize, Serialize};

/// Page/document lifecycle timings, in milliseconds from navigation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationTiming {
    /// Time until the document was parsed and ready.
    pub dom_content_loaded_ms: Option<f64>,
    /// Time until every subresource finished loading.
    pub load_complete_ms: Option<f64>,
    /// Time to first byte.
    pub time_to_first_byte_ms: Option<f64>,
}

/// Paint milestones, in milliseconds from navigation start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PaintTiming {
    /// First contentful paint.
    pub first_contentful_paint_ms: Option<f64>,
    /// Largest contentful paint.
    pub largest_contentful_paint_ms: Option<f64>,
}

/// A single user interaction and how long the host took to respond to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionTiming {
    /// Interaction kind, e.g. "click" or "keydown".
    pub name: String,
    /// Processing duration in milliseconds.
    pub duration_ms: f64,
}

/// A fetched resource and how long it took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceTiming {
    /// Resource URL or name.
    pub name: String,
    /// Fetch duration in milliseconds.
    pub duration_ms: f64,
    /// Transferred bytes, when known.
    pub transfer_size: Option<u64>,
}

/// Heap usage reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Bytes currently in use.
    pub used_bytes: u64,
    /// Upper bound the host will allow.
    pub limit_bytes: u64,
}

impl MemoryUsage {
    /// Usage as a percentage of the limit, or `None` when the limit is unknown.
    pub fn usage_percent(&self) -> Option<f64> {
        if self.limit_bytes == 0 {
            return None;
        }
        Some(self.used_bytes as f64 / self.limit_bytes as f64 * 100.0)
    }
}

/// Everything the host could measure at one point in time.
///
/// Every signal is optional; hosts fill in what they support.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSnapshot {
    /// Navigation timing, if the host has a document lifecycle.
    pub navigation: Option<NavigationTiming>,
    /// Paint timing.
    pub paint: Option<PaintTiming>,
    /// First input delay in milliseconds.
    pub first_input_delay_ms: Option<f64>,
    /// Cumulative layout shift score.
    pub cumulative_layout_shift: Option<f64>,
    /// Interactions completed since the previous snapshot.
    pub interactions: Vec<InteractionTiming>,
    /// Resources completed since the previous snapshot.
    pub resources: Vec<ResourceTiming>,
    /// Heap usage.
    pub memory: Option<MemoryUsage>,
    /// CPU load between 0.0 and 1.0.
    pub cpu_load: Option<f64>,
    /// Live component/node count.
    pub component_count: Option<u64>,
    /// Registered event listener count.
    pub listener_count: Option<u64>,
}

impl HostSnapshot {
    /// Writes every signal present in this snapshot into `out`.
    ///
    /// Interactions contribute both their mean ([`MetricKind::ResponseTimeMs`])
    /// and their maximum ([`MetricKind::SlowestInteractionMs`]).
    pub fn fill_metrics(&self, out: &mut MetricsSnapshot) {
        if let Some(nav) = &self.navigation {
            set_opt(out, MetricKind::DomContentLoadedMs, nav.dom_content_loaded_ms);
            set_opt(out, MetricKind::LoadCompleteMs, nav.load_complete_ms);
            set_opt(out, MetricKind::TimeToFirstByteMs, nav.time_to_first_byte_ms);
        }
        if let Some(paint) = &self.paint {
            set_opt(out, MetricKind::FirstContentfulPaintMs, paint.first_contentful_paint_ms);
            set_opt(
                out,
                MetricKind::LargestContentfulPaintMs,
                paint.largest_contentful_paint_ms,
            );
        }
        set_opt(out, MetricKind::FirstInputDelayMs, self.first_input_delay_ms);
        set_opt(out, MetricKind::CumulativeLayoutShift, self.cumulative_layout_shift);

        if !self.interactions.is_empty() {
            let total: f64 = self.interactions.iter().map(|i| i.duration_ms).sum();
            let slowest = self
                .interactions
                .iter()
                .map(|i| i.duration_ms)
                .fold(f64::MIN, f64::max);
            out.set(
                MetricKind::ResponseTimeMs,
                total / self.interactions.len() as f64,
            );
            out.set(MetricKind::SlowestInteractionMs, slowest);
        }

        if let Some(memory) = &self.memory {
            out.set(MetricKind::HeapUsedBytes, memory.used_bytes as f64);
            set_opt(out, MetricKind::MemoryUsagePercent, memory.usage_percent());
        }
        set_opt(out, MetricKind::CpuLoad, self.cpu_load);
        set_opt(out, MetricKind::ComponentCount, self.component_count.map(|c| c as f64));
        set_opt(out, MetricKind::ListenerCount, self.listener_count.map(|c| c as f64));
    }
}

fn set_opt(out: &mut MetricsSnapshot, kind: MetricKind, value: Option<f64>) {
    if let Some(v) = value {
        out.set(kind, v);
    }
}

/// A host runtime that can report its own performance.
///
/// Implementations must be read-only with respect to the host: taking a
/// snapshot never changes what the host is doing.
pub trait PerformanceSource: Send {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Reads whatever the host can currently measure.
    fn snapshot(&mut self) -> HostSnapshot;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_empty_snapshot_fills_nothing() {
        let mut out = MetricsSnapshot::new(Instant::now());
        HostSnapshot::default().fill_metrics(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_interactions_yield_mean_and_slowest() {
        let host = HostSnapshot {
            interactions: vec![
                InteractionTiming {
                    name: "click".into(),
                    duration_ms: 40.0,
                },
                InteractionTiming {
                    name: "keydown".into(),
                    duration_ms: 160.0,
                },
            ],
            ..Default::default()
        };
        let mut out = MetricsSnapshot::new(Instant::now());
        host.fill_metrics(&mut out);
        assert_eq!(out.get(MetricKind::ResponseTimeMs), Some(100.0));
        assert_eq!(out.get(MetricKind::SlowestInteractionMs), Some(160.0));
    }

    #[test]
    fn test_memory_percent_requires_limit() {
        let unknown = MemoryUsage {
            used_bytes: 10,
            limit_bytes: 0,
        };
        assert_eq!(unknown.usage_percent(), None);

        let host = HostSnapshot {
            memory: Some(MemoryUsage {
                used_bytes: 45,
                limit_bytes: 50,
            }),
            ..Default::default()
        };
        let mut out = MetricsSnapshot::new(Instant::now());
        host.fill_metrics(&mut out);
        assert_eq!(out.get(MetricKind::MemoryUsagePercent), Some(90.0));
        assert_eq!(out.get(MetricKind::HeapUsedBytes), Some(45.0));
    }
}
