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

//! Periodic sampling of the host plus counters pushed between samples.

use crate::insights;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};
use vigia_core::telemetry::ResourceTiming;
use vigia_core::{Insight, MetricKind, MetricsSnapshot, PerformanceSource};

/// Configuration for the [`TelemetryCollector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Samples kept in history.
    pub history_len: usize,
    /// Resource timings kept.
    pub resource_history_len: usize,
    /// How far back insight derivation looks, in milliseconds.
    pub insight_window_ms: u64,
}

impl TelemetryConfig {
    /// Insight window as a [`Duration`].
    pub fn insight_window(&self) -> Duration {
        Duration::from_millis(self.insight_window_ms)
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            history_len: 300,
            resource_history_len: 64,
            insight_window_ms: 60_000,
        }
    }
}

/// Counters accumulated between two samples.
#[derive(Debug, Default)]
struct Pending {
    errors: u64,
    renders: u64,
    slowest_render_ms: Option<f64>,
    response_times_ms: Vec<f64>,
    overrides: BTreeMap<MetricKind, f64>,
}

/// Samples a [`PerformanceSource`] and keeps a bounded history.
pub struct TelemetryCollector {
    config: TelemetryConfig,
    source: Box<dyn PerformanceSource>,
    history: VecDeque<MetricsSnapshot>,
    resources: VecDeque<(Instant, ResourceTiming)>,
    pending: Pending,
}

impl TelemetryCollector {
    /// Creates a collector reading from `source`.
    pub fn new(config: TelemetryConfig, source: Box<dyn PerformanceSource>) -> Self {
        log::info!("Telemetry: sampling from '{}'", source.name());
        Self {
            config,
            source,
            history: VecDeque::new(),
            resources: VecDeque::new(),
            pending: Pending::default(),
        }
    }

    /// Counts an application error toward the next sample.
    pub fn record_error(&mut self) {
        self.pending.errors += 1;
    }

    /// Counts a render toward the next sample, with its duration if known.
    pub fn record_render(&mut self, duration_ms: Option<f64>) {
        self.pending.renders += 1;
        if let Some(ms) = duration_ms.filter(|v| v.is_finite()) {
            let slowest = self.pending.slowest_render_ms.get_or_insert(ms);
            *slowest = slowest.max(ms);
        }
    }

    /// Records an observed response time toward the next sample.
    pub fn record_response_time(&mut self, ms: f64) {
        if ms.is_finite() {
            self.pending.response_times_ms.push(ms);
        }
    }

    /// Overrides a metric in the next sample.
    pub fn record_metric(&mut self, kind: MetricKind, value: f64) {
        if value.is_finite() {
            self.pending.overrides.insert(kind, value);
        }
    }

    /// Reads the host, folds in pushed counters, and appends the result to history.
    pub fn sample_once(&mut self, now: Instant) -> MetricsSnapshot {
        let host = self.source.snapshot();
        let mut snapshot = MetricsSnapshot::new(now);
        host.fill_metrics(&mut snapshot);

        for resource in host.resources {
            self.resources.push_back((now, resource));
        }
        while self.resources.len() > self.config.resource_history_len {
            self.resources.pop_front();
        }

        let pending = std::mem::take(&mut self.pending);
        snapshot.set(MetricKind::ErrorRate, pending.errors as f64);
        snapshot.set(MetricKind::RenderCount, pending.renders as f64);
        if let Some(ms) = pending.slowest_render_ms {
            snapshot.set(MetricKind::RenderTimeMs, ms);
        }
        if !pending.response_times_ms.is_empty() {
            let mut durations: Vec<f64> = host.interactions.iter().map(|i| i.duration_ms).collect();
            durations.extend(&pending.response_times_ms);
            let mean = durations.iter().sum::<f64>() / durations.len() as f64;
            let slowest = durations.iter().copied().fold(f64::MIN, f64::max);
            snapshot.set(MetricKind::ResponseTimeMs, mean);
            snapshot.set(MetricKind::SlowestInteractionMs, slowest);
        }
        for (kind, value) in pending.overrides {
            snapshot.set(kind, value);
        }

        self.history.push_back(snapshot.clone());
        while self.history.len() > self.config.history_len {
            self.history.pop_front();
        }
        log::debug!("Telemetry: sampled {} signals", snapshot.len());
        snapshot
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&MetricsSnapshot> {
        self.history.back()
    }

    /// Samples taken within `window` before `now`, oldest first.
    pub fn window(&self, window: Duration, now: Instant) -> impl Iterator<Item = &MetricsSnapshot> {
        self.history
            .iter()
            .filter(move |s| now.saturating_duration_since(s.taken_at) <= window)
    }

    /// Resource timings recorded within `window` before `now`.
    pub fn resources(&self, window: Duration, now: Instant) -> impl Iterator<Item = &ResourceTiming> {
        self.resources
            .iter()
            .filter(move |(at, _)| now.saturating_duration_since(*at) <= window)
            .map(|(_, r)| r)
    }

    /// Number of samples held.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Insights over the last `window`.
    pub fn derive_insights(&self, window: Duration, now: Instant) -> Vec<Insight> {
        insights::derive_insights(self.window(window, now), self.resources(window, now))
    }

    /// Top recommendations over the last `window`.
    pub fn recommendations(&self, window: Duration, now: Instant) -> Vec<String> {
        insights::recommendations(&self.derive_insights(window, now))
    }

    /// The active configuration.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

impl std::fmt::Debug for TelemetryCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryCollector")
            .field("source", &self.source.name())
            .field("history", &self.history.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}
