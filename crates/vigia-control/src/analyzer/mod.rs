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

//! Short-horizon forecasting of metric streams and recurrence of user behavior.
//!
//! Streams are keyed by [`MetricId`]. A forecast needs at least
//! [`AnalyzerConfig::min_points`] observations; with fewer the analyzer
//! answers `None` rather than guessing.

mod behavior;
mod stream;

pub use behavior::{BehaviorPattern, BehaviorTracker};
pub use stream::{DataPoint, MetricStream, STREAM_CAPACITY};

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use vigia_core::{MetricId, MetricKind, MetricsSnapshot};

/// Direction of a metric's trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// Rising faster than the trend epsilon.
    Increasing,
    /// Falling faster than the trend epsilon.
    Decreasing,
    /// Neither.
    Stable,
}

/// Which side of a threshold is bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    /// Values above the threshold are bad.
    Above,
    /// Values below the threshold are bad.
    Below,
}

/// Warning and critical levels of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamThresholds {
    /// Warning level.
    pub warning: f64,
    /// Critical level.
    pub critical: f64,
    /// Which side is bad.
    pub direction: ThresholdDirection,
}

impl StreamThresholds {
    /// Thresholds where higher is worse.
    pub const fn above(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: ThresholdDirection::Above,
        }
    }

    /// Thresholds where lower is worse.
    pub const fn below(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: ThresholdDirection::Below,
        }
    }

    /// Signed distance past the warning level, in units of the warning-to-critical gap.
    fn position(&self, value: f64) -> f64 {
        let gap = (self.critical - self.warning).abs().max(f64::EPSILON);
        match self.direction {
            ThresholdDirection::Above => (value - self.warning) / gap,
            ThresholdDirection::Below => (self.warning - value) / gap,
        }
    }

    fn breached(&self, value: f64) -> bool {
        self.position(value) >= 0.0
    }

    fn toward(&self, trend: Trend) -> bool {
        matches!(
            (self.direction, trend),
            (ThresholdDirection::Above, Trend::Increasing)
                | (ThresholdDirection::Below, Trend::Decreasing)
        )
    }
}

/// A forecast for one stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Projected value `horizon` samples ahead.
    pub next_value: f64,
    /// 0.1 to 1.0; lower when the stream is noisy.
    pub confidence: f64,
    /// Trajectory.
    pub trend: Trend,
    /// Population standard deviation of the stream.
    pub volatility: f64,
    /// Likelihood of crossing into the warning band, 0.0 to 1.0.
    pub alert_probability: f64,
    /// Time until the warning level is reached at the current pace.
    #[serde(rename = "time_to_alert_ms", serialize_with = "serialize_opt_ms")]
    pub time_to_alert: Option<Duration>,
}

fn serialize_opt_ms<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(d) => s.serialize_some(&(d.as_millis() as u64)),
        None => s.serialize_none(),
    }
}

/// Configuration for the [`PredictiveAnalyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Observations needed before a forecast is produced.
    pub min_points: usize,
    /// Slopes no steeper than this are [`Trend::Stable`].
    pub trend_epsilon: f64,
    /// Smoothing factor of the moving average.
    pub ema_alpha: f64,
    /// Samples ahead used by the periodic forecast refresh.
    pub horizon: u32,
    /// Behavior patterns not seen for this long are forgotten, in milliseconds.
    pub behavior_retention_ms: u64,
    /// Patterns returned by a behavior forecast.
    pub behavior_top_n: usize,
    /// Per-metric thresholds.
    pub thresholds: BTreeMap<MetricKind, StreamThresholds>,
}

impl AnalyzerConfig {
    /// Behavior retention as a [`Duration`].
    pub fn behavior_retention(&self) -> Duration {
        Duration::from_millis(self.behavior_retention_ms)
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let thresholds = BTreeMap::from([
            (MetricKind::MemoryUsagePercent, StreamThresholds::above(70.0, 85.0)),
            (MetricKind::ResponseTimeMs, StreamThresholds::above(200.0, 500.0)),
            (MetricKind::ErrorRate, StreamThresholds::above(1.0, 3.0)),
            (MetricKind::RenderTimeMs, StreamThresholds::above(100.0, 200.0)),
            (MetricKind::CacheHitRate, StreamThresholds::below(60.0, 40.0)),
        ]);
        Self {
            min_points: 10,
            trend_epsilon: 0.1,
            ema_alpha: 0.3,
            horizon: 1,
            behavior_retention_ms: 7 * 24 * 60 * 60 * 1000,
            behavior_top_n: 5,
            thresholds,
        }
    }
}

/// Keeps bounded metric streams and forecasts them.
#[derive(Debug)]
pub struct PredictiveAnalyzer {
    config: AnalyzerConfig,
    streams: HashMap<MetricId, MetricStream>,
    thresholds: HashMap<MetricId, StreamThresholds>,
    behaviors: BehaviorTracker,
}

impl Default for PredictiveAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl PredictiveAnalyzer {
    /// Creates an analyzer with the configured thresholds registered.
    pub fn new(config: AnalyzerConfig) -> Self {
        let thresholds = config
            .thresholds
            .iter()
            .map(|(kind, t)| (kind.id(), *t))
            .collect();
        Self {
            config,
            streams: HashMap::new(),
            thresholds,
            behaviors: BehaviorTracker::default(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Appends a point to `stream`, creating it on first use.
    pub fn record(&mut self, stream: &MetricId, value: f64, metadata: Option<String>, now: Instant) {
        if !value.is_finite() {
            log::debug!("Analyzer: ignoring non-finite value for '{}'", stream);
            return;
        }
        self.streams.entry(stream.clone()).or_default().push(DataPoint {
            timestamp: now,
            value,
            metadata,
        });
    }

    /// Records every metric of a sample into its stream.
    pub fn record_snapshot(&mut self, snapshot: &MetricsSnapshot) {
        for (kind, value) in snapshot.iter() {
            self.record(&kind.id(), value, None, snapshot.taken_at);
        }
    }

    /// Sets the thresholds used for `stream`'s alert estimates.
    pub fn set_thresholds(&mut self, stream: MetricId, thresholds: StreamThresholds) {
        self.thresholds.insert(stream, thresholds);
    }

    /// Thresholds registered for `stream`.
    pub fn thresholds(&self, stream: &MetricId) -> Option<&StreamThresholds> {
        self.thresholds.get(stream)
    }

    /// Forecasts `stream` `horizon` samples ahead.
    pub fn predict(&self, stream: &MetricId, horizon: u32) -> Option<Prediction> {
        let series = self.streams.get(stream)?;
        if series.len() < self.config.min_points.max(2) {
            return None;
        }
        let latest = series.latest()?.value;

        let slope = series.slope();
        let trend = if slope.abs() <= self.config.trend_epsilon {
            Trend::Stable
        } else if slope > 0.0 {
            Trend::Increasing
        } else {
            Trend::Decreasing
        };
        let volatility = series.std_dev();

        // The EMA trails a linear series by `slope * (1 - alpha) / alpha`.
        let alpha = self.config.ema_alpha.clamp(f64::EPSILON, 1.0);
        let ema = series.ema(alpha)?;
        let next_value = ema + slope * (f64::from(horizon) + (1.0 - alpha) / alpha);

        if !(slope.is_finite() && volatility.is_finite() && next_value.is_finite()) {
            return None;
        }

        let confidence = (1.0 - volatility / 100.0).clamp(0.1, 1.0);

        let (alert_probability, time_to_alert) = match self.thresholds.get(stream) {
            Some(t) => {
                let base = (0.5 + 0.5 * t.position(next_value)).clamp(0.0, 1.0);
                let inflated = base * (1.0 + (volatility / 100.0).min(1.0));
                let time = if t.breached(latest) {
                    Some(Duration::ZERO)
                } else if t.toward(trend) {
                    series
                        .mean_spacing()
                        .filter(|s| !s.is_zero())
                        .and_then(|spacing| {
                            let steps = ((t.warning - latest) / slope).abs();
                            Duration::try_from_secs_f64(spacing.as_secs_f64() * steps).ok()
                        })
                } else {
                    None
                };
                (inflated.clamp(0.0, 1.0), time)
            }
            None => (0.0, None),
        };

        Some(Prediction {
            next_value,
            confidence,
            trend,
            volatility,
            alert_probability,
            time_to_alert,
        })
    }

    /// Forecasts every stream with enough data, keyed by stream name.
    pub fn predict_all(&self, horizon: u32) -> BTreeMap<String, Prediction> {
        self.streams
            .keys()
            .filter_map(|id| self.predict(id, horizon).map(|p| (id.to_string(), p)))
            .collect()
    }

    /// Points held by `stream`; 0 if unknown.
    pub fn stream_len(&self, stream: &MetricId) -> usize {
        self.streams.get(stream).map_or(0, MetricStream::len)
    }

    /// Every known stream, sorted by name.
    pub fn stream_ids(&self) -> Vec<MetricId> {
        let mut ids: Vec<MetricId> = self.streams.keys().cloned().collect();
        ids.sort_by_key(|id| id.to_string());
        ids
    }

    /// The newest point of `stream`.
    pub fn latest(&self, stream: &MetricId) -> Option<&DataPoint> {
        self.streams.get(stream).and_then(MetricStream::latest)
    }

    /// Counts an occurrence of a user behavior.
    pub fn record_behavior(&mut self, kind: &str, key: &str, now: Instant) {
        self.behaviors.record(kind, key, now);
    }

    /// The most frequent behavior patterns, optionally of one kind.
    pub fn predict_behavior(&mut self, kind: Option<&str>, now: Instant) -> Vec<BehaviorPattern> {
        self.behaviors.top(kind, self.config.behavior_top_n, now)
    }

    /// Forgets behavior patterns past the retention window.
    pub fn gc_behaviors(&mut self, now: Instant) -> usize {
        let removed = self.behaviors.gc(self.config.behavior_retention(), now);
        if removed > 0 {
            log::debug!("Analyzer: forgot {} stale behavior patterns", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn feed(analyzer: &mut PredictiveAnalyzer, id: &MetricId, values: &[f64], t0: Instant) {
        for (i, v) in values.iter().enumerate() {
            analyzer.record(id, *v, None, t0 + Duration::from_secs(2 * i as u64));
        }
    }

    #[test]
    fn test_increasing_series_projects_past_last_value() {
        let mut analyzer = PredictiveAnalyzer::default();
        let id = MetricId::new("test", "ramp");
        let values: Vec<f64> = (0..10).map(|i| 10.0 + 2.0 * i as f64).collect();
        feed(&mut analyzer, &id, &values, Instant::now());

        let p = analyzer.predict(&id, 1).unwrap();
        assert_eq!(p.trend, Trend::Increasing);
        assert!(p.next_value > 28.0, "next_value = {}", p.next_value);
        assert_eq!(p.alert_probability, 0.0);
        assert_eq!(p.time_to_alert, None);
    }

    #[test]
    fn test_insufficient_data_yields_none() {
        let mut analyzer = PredictiveAnalyzer::default();
        let id = MetricId::new("test", "short");
        feed(&mut analyzer, &id, &[1.0; 9], Instant::now());
        assert!(analyzer.predict(&id, 1).is_none());
        assert!(analyzer.predict(&MetricId::new("test", "unknown"), 1).is_none());
        assert!(analyzer.predict_all(1).is_empty());
    }

    #[test]
    fn test_flat_series_is_stable_and_confident() {
        let mut analyzer = PredictiveAnalyzer::default();
        let id = MetricKind::MemoryUsagePercent.id();
        feed(&mut analyzer, &id, &[50.0; 12], Instant::now());

        let p = analyzer.predict(&id, 3).unwrap();
        assert_eq!(p.trend, Trend::Stable);
        assert_relative_eq!(p.next_value, 50.0);
        assert_relative_eq!(p.confidence, 1.0);
        assert_eq!(p.time_to_alert, None);
        // 50 sits 20 below a 70/85 band: position -4/3, clamped to zero.
        assert_relative_eq!(p.alert_probability, 0.0);
    }

    #[test]
    fn test_time_to_alert_extrapolates_toward_warning() {
        let mut analyzer = PredictiveAnalyzer::default();
        let id = MetricKind::MemoryUsagePercent.id();
        let values: Vec<f64> = (0..10).map(|i| 40.0 + 2.0 * i as f64).collect();
        feed(&mut analyzer, &id, &values, Instant::now());

        // Last value 58, slope 2/sample, 2 s spacing: 6 samples to 70.
        let p = analyzer.predict(&id, 1).unwrap();
        assert_eq!(p.time_to_alert, Some(Duration::from_secs(12)));

        let mut falling = PredictiveAnalyzer::default();
        let values: Vec<f64> = values.into_iter().rev().collect();
        feed(&mut falling, &id, &values, Instant::now());
        assert_eq!(falling.predict(&id, 1).unwrap().time_to_alert, None);
    }

    #[test]
    fn test_breached_stream_alerts_now() {
        let mut analyzer = PredictiveAnalyzer::default();
        let id = MetricKind::CacheHitRate.id();
        feed(&mut analyzer, &id, &[35.0; 10], Instant::now());

        let p = analyzer.predict(&id, 1).unwrap();
        assert_eq!(p.time_to_alert, Some(Duration::ZERO));
        assert_relative_eq!(p.alert_probability, 1.0);
    }

    #[test]
    fn test_prediction_bounds_hold_for_noisy_streams() {
        let mut analyzer = PredictiveAnalyzer::default();
        let id = MetricKind::ResponseTimeMs.id();
        let values: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { 5.0 } else { 900.0 + i as f64 * 13.0 })
            .collect();
        feed(&mut analyzer, &id, &values, Instant::now());
        analyzer.set_thresholds(MetricId::new("x", "y"), StreamThresholds::above(1.0, 1.0));

        for horizon in [0, 1, 5, 50] {
            let p = analyzer.predict(&id, horizon).unwrap();
            assert!((0.1..=1.0).contains(&p.confidence));
            assert!((0.0..=1.0).contains(&p.alert_probability));
        }
    }

    #[test]
    fn test_huge_values_on_falling_threshold_stream_do_not_panic() {
        let mut analyzer = PredictiveAnalyzer::default();
        let id = MetricKind::CacheHitRate.id();
        feed(&mut analyzer, &id, &[1e308; 10], Instant::now());

        let p = analyzer.predict(&id, 1).unwrap();
        assert_eq!(p.trend, Trend::Stable);
        assert_relative_eq!(p.next_value, 1e308, max_relative = 1e-12);
        assert_eq!(p.time_to_alert, None);
        assert!((0.0..=1.0).contains(&p.alert_probability));
    }

    #[test]
    fn test_prediction_bounds_hold_for_degenerate_streams() {
        let series: Vec<Vec<f64>> = vec![
            vec![1e308; 10],
            vec![-1e308; 10],
            (0..10).map(|i| if i % 2 == 0 { -1e308 } else { 1e308 }).collect(),
            (0..10).map(|i| 1e307 * i as f64).collect(),
            (0..10).map(|i| 1e308 - 1e307 * i as f64).collect(),
            vec![0.0; 10],
            vec![f64::MIN_POSITIVE; 10],
            (0..10).map(|i| f64::MAX / (i as f64 + 1.0)).collect(),
        ];
        let kinds = [
            MetricKind::CacheHitRate,
            MetricKind::MemoryUsagePercent,
            MetricKind::ResponseTimeMs,
        ];

        for values in &series {
            for kind in kinds {
                let mut analyzer = PredictiveAnalyzer::default();
                let id = kind.id();
                feed(&mut analyzer, &id, values, Instant::now());
                for horizon in [0, 1, 50, u32::MAX] {
                    if let Some(p) = analyzer.predict(&id, horizon) {
                        assert!(p.next_value.is_finite());
                        assert!((0.1..=1.0).contains(&p.confidence), "{:?}", p);
                        assert!((0.0..=1.0).contains(&p.alert_probability), "{:?}", p);
                    }
                }
            }
        }
    }

    #[test]
    fn test_two_points_with_equal_timestamps() {
        let mut analyzer = PredictiveAnalyzer::new(AnalyzerConfig {
            min_points: 2,
            ..AnalyzerConfig::default()
        });
        let id = MetricKind::CacheHitRate.id();
        let now = Instant::now();
        analyzer.record(&id, 80.0, None, now);
        analyzer.record(&id, 70.0, None, now);

        let p = analyzer.predict(&id, 1).unwrap();
        assert_eq!(p.trend, Trend::Decreasing);
        assert_eq!(p.time_to_alert, None);
        assert!((0.0..=1.0).contains(&p.alert_probability));
    }

    #[test]
    fn test_snapshot_feeds_streams_and_behaviors_are_ranked() {
        let t0 = Instant::now();
        let mut analyzer = PredictiveAnalyzer::default();
        let sample = MetricsSnapshot::new(t0)
            .with(MetricKind::CpuLoad, 0.5)
            .with(MetricKind::ErrorRate, 0.0);
        analyzer.record_snapshot(&sample);
        assert_eq!(analyzer.stream_ids().len(), 2);
        assert_eq!(analyzer.stream_len(&MetricKind::CpuLoad.id()), 1);
        assert_eq!(analyzer.latest(&MetricKind::ErrorRate.id()).map(|p| p.value), Some(0.0));

        analyzer.record_behavior("navigation", "/a", t0);
        analyzer.record_behavior("navigation", "/b", t0);
        analyzer.record_behavior("navigation", "/b", t0 + Duration::from_secs(1));
        let top = analyzer.predict_behavior(Some("navigation"), t0 + Duration::from_secs(1));
        assert_eq!(top[0].pattern_key, "/b");

        let week = Duration::from_secs(7 * 24 * 3600);
        assert_eq!(analyzer.gc_behaviors(t0 + week + Duration::from_secs(2)), 2);
    }
}
