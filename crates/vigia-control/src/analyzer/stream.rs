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

//! Bounded per-metric time series.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Points kept per stream.
pub const STREAM_CAPACITY: usize = 100;

/// One observation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// When it was observed.
    pub timestamp: Instant,
    /// Observed value.
    pub value: f64,
    /// Free-form annotation.
    pub metadata: Option<String>,
}

/// The last [`STREAM_CAPACITY`] observations of one metric, oldest first.
#[derive(Debug, Clone, Default)]
pub struct MetricStream {
    points: VecDeque<DataPoint>,
}

impl MetricStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point, dropping the oldest once full.
    pub fn push(&mut self, point: DataPoint) {
        if self.points.len() == STREAM_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Number of points held.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = &DataPoint> {
        self.points.iter()
    }

    /// The newest point.
    pub fn latest(&self) -> Option<&DataPoint> {
        self.points.back()
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Largest magnitude in the window, used to keep intermediate sums in range.
    fn scale(&self) -> f64 {
        let scale = self.values().fold(0.0_f64, |m, v| m.max(v.abs()));
        if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        }
    }

    fn normalized_mean(&self, scale: f64) -> f64 {
        self.values().map(|v| v / scale).sum::<f64>() / self.points.len() as f64
    }

    /// Arithmetic mean, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let scale = self.scale();
        self.normalized_mean(scale) * scale
    }

    /// Least-squares slope of value against sample index.
    pub fn slope(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let scale = self.scale();
        let mean_x = (n as f64 - 1.0) / 2.0;
        let mean_y = self.normalized_mean(scale);
        let (num, den) = self
            .values()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (i, y)| {
                let dx = i as f64 - mean_x;
                (num + dx * (y / scale - mean_y), den + dx * dx)
            });
        if den == 0.0 {
            0.0
        } else {
            num / den * scale
        }
    }

    /// Population standard deviation.
    pub fn std_dev(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        let scale = self.scale();
        let mean = self.normalized_mean(scale);
        let var = self
            .values()
            .map(|v| {
                let d = v / scale - mean;
                d * d
            })
            .sum::<f64>()
            / n as f64;
        var.sqrt() * scale
    }

    /// Exponential moving average with smoothing factor `alpha`, seeded with the first point.
    pub fn ema(&self, alpha: f64) -> Option<f64> {
        let mut values = self.values();
        let first = values.next()?;
        Some(values.fold(first, |acc, v| alpha * v + (1.0 - alpha) * acc))
    }

    /// Smallest value.
    pub fn min(&self) -> Option<f64> {
        self.values().reduce(f64::min)
    }

    /// Largest value.
    pub fn max(&self) -> Option<f64> {
        self.values().reduce(f64::max)
    }

    /// Average time between consecutive points.
    pub fn mean_spacing(&self) -> Option<Duration> {
        let first = self.points.front()?;
        let last = self.points.back()?;
        let gaps = self.points.len().checked_sub(1).filter(|g| *g > 0)?;
        Some(last.timestamp.saturating_duration_since(first.timestamp) / gaps as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stream(values: &[f64]) -> MetricStream {
        let t0 = Instant::now();
        let mut s = MetricStream::new();
        for (i, v) in values.iter().enumerate() {
            s.push(DataPoint {
                timestamp: t0 + Duration::from_secs(i as u64 * 2),
                value: *v,
                metadata: None,
            });
        }
        s
    }

    #[test]
    fn test_stream_drops_oldest_when_full() {
        let values: Vec<f64> = (0..STREAM_CAPACITY + 5).map(|v| v as f64).collect();
        let s = stream(&values);
        assert_eq!(s.len(), STREAM_CAPACITY);
        assert_eq!(s.iter().next().map(|p| p.value), Some(5.0));
        assert_eq!(s.latest().map(|p| p.value), Some((STREAM_CAPACITY + 4) as f64));
    }

    #[test]
    fn test_stream_statistics() {
        let s = stream(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(s.mean(), 5.0);
        assert_relative_eq!(s.std_dev(), 2.0);
        assert_eq!(s.min(), Some(2.0));
        assert_eq!(s.max(), Some(9.0));
        assert_eq!(s.mean_spacing(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_slope_of_linear_series() {
        let s = stream(&[10.0, 12.0, 14.0, 16.0]);
        assert_relative_eq!(s.slope(), 2.0);
        assert_relative_eq!(stream(&[3.0, 3.0, 3.0]).slope(), 0.0);
    }

    #[test]
    fn test_ema_and_empty_stream() {
        let s = stream(&[10.0, 20.0]);
        assert_relative_eq!(s.ema(0.3).unwrap(), 13.0);

        let empty = MetricStream::new();
        assert_eq!(empty.ema(0.3), None);
        assert_eq!(empty.mean_spacing(), None);
        assert_relative_eq!(empty.slope(), 0.0);
    }

    #[test]
    fn test_statistics_stay_finite_near_f64_max() {
        let s = stream(&[1e308; 10]);
        assert_relative_eq!(s.mean(), 1e308, max_relative = 1e-12);
        assert_relative_eq!(s.slope(), 0.0);
        assert_relative_eq!(s.std_dev(), 0.0);

        let swing = stream(&[-1e308, 1e308, -1e308, 1e308]);
        assert!(swing.mean().is_finite());
        assert!(swing.slope().is_finite());
        assert!(swing.std_dev().is_finite());
    }

    #[test]
    fn test_equal_timestamps_have_zero_spacing() {
        let t0 = Instant::now();
        let mut s = MetricStream::new();
        for v in [1.0, 2.0] {
            s.push(DataPoint {
                timestamp: t0,
                value: v,
                metadata: None,
            });
        }
        assert_eq!(s.mean_spacing(), Some(Duration::ZERO));
    }
}
