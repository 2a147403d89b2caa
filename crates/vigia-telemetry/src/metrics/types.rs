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

//! Value types for self-metrics.

use serde::Serialize;
use thiserror::Error;
use vigia_core::MetricId;

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Only ever increases.
    Counter,
    /// Goes up and down.
    Gauge,
    /// A distribution of observations.
    Histogram,
}

/// The current value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// A monotonically increasing count.
    Counter(u64),
    /// A point-in-time value.
    Gauge(f64),
    /// Observations bucketed by upper bound.
    Histogram {
        /// Number of observations.
        count: u64,
        /// Sum of observations.
        sum: f64,
        /// Bucket upper bounds, ascending.
        bucket_bounds: Vec<f64>,
        /// Observations at or below each bound.
        bucket_counts: Vec<u64>,
    },
}

impl MetricValue {
    /// The [`MetricType`] of this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// A single representative number: the count, the gauge, or the histogram mean.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Counter(v) => *v as f64,
            MetricValue::Gauge(v) => *v,
            MetricValue::Histogram { count, sum, .. } => {
                if *count == 0 {
                    0.0
                } else {
                    sum / *count as f64
                }
            }
        }
    }
}

/// A registered metric.
#[derive(Debug, Clone)]
pub struct Metric {
    /// Identifier.
    pub id: MetricId,
    /// What it measures.
    pub description: String,
    /// Unit of measurement.
    pub unit: String,
    /// Current value.
    pub value: MetricValue,
}

impl Metric {
    /// Flattens the metric for reporting.
    pub fn reading(&self) -> MetricReading {
        MetricReading {
            id: self.id.to_string(),
            metric_type: self.value.metric_type(),
            unit: self.unit.clone(),
            value: self.value.as_f64(),
        }
    }
}

/// A serialisable, flattened view of a metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReading {
    /// `namespace:name[labels]`.
    pub id: String,
    /// Counter, gauge or histogram.
    pub metric_type: MetricType,
    /// Unit of measurement.
    pub unit: String,
    /// See [`MetricValue::as_f64`].
    pub value: f64,
}

/// Errors raised by the metrics registry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricsError {
    /// No metric with this id is registered.
    #[error("metric not found: {0}")]
    NotFound(MetricId),
    /// The operation does not apply to this metric's type.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// Type the operation needs.
        expected: MetricType,
        /// Type actually registered.
        found: MetricType,
    },
    /// The storage lock was poisoned.
    #[error("metrics storage unavailable")]
    Poisoned,
}

/// Result alias for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;
