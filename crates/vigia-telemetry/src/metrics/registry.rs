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

//! Registry for the governor's self-metrics.

use super::types::{Metric, MetricReading, MetricType, MetricValue, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use vigia_core::MetricId;

type Storage = Arc<RwLock<HashMap<MetricId, Metric>>>;

/// Central registry for self-metrics.
///
/// Registration hands back a typed handle that updates the shared storage.
/// Registering an existing id again returns a handle to the same metric.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    storage: Storage,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter.
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = MetricId::new(namespace, name);
        self.register(&id, description.into(), "count".into(), MetricValue::Counter(0))?;
        Ok(CounterHandle {
            id,
            storage: self.storage.clone(),
        })
    }

    /// Registers a gauge.
    pub fn register_gauge(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        let id = MetricId::new(namespace, name);
        self.register(&id, description.into(), unit.into(), MetricValue::Gauge(0.0))?;
        Ok(GaugeHandle {
            id,
            storage: self.storage.clone(),
        })
    }

    /// Registers a histogram with the given ascending bucket bounds.
    pub fn register_histogram(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        mut bucket_bounds: Vec<f64>,
    ) -> MetricsResult<HistogramHandle> {
        let id = MetricId::new(namespace, name);
        bucket_bounds.sort_by(f64::total_cmp);
        let bucket_counts = vec![0; bucket_bounds.len()];
        self.register(
            &id,
            description.into(),
            unit.into(),
            MetricValue::Histogram {
                count: 0,
                sum: 0.0,
                bucket_bounds,
                bucket_counts,
            },
        )?;
        Ok(HistogramHandle {
            id,
            storage: self.storage.clone(),
        })
    }

    /// Returns a copy of a metric.
    pub fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        let storage = self.storage.read().map_err(|_| MetricsError::Poisoned)?;
        storage
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::NotFound(id.clone()))
    }

    /// Number of registered metrics.
    pub fn metric_count(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Flattened readings of every metric, sorted by id.
    pub fn readings(&self) -> Vec<MetricReading> {
        let mut readings: Vec<MetricReading> = self
            .storage
            .read()
            .map(|s| s.values().map(Metric::reading).collect())
            .unwrap_or_default();
        readings.sort_by(|a, b| a.id.cmp(&b.id));
        readings
    }

    fn register(
        &self,
        id: &MetricId,
        description: String,
        unit: String,
        initial: MetricValue,
    ) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| MetricsError::Poisoned)?;
        if let Some(existing) = storage.get(id) {
            let found = existing.value.metric_type();
            let expected = initial.metric_type();
            return if found == expected {
                Ok(())
            } else {
                Err(MetricsError::TypeMismatch { expected, found })
            };
        }
        storage.insert(
            id.clone(),
            Metric {
                id: id.clone(),
                description,
                unit,
                value: initial,
            },
        );
        Ok(())
    }
}

fn update<T>(
    storage: &Storage,
    id: &MetricId,
    f: impl FnOnce(&mut MetricValue) -> Option<T>,
    expected: MetricType,
) -> MetricsResult<T> {
    let mut storage = storage.write().map_err(|_| MetricsError::Poisoned)?;
    let metric = storage
        .get_mut(id)
        .ok_or_else(|| MetricsError::NotFound(id.clone()))?;
    let found = metric.value.metric_type();
    f(&mut metric.value).ok_or(MetricsError::TypeMismatch { expected, found })
}

/// Handle to a counter.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    storage: Storage,
}

impl CounterHandle {
    /// Adds one.
    pub fn increment(&self) -> MetricsResult<u64> {
        self.increment_by(1)
    }

    /// Adds `amount`.
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        update(
            &self.storage,
            &self.id,
            |value| match value {
                MetricValue::Counter(v) => {
                    *v = v.saturating_add(amount);
                    Some(*v)
                }
                _ => None,
            },
            MetricType::Counter,
        )
    }

    /// Current count.
    pub fn get(&self) -> MetricsResult<u64> {
        update(
            &self.storage,
            &self.id,
            |value| match value {
                MetricValue::Counter(v) => Some(*v),
                _ => None,
            },
            MetricType::Counter,
        )
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle to a gauge.
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    storage: Storage,
}

impl GaugeHandle {
    /// Sets the value.
    pub fn set(&self, new_value: f64) -> MetricsResult<()> {
        update(
            &self.storage,
            &self.id,
            |value| match value {
                MetricValue::Gauge(v) => {
                    *v = new_value;
                    Some(())
                }
                _ => None,
            },
            MetricType::Gauge,
        )
    }

    /// Current value.
    pub fn get(&self) -> MetricsResult<f64> {
        update(
            &self.storage,
            &self.id,
            |value| match value {
                MetricValue::Gauge(v) => Some(*v),
                _ => None,
            },
            MetricType::Gauge,
        )
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle to a histogram.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    storage: Storage,
}

impl HistogramHandle {
    /// Records one observation.
    pub fn observe(&self, sample: f64) -> MetricsResult<()> {
        update(
            &self.storage,
            &self.id,
            |value| match value {
                MetricValue::Histogram {
                    count,
                    sum,
                    bucket_bounds,
                    bucket_counts,
                } => {
                    *count += 1;
                    *sum += sample;
                    for (bound, slot) in bucket_bounds.iter().zip(bucket_counts.iter_mut()) {
                        if sample <= *bound {
                            *slot += 1;
                        }
                    }
                    Some(())
                }
                _ => None,
            },
            MetricType::Histogram,
        )
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}
