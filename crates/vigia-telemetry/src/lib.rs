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

//! # Vigia Telemetry
//!
//! Samples a [`PerformanceSource`](vigia_core::PerformanceSource), keeps a
//! bounded history, turns it into qualitative [`Insight`](vigia_core::Insight)s,
//! and tracks the governor's own bookkeeping metrics.

#![warn(missing_docs)]

pub mod collector;
pub mod insights;
pub mod metrics;
pub mod sources;
pub mod utils;

pub use collector::{TelemetryCollector, TelemetryConfig};
pub use insights::{derive_insights, recommendations};
pub use metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};
pub use metrics::types::{Metric, MetricReading, MetricType, MetricValue, MetricsError};
pub use sources::{ScriptedSource, SysinfoSource};
pub use utils::timer::ScopedMetricTimer;
