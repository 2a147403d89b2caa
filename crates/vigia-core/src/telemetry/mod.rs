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

//! The common language for runtime health data.
//!
//! - [`metrics`] names every signal the governor understands and carries
//!   sampled values around as [`MetricsSnapshot`]s.
//! - [`host`] is the read-only boundary to the host runtime's measurement
//!   primitives. Every signal is optional.
//! - [`insight`] describes qualitative findings derived from samples.

pub mod host;
pub mod insight;
pub mod metrics;

pub use self::host::{
    HostSnapshot, InteractionTiming, MemoryUsage, NavigationTiming, PaintTiming,
    PerformanceSource, ResourceTiming,
};
pub use self::insight::{Insight, InsightCategory, InsightSeverity};
pub use self::metrics::{MetricId, MetricKind, MetricsSnapshot};
