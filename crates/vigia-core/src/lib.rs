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

//! # Vigia Core
//!
//! Foundational crate containing the metric vocabulary, host-facing contracts,
//! and time sources shared by every part of the governor.
//!
//! Nothing in this crate schedules work or owns mutable governor state. It
//! defines the "what" (metric kinds, host snapshots, insights, key/value
//! store access), while `vigia-telemetry` samples it and `vigia-control`
//! acts on it.

#![warn(missing_docs)]

pub mod clock;
pub mod store;
pub mod telemetry;
pub mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{KeyValueStore, MemoryStore, StoreError};
pub use telemetry::{
    HostSnapshot, Insight, InsightCategory, InsightSeverity, MetricId, MetricKind,
    MetricsSnapshot, PerformanceSource,
};
pub use utils::timer::Stopwatch;
