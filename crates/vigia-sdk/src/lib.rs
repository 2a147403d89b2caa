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

//! The public-facing SDK of the Vigia governor.
//!
//! Build a [`GovernorService`] from a [`VigiaConfig`], a host
//! [`PerformanceSource`](vigia_core::PerformanceSource) and a
//! [`KeyValueStore`](vigia_core::KeyValueStore), then talk to it through a
//! [`GovernorHandle`].

pub mod config;
pub mod error;
pub mod service;

pub use config::{ServiceConfig, VigiaConfig};
pub use error::{SdkError, SdkResult};
pub use service::{GovernorHandle, GovernorService};

pub mod prelude {
    pub use crate::{GovernorHandle, GovernorService, SdkError, SdkResult, ServiceConfig, VigiaConfig};
    pub use vigia_cache::{CacheLayer, CachePriority, PutOptions};
    pub use vigia_control::{
        ActionResult, Alert, AlertSeverity, AutoFixOutcome, Governor, GovernorConfig,
        GovernorEvent, GovernorStatus, HealthCheck, HealthLevel, OptimizationRule, Prediction,
        RemediationContext, SystemView, Trend,
    };
    pub use vigia_core::{
        Clock, HostSnapshot, KeyValueStore, ManualClock, MemoryStore, MetricKind,
        MetricsSnapshot, PerformanceSource, SystemClock,
    };
    pub use vigia_telemetry::{ScriptedSource, SysinfoSource};
}
