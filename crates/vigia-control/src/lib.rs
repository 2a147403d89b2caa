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

//! # Vigia Control
//!
//! The decision-making layer of the governor.
//!
//! - [`analyzer`] forecasts metric streams and learns user behavior.
//! - [`rules`] runs at most one optimization per evaluation.
//! - [`supervisor`] probes health checks and heals persistent failures.
//! - [`alerts`] classifies metrics into deduplicated alerts.
//! - [`governor`] owns all of the above and runs them on the [`scheduler`].

#![warn(missing_docs)]

pub mod actions;
pub mod alerts;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod governor;
pub mod remediation;
pub mod rules;
pub mod scheduler;
pub mod status;
pub mod supervisor;

pub use alerts::{Alert, AlertCategory, AlertDraft, AlertSeverity, AlertsEngine, AutoFixOutcome};
pub use analyzer::{Prediction, PredictiveAnalyzer, StreamThresholds, Trend};
pub use config::{GovernorConfig, RemediationConfig};
pub use error::{ActionError, GovernorError, GovernorResult};
pub use governor::{Governor, GovernorEvent, StatusListener, SubscriptionId};
pub use remediation::{
    ActionResult, Advisory, GovernedCache, Probe, RemediationContext, Remedy, SystemView,
};
pub use rules::{OptimizationRule, RuleEngine, RuleExecution};
pub use scheduler::{Phase, ScheduleConfig, Scheduler};
pub use status::GovernorStatus;
pub use supervisor::{HealAttempt, HealthCheck, HealthLevel, Supervisor};
