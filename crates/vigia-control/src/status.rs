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

//! The aggregated status report handed to subscribers.

use crate::alerts::{Alert, AlertSeverity};
use crate::analyzer::{BehaviorPattern, Prediction};
use crate::remediation::{ActionRecord, Advisory};
use crate::rules::RuleReport;
use crate::scheduler::TaskSummary;
use crate::supervisor::{CheckStatus, HealthLevel};
use serde::Serialize;
use std::collections::BTreeMap;
use vigia_cache::CacheStats;
use vigia_core::{Insight, MetricKind};
use vigia_telemetry::MetricReading;

/// A point-in-time view of everything the governor knows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GovernorStatus {
    /// Overall health.
    pub level: HealthLevel,
    /// `false` once the governor was stopped.
    pub running: bool,
    /// Ticks that ran at least one task.
    pub ticks: u64,
    /// Health check states, in priority order.
    pub checks: Vec<CheckStatus>,
    /// Stored alerts, newest first.
    pub alerts: Vec<Alert>,
    /// Forecast per metric stream.
    pub predictions: BTreeMap<String, Prediction>,
    /// Most frequent user behaviors.
    pub behaviors: Vec<BehaviorPattern>,
    /// Findings over the insight window.
    pub insights: Vec<Insight>,
    /// Top recommendations derived from the insights.
    pub recommendations: Vec<String>,
    /// Governed cache counters.
    pub cache: CacheStats,
    /// Latest sampled values.
    pub metrics: BTreeMap<MetricKind, f64>,
    /// Advisories currently raised for the host.
    pub advisories: Vec<Advisory>,
    /// Recently executed remediation, oldest first.
    pub recent_actions: Vec<ActionRecord>,
    /// Optimization rule states.
    pub rules: Vec<RuleReport>,
    /// Periodic task counters.
    pub tasks: Vec<TaskSummary>,
    /// The governor's own bookkeeping.
    pub self_metrics: Vec<MetricReading>,
}

impl GovernorStatus {
    /// Number of alerts nobody has acknowledged.
    pub fn unacknowledged_alerts(&self) -> usize {
        self.alerts.iter().filter(|a| !a.acknowledged).count()
    }

    /// Returns `true` if an unacknowledged critical alert is stored.
    pub fn has_critical_alert(&self) -> bool {
        self.alerts
            .iter()
            .any(|a| !a.acknowledged && a.severity == AlertSeverity::Critical)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_serializes_as_healthy() {
        let status = GovernorStatus::default();
        let json: serde_json::Value = serde_json::to_value(&status).unwrap();
        assert_eq!(json["level"], "healthy");
        assert_eq!(json["running"], false);
        assert!(json["alerts"].as_array().unwrap().is_empty());
        assert_eq!(status.unacknowledged_alerts(), 0);
        assert!(!status.has_critical_alert());
    }

    #[test]
    fn test_metrics_keys_use_snake_case_kinds() {
        let mut status = GovernorStatus::default();
        status.metrics.insert(MetricKind::MemoryUsagePercent, 42.0);
        let json = status.to_json_pretty().unwrap();
        assert!(json.contains("\"memory_usage_percent\": 42.0"));
    }
}
