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

//! Aggregated configuration for the governor.

use crate::alerts::AlertsConfig;
use crate::analyzer::AnalyzerConfig;
use crate::error::{GovernorError, GovernorResult};
use crate::rules::RulesConfig;
use crate::scheduler::{Phase, ScheduleConfig};
use crate::supervisor::SupervisorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vigia_cache::{CacheConfig, CacheLayer};
use vigia_telemetry::TelemetryConfig;

/// Limits applied to remediation actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    /// Real time an action may take before it counts as timed out.
    pub action_timeout_ms: u64,
    /// Age past which disposable store entries are pruned.
    pub stale_entry_age_ms: u64,
    /// Executed actions kept for the status report.
    pub action_log_len: usize,
}

impl RemediationConfig {
    /// Action budget as a [`Duration`].
    pub fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Store staleness as a [`Duration`].
    pub fn stale_entry_age(&self) -> Duration {
        Duration::from_millis(self.stale_entry_age_ms)
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            action_timeout_ms: 250,
            stale_entry_age_ms: vigia_core::store::DEFAULT_STALE_AFTER.as_millis() as u64,
            action_log_len: 32,
        }
    }
}

/// Everything the governor can be tuned with.
///
/// Every section falls back to its defaults when omitted, so `{}` is a valid
/// configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Tiered cache layers.
    pub cache: CacheConfig,
    /// Sampling history.
    pub telemetry: TelemetryConfig,
    /// Forecasting.
    pub analyzer: AnalyzerConfig,
    /// Alert thresholds.
    pub alerts: AlertsConfig,
    /// Built-in optimization rules.
    pub rules: RulesConfig,
    /// Built-in health checks.
    pub supervisor: SupervisorConfig,
    /// Task cadence.
    pub schedule: ScheduleConfig,
    /// Remediation limits.
    pub remediation: RemediationConfig,
}

impl GovernorConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> GovernorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> GovernorResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Config: loading {}", path.as_ref().display());
        Self::from_json_str(&text)
    }

    /// Rejects values the components cannot work with.
    pub fn validate(&self) -> GovernorResult<()> {
        for layer in CacheLayer::ALL {
            if self.cache.layer(layer).max_entries == 0 {
                return Err(GovernorError::Config(format!(
                    "cache layer {:?} must hold at least one entry",
                    layer
                )));
            }
        }
        if self.cache.promotion_threshold == 0 {
            return Err(GovernorError::Config(
                "cache.promotion_threshold must be positive".into(),
            ));
        }
        if self.telemetry.history_len == 0 {
            return Err(GovernorError::Config(
                "telemetry.history_len must be positive".into(),
            ));
        }
        let alpha = self.analyzer.ema_alpha;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(GovernorError::Config(format!(
                "analyzer.ema_alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        if self.analyzer.min_points < 2 {
            return Err(GovernorError::Config(
                "analyzer.min_points must be at least 2".into(),
            ));
        }
        if let Some(phase) = Phase::ALL
            .into_iter()
            .find(|p| self.schedule.interval(*p).is_zero())
        {
            return Err(GovernorError::Config(format!(
                "schedule interval for {:?} must be positive",
                phase
            )));
        }
        if self.remediation.action_timeout_ms == 0 {
            return Err(GovernorError::Config(
                "remediation.action_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}
