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

//! Two-level threshold alerts with deduplication.

use crate::actions;
use crate::error::ActionError;
use crate::remediation::{self, RemediationContext};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;
use vigia_core::{InsightCategory, MetricKind, MetricsSnapshot};

/// How urgent an alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Worth knowing.
    Info,
    /// Needs attention soon.
    Warning,
    /// Needs attention now.
    Critical,
}

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    /// Heap pressure.
    Memory,
    /// Slow responses.
    Performance,
    /// Application errors.
    Errors,
    /// Slow renders.
    UserExperience,
    /// Page load.
    Loading,
    /// Input responsiveness.
    Interactivity,
    /// Layout shifts.
    VisualStability,
    /// Resource consumption.
    Resources,
}

impl From<InsightCategory> for AlertCategory {
    fn from(category: InsightCategory) -> Self {
        match category {
            InsightCategory::Loading => AlertCategory::Loading,
            InsightCategory::Interactivity => AlertCategory::Interactivity,
            InsightCategory::VisualStability => AlertCategory::VisualStability,
            InsightCategory::Resources => AlertCategory::Resources,
        }
    }
}

/// A remediation an alert can apply to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoFix {
    /// Release caches and stored data.
    ReleaseMemory,
    /// Defer non-critical work and preload.
    SpeedUpResponses,
}

/// A stored alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Unique id.
    pub id: Uuid,
    /// Urgency.
    pub severity: AlertSeverity,
    /// Subject.
    pub category: AlertCategory,
    /// One-line summary.
    pub title: String,
    /// Details.
    pub message: String,
    /// When it was raised.
    #[serde(skip)]
    pub created_at: Instant,
    /// Suggested action.
    pub recommendation: Option<String>,
    /// Self-remediation, if any.
    pub auto_fix: Option<AutoFix>,
    /// Whether someone has seen it.
    pub acknowledged: bool,
}

impl Alert {
    /// Returns `true` if [`AlertsEngine::auto_fix`] can act on this alert.
    pub fn auto_fix_available(&self) -> bool {
        self.auto_fix.is_some()
    }
}

/// The caller-provided part of an alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    /// Urgency.
    pub severity: AlertSeverity,
    /// Subject.
    pub category: AlertCategory,
    /// One-line summary.
    pub title: String,
    /// Details.
    pub message: String,
    /// Suggested action.
    pub recommendation: Option<String>,
    /// Self-remediation, if any.
    pub auto_fix: Option<AutoFix>,
}

impl AlertDraft {
    /// A draft with no recommendation and no auto-fix.
    pub fn new(
        severity: AlertSeverity,
        category: AlertCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            title: title.into(),
            message: message.into(),
            recommendation: None,
            auto_fix: None,
        }
    }

    /// Adds a recommendation.
    pub fn recommend(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// Makes the alert self-fixable.
    pub fn fixable(mut self, fix: AutoFix) -> Self {
        self.auto_fix = Some(fix);
        self
    }
}

/// Result of [`AlertsEngine::auto_fix`].
#[derive(Debug, Clone, PartialEq)]
pub enum AutoFixOutcome {
    /// The fix ran and the alert was acknowledged.
    Applied,
    /// The fix ran and failed; the alert is untouched.
    Failed(ActionError),
    /// The alert has no auto-fix.
    Ineligible,
    /// No alert with this id.
    NotFound,
}

impl fmt::Display for AutoFixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoFixOutcome::Applied => write!(f, "applied"),
            AutoFixOutcome::Failed(e) => write!(f, "failed: {e}"),
            AutoFixOutcome::Ineligible => write!(f, "no auto-fix available"),
            AutoFixOutcome::NotFound => write!(f, "alert not found"),
        }
    }
}

/// Warning and critical levels of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThreshold {
    /// Warning level, inclusive.
    pub warning: f64,
    /// Critical level, inclusive.
    pub critical: f64,
}

/// Configuration for the [`AlertsEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Heap usage, percent.
    pub memory: AlertThreshold,
    /// Response time, milliseconds.
    pub response_time: AlertThreshold,
    /// Errors per sample.
    pub error_rate: AlertThreshold,
    /// Render time, milliseconds.
    pub render_time: AlertThreshold,
    /// Same-kind alerts within this window are suppressed, in milliseconds.
    pub dedup_window_ms: u64,
    /// Alerts kept, newest first.
    pub retention: usize,
}

impl AlertsConfig {
    /// Dedup window as a [`Duration`].
    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            memory: AlertThreshold {
                warning: 70.0,
                critical: 85.0,
            },
            response_time: AlertThreshold {
                warning: 200.0,
                critical: 500.0,
            },
            error_rate: AlertThreshold {
                warning: 1.0,
                critical: 3.0,
            },
            render_time: AlertThreshold {
                warning: 100.0,
                critical: 200.0,
            },
            dedup_window_ms: 30_000,
            retention: 50,
        }
    }
}

/// Per-metric wording of threshold alerts.
struct Classifier {
    kind: MetricKind,
    category: AlertCategory,
    subject: &'static str,
    unit: &'static str,
    warning_advice: &'static str,
    critical_advice: &'static str,
    critical_fix: Option<AutoFix>,
}

const CLASSIFIERS: [Classifier; 4] = [
    Classifier {
        kind: MetricKind::MemoryUsagePercent,
        category: AlertCategory::Memory,
        subject: "memory usage",
        unit: "%",
        warning_advice: "Review state management and drop unused data",
        critical_advice: "Release caches and unmount idle components",
        critical_fix: Some(AutoFix::ReleaseMemory),
    },
    Classifier {
        kind: MetricKind::ResponseTimeMs,
        category: AlertCategory::Performance,
        subject: "response time",
        unit: " ms",
        warning_advice: "Review components and avoid redundant renders",
        critical_advice: "Lazy-load heavy views and memoize expensive work",
        critical_fix: Some(AutoFix::SpeedUpResponses),
    },
    Classifier {
        kind: MetricKind::ErrorRate,
        category: AlertCategory::Errors,
        subject: "error rate",
        unit: " errors/sample",
        warning_advice: "Check recent logs for recurring failures",
        critical_advice: "Inspect logs and add error handling at the failing boundary",
        critical_fix: None,
    },
    Classifier {
        kind: MetricKind::RenderTimeMs,
        category: AlertCategory::UserExperience,
        subject: "render time",
        unit: " ms",
        warning_advice: "Split large components and memoize props",
        critical_advice: "Virtualize long lists and defer offscreen rendering",
        critical_fix: None,
    },
];

/// Classifies metrics into alerts and keeps the most recent ones.
#[derive(Debug)]
pub struct AlertsEngine {
    config: AlertsConfig,
    stale_after: Duration,
    alerts: VecDeque<Alert>,
}

impl Default for AlertsEngine {
    fn default() -> Self {
        Self::new(AlertsConfig::default(), vigia_core::store::DEFAULT_STALE_AFTER)
    }
}

impl AlertsEngine {
    /// Creates an engine with no alerts.
    ///
    /// `stale_after` is the age past which stored entries are pruned by the memory auto-fix.
    pub fn new(config: AlertsConfig, stale_after: Duration) -> Self {
        Self {
            config,
            stale_after,
            alerts: VecDeque::new(),
        }
    }

    fn threshold(&self, kind: MetricKind) -> Option<AlertThreshold> {
        match kind {
            MetricKind::MemoryUsagePercent => Some(self.config.memory),
            MetricKind::ResponseTimeMs => Some(self.config.response_time),
            MetricKind::ErrorRate => Some(self.config.error_rate),
            MetricKind::RenderTimeMs => Some(self.config.render_time),
            _ => None,
        }
    }

    /// Raises at most one alert per watched metric. Returns the alerts actually stored.
    pub fn analyze(&mut self, metrics: &MetricsSnapshot, now: Instant) -> Vec<Alert> {
        let mut drafts = Vec::new();
        for c in &CLASSIFIERS {
            let (Some(value), Some(t)) = (metrics.get(c.kind), self.threshold(c.kind)) else {
                continue;
            };
            let draft = if value >= t.critical {
                let d = AlertDraft::new(
                    AlertSeverity::Critical,
                    c.category,
                    format!("Critical {}", c.subject),
                    format!("{} at {:.1}{} (critical at {}{})", c.subject, value, c.unit, t.critical, c.unit),
                )
                .recommend(c.critical_advice);
                match c.critical_fix {
                    Some(fix) => d.fixable(fix),
                    None => d,
                }
            } else if value >= t.warning {
                AlertDraft::new(
                    AlertSeverity::Warning,
                    c.category,
                    format!("High {}", c.subject),
                    format!("{} at {:.1}{} (warning at {}{})", c.subject, value, c.unit, t.warning, c.unit),
                )
                .recommend(c.warning_advice)
            } else {
                continue;
            };
            drafts.push(draft);
        }
        drafts
            .into_iter()
            .filter_map(|d| self.raise(d, now))
            .collect()
    }

    /// Stores an alert unless an unacknowledged one of the same category and
    /// severity was raised within the dedup window.
    pub fn raise(&mut self, draft: AlertDraft, now: Instant) -> Option<Alert> {
        let window = self.config.dedup_window();
        let duplicate = self.alerts.iter().any(|a| {
            !a.acknowledged
                && a.category == draft.category
                && a.severity == draft.severity
                && now.saturating_duration_since(a.created_at) < window
        });
        if duplicate {
            log::trace!("Alerts: suppressed duplicate {:?}/{:?}", draft.category, draft.severity);
            return None;
        }

        let alert = Alert {
            id: Uuid::new_v4(),
            severity: draft.severity,
            category: draft.category,
            title: draft.title,
            message: draft.message,
            created_at: now,
            recommendation: draft.recommendation,
            auto_fix: draft.auto_fix,
            acknowledged: false,
        };
        match alert.severity {
            AlertSeverity::Critical => log::warn!("Alerts: {} - {}", alert.title, alert.message),
            _ => log::info!("Alerts: {} - {}", alert.title, alert.message),
        }
        self.alerts.push_front(alert.clone());
        self.alerts.truncate(self.config.retention);
        Some(alert)
    }

    /// Marks an alert as seen. Returns whether the alert exists.
    pub fn acknowledge(&mut self, id: Uuid) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    /// Removes an alert. Returns whether it existed.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        before != self.alerts.len()
    }

    /// Applies an alert's auto-fix and acknowledges it on success.
    pub fn auto_fix(&mut self, id: Uuid, ctx: &mut RemediationContext<'_>) -> AutoFixOutcome {
        let Some(alert) = self.alerts.iter_mut().find(|a| a.id == id) else {
            return AutoFixOutcome::NotFound;
        };
        let Some(fix) = alert.auto_fix else {
            return AutoFixOutcome::Ineligible;
        };
        log::info!("Alerts: auto-fixing '{}'", alert.title);
        let (result, _) = match fix {
            AutoFix::ReleaseMemory => {
                let mut release = actions::release_memory(self.stale_after);
                remediation::execute(&mut release, ctx)
            }
            AutoFix::SpeedUpResponses => {
                remediation::execute(&mut actions::speed_up_responses, ctx)
            }
        };
        match result {
            Ok(()) => {
                alert.acknowledged = true;
                AutoFixOutcome::Applied
            }
            Err(e) => {
                log::warn!("Alerts: auto-fix of '{}' failed: {}", alert.title, e);
                AutoFixOutcome::Failed(e)
            }
        }
    }

    /// Looks an alert up.
    pub fn get(&self, id: Uuid) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Every stored alert, newest first.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Alerts nobody has acknowledged, newest first.
    pub fn unacknowledged(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(|a| !a.acknowledged)
    }

    /// Unacknowledged critical alerts, newest first.
    pub fn critical_unacknowledged(&self) -> impl Iterator<Item = &Alert> {
        self.unacknowledged()
            .filter(|a| a.severity == AlertSeverity::Critical)
    }

    /// Number of stored alerts.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remediation::{Advisories, Advisory, GovernedCache};
    use vigia_core::MemoryStore;

    fn metrics(values: &[(MetricKind, f64)]) -> MetricsSnapshot {
        let mut m = MetricsSnapshot::new(Instant::now());
        for (k, v) in values {
            m.set(*k, *v);
        }
        m
    }

    #[test]
    fn test_one_alert_per_metric_critical_wins() {
        let mut engine = AlertsEngine::default();
        let now = Instant::now();
        let raised = engine.analyze(
            &metrics(&[
                (MetricKind::MemoryUsagePercent, 90.0),
                (MetricKind::ResponseTimeMs, 250.0),
                (MetricKind::ErrorRate, 0.0),
                (MetricKind::CpuLoad, 1.0),
            ]),
            now,
        );
        let found: Vec<(AlertCategory, AlertSeverity, bool)> = raised
            .iter()
            .map(|a| (a.category, a.severity, a.auto_fix_available()))
            .collect();
        assert_eq!(
            found,
            vec![
                (AlertCategory::Memory, AlertSeverity::Critical, true),
                (AlertCategory::Performance, AlertSeverity::Warning, false),
            ]
        );
        assert_eq!(engine.critical_unacknowledged().count(), 1);
    }

    #[test]
    fn test_duplicates_suppressed_within_window() {
        let mut engine = AlertsEngine::default();
        let t0 = Instant::now();
        let hot = metrics(&[(MetricKind::ErrorRate, 5.0)]);
        assert_eq!(engine.analyze(&hot, t0).len(), 1);
        assert!(engine.analyze(&hot, t0 + Duration::from_secs(29)).is_empty());
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.analyze(&hot, t0 + Duration::from_secs(30)).len(), 1);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_acknowledged_alert_does_not_suppress() {
        let mut engine = AlertsEngine::default();
        let t0 = Instant::now();
        let draft = AlertDraft::new(AlertSeverity::Info, AlertCategory::Loading, "t", "m");
        let first = engine.raise(draft.clone(), t0).unwrap();
        assert!(engine.raise(draft.clone(), t0).is_none());
        assert!(engine.acknowledge(first.id));
        assert!(engine.raise(draft, t0).is_some());
    }

    #[test]
    fn test_retention_keeps_newest() {
        let mut engine = AlertsEngine::new(
            AlertsConfig {
                retention: 3,
                dedup_window_ms: 0,
                ..Default::default()
            },
            Duration::from_secs(60),
        );
        let t0 = Instant::now();
        let mut ids = Vec::new();
        for i in 0..5 {
            let d = AlertDraft::new(AlertSeverity::Info, AlertCategory::Loading, format!("{i}"), "m");
            ids.push(engine.raise(d, t0).unwrap().id);
        }
        let kept: Vec<Uuid> = engine.alerts().map(|a| a.id).collect();
        assert_eq!(kept, vec![ids[4], ids[3], ids[2]]);
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let mut engine = AlertsEngine::default();
        let id = Uuid::new_v4();
        assert!(!engine.acknowledge(id));
        assert!(!engine.dismiss(id));

        let mut cache = GovernedCache::default();
        let mut store = MemoryStore::new();
        let mut board = Advisories::default();
        let mut ctx = RemediationContext::new(
            &mut cache,
            &mut store,
            &mut board,
            Instant::now(),
            0,
            Duration::from_secs(1),
        );
        assert_eq!(engine.auto_fix(id, &mut ctx), AutoFixOutcome::NotFound);
    }

    #[test]
    fn test_auto_fix_eligibility() {
        let mut engine = AlertsEngine::default();
        let now = Instant::now();
        let raised = engine.analyze(
            &metrics(&[
                (MetricKind::ResponseTimeMs, 800.0),
                (MetricKind::ErrorRate, 4.0),
            ]),
            now,
        );
        let (fixable, manual) = (raised[0].id, raised[1].id);

        let mut cache = GovernedCache::default();
        let mut store = MemoryStore::new();
        let mut board = Advisories::default();
        let mut ctx =
            RemediationContext::new(&mut cache, &mut store, &mut board, now, 0, Duration::from_secs(1));

        assert_eq!(engine.auto_fix(manual, &mut ctx), AutoFixOutcome::Ineligible);
        assert!(!engine.get(manual).unwrap().acknowledged);

        assert_eq!(engine.auto_fix(fixable, &mut ctx), AutoFixOutcome::Applied);
        assert!(engine.get(fixable).unwrap().acknowledged);
        drop(ctx);
        assert!(board.is_active(Advisory::ThrottleRenders, now));

        assert!(engine.dismiss(manual));
        assert_eq!(engine.len(), 1);
    }
}
