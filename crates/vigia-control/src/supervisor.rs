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

//! Health checks with bounded self-healing.
//!
//! A check that fails twice in a row is healed, at most once per cooldown.
//! After healing the probe runs again: a pass resets the failure streak, a
//! failure extends it. Healing runs under `&mut Supervisor`, so a check is
//! never healed twice at once and its status settles before the call returns.

use crate::actions;
use crate::error::{GovernorError, GovernorResult};
use crate::remediation::{self, ActionResult, Probe, RemediationContext, Remedy, SystemView};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use vigia_core::MetricKind;

/// Failures in a row before healing is attempted.
pub const HEAL_AFTER_FAILURES: u32 = 2;

/// Failures in a row that make the system critical.
const CRITICAL_FAILURES: u32 = 3;

/// Checks failing at once beyond which the system is degraded.
const DEGRADED_FAILING_CHECKS: usize = 2;

/// Overall health, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthLevel {
    /// Nothing persistent is wrong.
    #[default]
    Healthy,
    /// Several checks are failing.
    Degraded,
    /// A check keeps failing despite healing.
    Critical,
}

/// Result of the latest probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    /// Healthy.
    Pass,
    /// Unhealthy.
    Fail,
}

/// A registered probe and the remedy that heals it.
pub struct HealthCheck {
    id: String,
    name: String,
    priority: u32,
    cooldown: Duration,
    probe: Box<dyn Probe>,
    remedy: Box<dyn Remedy>,
    last_healed_at: Option<Instant>,
}

impl HealthCheck {
    /// Creates a check that has never healed.
    pub fn new<P, R>(
        id: impl Into<String>,
        name: impl Into<String>,
        priority: u32,
        cooldown: Duration,
        probe: P,
        remedy: R,
    ) -> Self
    where
        P: Probe + 'static,
        R: Remedy + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            priority,
            cooldown,
            probe: Box::new(probe),
            remedy: Box::new(remedy),
            last_healed_at: None,
        }
    }

    /// Check id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When healing last ran.
    pub fn last_healed_at(&self) -> Option<Instant> {
        self.last_healed_at
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.last_healed_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.cooldown)
    }
}

impl std::fmt::Debug for HealthCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthCheck")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("cooldown", &self.cooldown)
            .field("last_healed_at", &self.last_healed_at)
            .finish()
    }
}

/// The mutable half of a check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckStatus {
    /// Check id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Latest state.
    pub status: CheckState,
    /// When the probe last ran.
    #[serde(skip)]
    pub last_checked_at: Option<Instant>,
    /// Failures in a row.
    pub consecutive_failures: u32,
    /// Healing attempts so far.
    pub heal_attempts: u64,
}

/// Outcome of one healing attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct HealAttempt {
    /// Healed check.
    pub check_id: String,
    /// What the remedy returned.
    pub result: ActionResult,
    /// Whether the probe passed afterwards.
    pub recovered: bool,
    /// Real time spent in the remedy.
    pub elapsed: Duration,
}

struct Slot {
    check: HealthCheck,
    status: CheckStatus,
}

/// Threshold and cooldown of a built-in check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckSettings {
    /// Whether the check is registered at all.
    pub enabled: bool,
    /// The probe passes while the watched value stays below this.
    pub limit: f64,
    /// Minimum time between healing attempts, in milliseconds.
    pub cooldown_ms: u64,
}

impl CheckSettings {
    const fn new(limit: f64, cooldown_ms: u64) -> Self {
        Self {
            enabled: true,
            limit,
            cooldown_ms,
        }
    }

    fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Settings of the built-in checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Heap usage, percent.
    pub memory_usage: CheckSettings,
    /// Errors per sample.
    pub error_rate: CheckSettings,
    /// Mean response time, milliseconds.
    pub response_time: CheckSettings,
    /// Cache utilization, 0.0 to 1.0.
    pub cache_health: CheckSettings,
    /// Mounted components.
    pub component_count: CheckSettings,
    /// Registered event listeners.
    pub event_listeners: CheckSettings,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            memory_usage: CheckSettings::new(85.0, 30_000),
            error_rate: CheckSettings::new(5.0, 60_000),
            response_time: CheckSettings::new(50.0, 45_000),
            cache_health: CheckSettings::new(0.9, 120_000),
            component_count: CheckSettings::new(5000.0, 90_000),
            event_listeners: CheckSettings::new(1000.0, 180_000),
        }
    }
}

/// Passes while `kind` is below `limit`, or when the host does not report it.
fn metric_below(kind: MetricKind, limit: f64) -> impl FnMut(&SystemView<'_>) -> bool + Send {
    move |view| view.metric(kind).map_or(true, |v| v < limit)
}

/// Runs health checks in priority order and heals persistent failures.
#[derive(Default)]
pub struct Supervisor {
    slots: Vec<Slot>,
}

impl Supervisor {
    /// Creates a supervisor with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a supervisor with the enabled built-in checks.
    pub fn with_builtin_checks(config: &SupervisorConfig, stale_after: Duration) -> Self {
        let mut sup = Self::new();
        let c = config;
        if c.memory_usage.enabled {
            let mut release = actions::release_memory(stale_after);
            sup.add_check(HealthCheck::new(
                "memory-usage",
                "Memory usage",
                10,
                c.memory_usage.cooldown(),
                metric_below(MetricKind::MemoryUsagePercent, c.memory_usage.limit),
                move |ctx: &mut RemediationContext<'_>| -> ActionResult {
                    release(&mut *ctx)?;
                    actions::release_listeners(ctx)
                },
            ));
        }
        if c.error_rate.enabled {
            sup.add_check(HealthCheck::new(
                "error-rate",
                "Error rate",
                9,
                c.error_rate.cooldown(),
                metric_below(MetricKind::ErrorRate, c.error_rate.limit),
                actions::mitigate_errors,
            ));
        }
        if c.response_time.enabled {
            sup.add_check(HealthCheck::new(
                "response-time",
                "Response time",
                8,
                c.response_time.cooldown(),
                metric_below(MetricKind::ResponseTimeMs, c.response_time.limit),
                actions::speed_up_responses,
            ));
        }
        if c.cache_health.enabled {
            let limit = c.cache_health.limit;
            sup.add_check(HealthCheck::new(
                "cache-health",
                "Cache health",
                7,
                c.cache_health.cooldown(),
                move |view: &SystemView<'_>| view.cache_utilization < limit,
                actions::optimize_cache,
            ));
        }
        if c.component_count.enabled {
            sup.add_check(HealthCheck::new(
                "component-count",
                "Component count",
                6,
                c.component_count.cooldown(),
                metric_below(MetricKind::ComponentCount, c.component_count.limit),
                actions::release_listeners,
            ));
        }
        if c.event_listeners.enabled {
            sup.add_check(HealthCheck::new(
                "event-listeners",
                "Event listeners",
                5,
                c.event_listeners.cooldown(),
                metric_below(MetricKind::ListenerCount, c.event_listeners.limit),
                actions::release_listeners,
            ));
        }
        sup
    }

    /// Registers a check, replacing any check with the same id.
    pub fn add_check(&mut self, check: HealthCheck) {
        self.slots.retain(|s| s.check.id != check.id);
        log::info!(
            "Supervisor: registered '{}' (priority={}, cooldown={:?})",
            check.id,
            check.priority,
            check.cooldown
        );
        let status = CheckStatus {
            id: check.id.clone(),
            name: check.name.clone(),
            status: CheckState::Pass,
            last_checked_at: None,
            consecutive_failures: 0,
            heal_attempts: 0,
        };
        self.slots.push(Slot { check, status });
        self.slots
            .sort_by(|a, b| b.check.priority.cmp(&a.check.priority));
    }

    /// Probes every check and heals those that qualify.
    pub fn run_checks(
        &mut self,
        view: &SystemView<'_>,
        ctx: &mut RemediationContext<'_>,
    ) -> Vec<HealAttempt> {
        let mut attempts = Vec::new();
        for slot in &mut self.slots {
            slot.status.last_checked_at = Some(ctx.now);
            if slot.check.probe.probe(view) {
                slot.status.status = CheckState::Pass;
                slot.status.consecutive_failures = 0;
                continue;
            }
            slot.status.status = CheckState::Fail;
            slot.status.consecutive_failures += 1;
            log::debug!(
                "Supervisor: '{}' failed ({} in a row)",
                slot.check.id,
                slot.status.consecutive_failures
            );
            if let Some(attempt) = Self::try_heal(slot, view, ctx) {
                attempts.push(attempt);
            }
        }
        attempts
    }

    /// Clears cooldowns and heals on demand.
    ///
    /// With an id, only that check is considered and it still needs a failure
    /// streak to heal. Without one, every cooldown is cleared and a full batch runs.
    pub fn force_heal(
        &mut self,
        check_id: Option<&str>,
        view: &SystemView<'_>,
        ctx: &mut RemediationContext<'_>,
    ) -> GovernorResult<Vec<HealAttempt>> {
        match check_id {
            Some(id) => {
                let slot = self
                    .slots
                    .iter_mut()
                    .find(|s| s.check.id == id)
                    .ok_or_else(|| GovernorError::UnknownCheck(id.to_owned()))?;
                slot.check.last_healed_at = None;
                log::info!("Supervisor: forced healing of '{}'", id);
                Ok(Self::try_heal(slot, view, ctx)
                    .into_iter()
                    .collect())
            }
            None => {
                for slot in &mut self.slots {
                    slot.check.last_healed_at = None;
                }
                log::info!("Supervisor: forced healing batch");
                Ok(self.run_checks(view, ctx))
            }
        }
    }

    fn try_heal(
        slot: &mut Slot,
        view: &SystemView<'_>,
        ctx: &mut RemediationContext<'_>,
    ) -> Option<HealAttempt> {
        let now = ctx.now;
        if slot.status.consecutive_failures < HEAL_AFTER_FAILURES
            || !slot.check.cooldown_elapsed(now)
        {
            return None;
        }

        log::info!("Supervisor: healing '{}'", slot.check.name);
        slot.status.heal_attempts += 1;
        let (result, elapsed) = remediation::execute(slot.check.remedy.as_mut(), ctx);
        slot.check.last_healed_at = Some(now);

        let after = SystemView {
            metrics: view.metrics,
            cache_utilization: ctx.cache.utilization(),
            now,
        };
        let recovered = result.is_ok() && slot.check.probe.probe(&after);
        if recovered {
            slot.status.status = CheckState::Pass;
            slot.status.consecutive_failures = 0;
            log::info!("Supervisor: '{}' recovered", slot.check.name);
        } else {
            slot.status.status = CheckState::Fail;
            slot.status.consecutive_failures += 1;
            match &result {
                Ok(()) => log::warn!("Supervisor: '{}' still failing after healing", slot.check.name),
                Err(e) => log::error!("Supervisor: healing '{}' failed: {}", slot.check.name, e),
            }
        }

        Some(HealAttempt {
            check_id: slot.check.id.clone(),
            result,
            recovered,
            elapsed,
        })
    }

    /// Worst-case rollup of every check.
    pub fn overall(&self) -> HealthLevel {
        let failing = self
            .slots
            .iter()
            .filter(|s| s.status.status == CheckState::Fail)
            .count();
        if self
            .slots
            .iter()
            .any(|s| s.status.consecutive_failures >= CRITICAL_FAILURES)
        {
            HealthLevel::Critical
        } else if failing > DEGRADED_FAILING_CHECKS {
            HealthLevel::Degraded
        } else {
            HealthLevel::Healthy
        }
    }

    /// Status of `id`.
    pub fn status(&self, id: &str) -> Option<&CheckStatus> {
        self.slots
            .iter()
            .find(|s| s.check.id == id)
            .map(|s| &s.status)
    }

    /// Status of every check, in priority order.
    pub fn statuses(&self) -> Vec<CheckStatus> {
        self.slots.iter().map(|s| s.status.clone()).collect()
    }

    /// Looks a check up by id.
    pub fn check(&self, id: &str) -> Option<&HealthCheck> {
        self.slots.iter().map(|s| &s.check).find(|c| c.id == id)
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no check is registered.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("checks", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActionError;
    use crate::remediation::{Advisories, GovernedCache};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use vigia_core::{MemoryStore, MetricsSnapshot};

    struct Harness {
        cache: GovernedCache,
        store: MemoryStore,
        advisories: Advisories,
        metrics: MetricsSnapshot,
    }

    impl Harness {
        fn new(now: Instant) -> Self {
            Self {
                cache: GovernedCache::default(),
                store: MemoryStore::new(),
                advisories: Advisories::default(),
                metrics: MetricsSnapshot::new(now),
            }
        }

        fn run(&mut self, sup: &mut Supervisor, now: Instant) -> Vec<HealAttempt> {
            let view = SystemView {
                metrics: &self.metrics,
                cache_utilization: self.cache.utilization(),
                now,
            };
            let mut ctx = RemediationContext::new(
                &mut self.cache,
                &mut self.store,
                &mut self.advisories,
                now,
                0,
                Duration::from_secs(5),
            );
            sup.run_checks(&view, &mut ctx)
        }

        fn force(
            &mut self,
            sup: &mut Supervisor,
            id: Option<&str>,
            now: Instant,
        ) -> GovernorResult<Vec<HealAttempt>> {
            let view = SystemView {
                metrics: &self.metrics,
                cache_utilization: self.cache.utilization(),
                now,
            };
            let mut ctx = RemediationContext::new(
                &mut self.cache,
                &mut self.store,
                &mut self.advisories,
                now,
                0,
                Duration::from_secs(5),
            );
            sup.force_heal(id, &view, &mut ctx)
        }
    }

    fn failing_check(id: &str, cooldown: Duration, heals: &Arc<AtomicUsize>) -> HealthCheck {
        let heals = Arc::clone(heals);
        HealthCheck::new(
            id,
            id,
            1,
            cooldown,
            |_: &SystemView<'_>| false,
            move |_: &mut RemediationContext<'_>| -> ActionResult {
                heals.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
    }

    #[test]
    fn test_heals_after_two_failures_once_per_cooldown() {
        let heals = Arc::new(AtomicUsize::new(0));
        let mut sup = Supervisor::new();
        sup.add_check(failing_check("broken", Duration::from_secs(30), &heals));
        let t0 = Instant::now();
        let mut h = Harness::new(t0);

        assert!(h.run(&mut sup, t0).is_empty());
        assert_eq!(sup.status("broken").unwrap().consecutive_failures, 1);

        let attempts = h.run(&mut sup, t0 + Duration::from_secs(15));
        assert_eq!(attempts.len(), 1);
        assert!(!attempts[0].recovered);
        assert_eq!(sup.status("broken").unwrap().consecutive_failures, 3);
        assert_eq!(sup.status("broken").unwrap().status, CheckState::Fail);
        // Healing settles within the call, the published status is already final.
        let published = serde_json::to_value(sup.statuses()).unwrap();
        assert_eq!(published[0]["status"], serde_json::json!("fail"));

        for secs in [20, 30, 44] {
            assert!(h.run(&mut sup, t0 + Duration::from_secs(secs)).is_empty());
        }
        assert_eq!(heals.load(Ordering::SeqCst), 1);

        assert_eq!(h.run(&mut sup, t0 + Duration::from_secs(45)).len(), 1);
        assert_eq!(heals.load(Ordering::SeqCst), 2);
        assert_eq!(sup.status("broken").unwrap().heal_attempts, 2);
    }

    #[test]
    fn test_successful_heal_resets_streak() {
        let healthy = Arc::new(AtomicBool::new(false));
        let probe_flag = Arc::clone(&healthy);
        let remedy_flag = Arc::clone(&healthy);
        let mut sup = Supervisor::new();
        sup.add_check(HealthCheck::new(
            "fixable",
            "Fixable",
            1,
            Duration::from_secs(10),
            move |_: &SystemView<'_>| probe_flag.load(Ordering::SeqCst),
            move |_: &mut RemediationContext<'_>| -> ActionResult {
                remedy_flag.store(true, Ordering::SeqCst);
                Ok(())
            },
        ));
        let t0 = Instant::now();
        let mut h = Harness::new(t0);
        h.run(&mut sup, t0);
        let attempts = h.run(&mut sup, t0);
        assert!(attempts[0].recovered);
        let status = sup.status("fixable").unwrap();
        assert_eq!(status.status, CheckState::Pass);
        assert_eq!(status.consecutive_failures, 0);
        assert_eq!(sup.check("fixable").unwrap().last_healed_at(), Some(t0));
    }

    #[test]
    fn test_failing_remedy_counts_as_failure() {
        let mut sup = Supervisor::new();
        sup.add_check(HealthCheck::new(
            "x",
            "X",
            1,
            Duration::from_secs(10),
            |_: &SystemView<'_>| false,
            |_: &mut RemediationContext<'_>| -> ActionResult {
                Err(ActionError::Unavailable("store".into()))
            },
        ));
        let t0 = Instant::now();
        let mut h = Harness::new(t0);
        h.run(&mut sup, t0);
        let attempts = h.run(&mut sup, t0);
        assert!(attempts[0].result.is_err());
        assert_eq!(sup.status("x").unwrap().consecutive_failures, 3);
        assert_eq!(sup.overall(), HealthLevel::Critical);
    }

    #[test]
    fn test_rollup_levels() {
        let heals = Arc::new(AtomicUsize::new(0));
        let mut sup = Supervisor::new();
        for id in ["a", "b", "c"] {
            sup.add_check(failing_check(id, Duration::from_secs(60), &heals));
        }
        let t0 = Instant::now();
        let mut h = Harness::new(t0);
        assert_eq!(sup.overall(), HealthLevel::Healthy);
        h.run(&mut sup, t0);
        assert_eq!(sup.overall(), HealthLevel::Degraded);
        h.run(&mut sup, t0);
        assert_eq!(sup.overall(), HealthLevel::Critical);
    }

    #[test]
    fn test_force_heal_clears_cooldown_but_needs_streak() {
        let heals = Arc::new(AtomicUsize::new(0));
        let mut sup = Supervisor::new();
        sup.add_check(failing_check("broken", Duration::from_secs(300), &heals));
        let t0 = Instant::now();
        let mut h = Harness::new(t0);

        assert!(h.force(&mut sup, Some("broken"), t0).unwrap().is_empty());
        h.run(&mut sup, t0);
        h.run(&mut sup, t0);
        assert_eq!(heals.load(Ordering::SeqCst), 1);

        assert_eq!(h.force(&mut sup, Some("broken"), t0).unwrap().len(), 1);
        assert_eq!(h.force(&mut sup, None, t0).unwrap().len(), 1);
        assert_eq!(heals.load(Ordering::SeqCst), 3);

        let err = h.force(&mut sup, Some("missing"), t0).unwrap_err();
        assert!(matches!(err, GovernorError::UnknownCheck(_)));
    }

    #[test]
    fn test_builtin_checks_pass_without_signals() {
        let mut sup = Supervisor::with_builtin_checks(&SupervisorConfig::default(), Duration::from_secs(60));
        assert_eq!(sup.len(), 6);
        let t0 = Instant::now();
        let mut h = Harness::new(t0);
        h.run(&mut sup, t0);
        assert!(sup.statuses().iter().all(|s| s.status == CheckState::Pass));

        h.metrics.set(MetricKind::ErrorRate, 9.0);
        h.run(&mut sup, t0);
        let attempts = h.run(&mut sup, t0);
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].check_id, "error-rate");
        assert!(h.advisories.is_active(
            crate::remediation::Advisory::RecoveryMode,
            t0
        ));
    }
}
