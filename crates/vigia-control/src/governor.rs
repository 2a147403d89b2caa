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

//! The governor: owns every component and runs them on a schedule.
//!
//! A [`Governor`] is single-threaded. Drivers call [`Governor::tick`]
//! periodically; each tick runs the due phases in a fixed order, then
//! notifies subscribers with a fresh [`GovernorStatus`].

use crate::alerts::{AlertCategory, AlertDraft, AlertSeverity, AlertsEngine, AutoFixOutcome};
use crate::analyzer::{BehaviorPattern, Prediction, PredictiveAnalyzer};
use crate::config::GovernorConfig;
use crate::error::{GovernorError, GovernorResult};
use crate::remediation::{
    ActionRecord, ActionResult, ActionSource, Advisories, GovernedCache, RemediationContext,
    SystemView,
};
use crate::rules::{OptimizationRule, RuleEngine, RuleExecution};
use crate::scheduler::{Phase, Scheduler};
use crate::status::GovernorStatus;
use crate::supervisor::{HealAttempt, HealthCheck, HealthLevel, Supervisor};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;
use vigia_core::store::prune_stale_entries;
use vigia_core::{
    Clock, Insight, InsightSeverity, KeyValueStore, MetricKind, MetricsSnapshot,
    PerformanceSource, Stopwatch,
};
use vigia_telemetry::{
    CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry, ScopedMetricTimer,
    TelemetryCollector,
};

const SELF_NAMESPACE: &str = "vigia";

/// Identifies a status subscription.
pub type SubscriptionId = u64;

/// Receives every status the governor publishes.
pub type StatusListener = Box<dyn FnMut(&GovernorStatus) + Send>;

/// Something the host pushes into the governor between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum GovernorEvent {
    /// Overrides a metric in the next sample.
    Metric {
        /// Which metric.
        kind: MetricKind,
        /// Its value.
        value: f64,
    },
    /// An application error occurred.
    Error,
    /// A render happened.
    Render {
        /// How long it took, if measured.
        duration_ms: Option<f64>,
    },
    /// An interaction completed after this many milliseconds.
    ResponseTime(f64),
    /// The user did something worth learning from.
    Behavior {
        /// Event kind, e.g. `"navigation"`.
        kind: String,
        /// Event key, e.g. a route.
        key: String,
    },
    /// Runs an optimization rule now.
    ForceOptimize(Option<String>),
    /// Heals now.
    ForceHeal(Option<String>),
}

/// Counters the governor keeps about itself.
#[derive(Debug)]
struct SelfMetrics {
    registry: MetricsRegistry,
    ticks: CounterHandle,
    samples: CounterHandle,
    rule_executions: CounterHandle,
    heal_attempts: CounterHandle,
    alerts_raised: CounterHandle,
    phase_failures: CounterHandle,
    tick_time: HistogramHandle,
    cache_utilization: GaugeHandle,
}

impl SelfMetrics {
    fn new() -> GovernorResult<Self> {
        let registry = MetricsRegistry::new();
        let ns = SELF_NAMESPACE;
        Ok(Self {
            ticks: registry.register_counter(ns, "ticks", "Ticks that ran at least one task")?,
            samples: registry.register_counter(ns, "samples", "Telemetry samples taken")?,
            rule_executions: registry.register_counter(
                ns,
                "rule_executions",
                "Optimization rule runs",
            )?,
            heal_attempts: registry.register_counter(ns, "heal_attempts", "Healing attempts")?,
            alerts_raised: registry.register_counter(ns, "alerts_raised", "Alerts stored")?,
            phase_failures: registry.register_counter(
                ns,
                "phase_failures",
                "Scheduled tasks that reported an error",
            )?,
            tick_time: registry.register_histogram(
                ns,
                "tick_time",
                "Real time spent per tick",
                "ms",
                vec![0.5, 1.0, 5.0, 10.0, 50.0, 100.0],
            )?,
            cache_utilization: registry.register_gauge(
                ns,
                "cache_utilization",
                "Share of cache capacity in use",
                "ratio",
            )?,
            registry,
        })
    }

    fn bump(counter: &CounterHandle, by: usize) {
        if by == 0 {
            return;
        }
        if let Err(e) = counter.increment_by(by as u64) {
            log::warn!("Governor: failed to update {}: {}", counter.id(), e);
        }
    }
}

/// The adaptive performance governor.
pub struct Governor {
    config: GovernorConfig,
    clock: Arc<dyn Clock>,
    cache: GovernedCache,
    store: Box<dyn KeyValueStore>,
    advisories: Advisories,
    telemetry: TelemetryCollector,
    analyzer: PredictiveAnalyzer,
    alerts: AlertsEngine,
    rules: RuleEngine,
    supervisor: Supervisor,
    scheduler: Scheduler,
    latest: MetricsSnapshot,
    predictions: BTreeMap<String, Prediction>,
    behaviors: Vec<BehaviorPattern>,
    insights: Vec<Insight>,
    recommendations: Vec<String>,
    actions: VecDeque<ActionRecord>,
    subscribers: Vec<(SubscriptionId, StatusListener)>,
    next_subscription: SubscriptionId,
    ticks: u64,
    metrics: SelfMetrics,
}

impl Governor {
    /// Builds a governor with the built-in rules and checks.
    ///
    /// Nothing runs until the first [`tick`](Self::tick).
    pub fn new(
        config: GovernorConfig,
        source: Box<dyn PerformanceSource>,
        store: Box<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> GovernorResult<Self> {
        config.validate()?;
        let stale_after = config.remediation.stale_entry_age();
        let governor = Self {
            cache: GovernedCache::new(config.cache.clone()),
            store,
            advisories: Advisories::default(),
            telemetry: TelemetryCollector::new(config.telemetry.clone(), source),
            analyzer: PredictiveAnalyzer::new(config.analyzer.clone()),
            alerts: AlertsEngine::new(config.alerts.clone(), stale_after),
            rules: RuleEngine::with_builtin_rules(&config.rules, stale_after),
            supervisor: Supervisor::with_builtin_checks(&config.supervisor, stale_after),
            scheduler: Scheduler::new(&config.schedule),
            latest: MetricsSnapshot::new(clock.now()),
            predictions: BTreeMap::new(),
            behaviors: Vec::new(),
            insights: Vec::new(),
            recommendations: Vec::new(),
            actions: VecDeque::new(),
            subscribers: Vec::new(),
            next_subscription: 1,
            ticks: 0,
            metrics: SelfMetrics::new()?,
            clock,
            config,
        };
        log::info!(
            "Governor: initialized with {} rules and {} health checks",
            governor.rules.len(),
            governor.supervisor.len()
        );
        Ok(governor)
    }

    /// The active configuration.
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// The clock every component reads.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Runs every due task in phase order, then notifies subscribers.
    ///
    /// Returns the phases that ran. Does nothing once stopped.
    pub fn tick(&mut self) -> Vec<Phase> {
        let now = self.clock.now();
        let due = self.scheduler.due(now);
        if due.is_empty() {
            return due;
        }

        let histogram = self.metrics.tick_time.clone();
        let timer = ScopedMetricTimer::new(&histogram);
        for phase in &due {
            let result = self.run_phase(*phase, now);
            if let Err(e) = &result {
                log::warn!("Governor: {:?} task failed: {}", phase, e);
                SelfMetrics::bump(&self.metrics.phase_failures, 1);
            }
            self.scheduler.complete(*phase, now, result.is_ok());
        }
        drop(timer);

        self.ticks += 1;
        SelfMetrics::bump(&self.metrics.ticks, 1);
        if let Err(e) = self.metrics.cache_utilization.set(self.cache.utilization()) {
            log::warn!("Governor: failed to update cache utilization: {}", e);
        }
        log::debug!("Governor: tick {} ran {:?}", self.ticks, due);
        self.notify();
        due
    }

    fn run_phase(&mut self, phase: Phase, now: Instant) -> GovernorResult<()> {
        match phase {
            Phase::Sample => self.sample(now),
            Phase::Evaluate => self.evaluate(now),
            Phase::Predict => self.refresh_predictions(now),
            Phase::HealthCheck => self.check_health(now),
            Phase::Cleanup => self.cleanup(now),
        }
    }

    fn sample(&mut self, now: Instant) -> GovernorResult<()> {
        let mut snapshot = self.telemetry.sample_once(now);
        if !snapshot.contains(MetricKind::CacheHitRate) {
            if let Some(rate) = self.cache.hit_rate() {
                snapshot.set(MetricKind::CacheHitRate, rate);
            }
        }
        self.analyzer.record_snapshot(&snapshot);
        self.latest = snapshot;
        self.metrics.samples.increment()?;
        Ok(())
    }

    fn evaluate(&mut self, now: Instant) -> GovernorResult<()> {
        let raised = self.alerts.analyze(&self.latest, now);
        self.metrics.alerts_raised.increment_by(raised.len() as u64)?;

        let wall = self.clock.wall_clock_ms();
        let budget = self.config.remediation.action_timeout();
        let mut ctx = RemediationContext::new(
            &mut self.cache,
            self.store.as_mut(),
            &mut self.advisories,
            now,
            wall,
            budget,
        );
        if let Some(execution) = self.rules.evaluate(&self.latest, &mut ctx) {
            self.record_rule(&execution, now)?;
        }
        Ok(())
    }

    fn refresh_predictions(&mut self, now: Instant) -> GovernorResult<()> {
        self.predictions = self.analyzer.predict_all(self.config.analyzer.horizon);
        self.behaviors = self.analyzer.predict_behavior(None, now);

        let window = self.config.telemetry.insight_window();
        self.insights = self.telemetry.derive_insights(window, now);
        self.recommendations = vigia_telemetry::recommendations(&self.insights);

        let drafts: Vec<AlertDraft> = self.insights.iter().filter_map(insight_alert).collect();
        let raised = drafts
            .into_iter()
            .filter_map(|d| self.alerts.raise(d, now))
            .count();
        self.metrics.alerts_raised.increment_by(raised as u64)?;
        log::debug!(
            "Governor: {} forecasts, {} insights",
            self.predictions.len(),
            self.insights.len()
        );
        Ok(())
    }

    fn check_health(&mut self, now: Instant) -> GovernorResult<()> {
        let view = SystemView {
            metrics: &self.latest,
            cache_utilization: self.cache.utilization(),
            now,
        };
        let wall = self.clock.wall_clock_ms();
        let budget = self.config.remediation.action_timeout();
        let mut ctx = RemediationContext::new(
            &mut self.cache,
            self.store.as_mut(),
            &mut self.advisories,
            now,
            wall,
            budget,
        );
        let attempts = self.supervisor.run_checks(&view, &mut ctx);
        self.record_heals(&attempts, now)
    }

    fn cleanup(&mut self, now: Instant) -> GovernorResult<()> {
        let purged = self.cache.purge_expired(now);
        let forgotten = self.analyzer.gc_behaviors(now);
        self.advisories.expire(now);
        let pruned = prune_stale_entries(
            self.store.as_mut(),
            self.clock.wall_clock_ms(),
            self.config.remediation.stale_entry_age(),
        )?;
        log::debug!(
            "Governor: cleanup purged {} cache entries, {} behaviors, {} stored keys",
            purged,
            forgotten,
            pruned
        );
        Ok(())
    }

    fn record_rule(&mut self, execution: &RuleExecution, now: Instant) -> GovernorResult<()> {
        self.record_action(ActionRecord::new(
            ActionSource::Rule,
            execution.rule_id.as_str(),
            &execution.result,
            execution.elapsed,
            now,
        ));
        self.metrics.rule_executions.increment()?;
        Ok(())
    }

    fn record_heals(&mut self, attempts: &[HealAttempt], now: Instant) -> GovernorResult<()> {
        for attempt in attempts {
            self.record_action(ActionRecord::new(
                ActionSource::HealthCheck,
                attempt.check_id.as_str(),
                &attempt.result,
                attempt.elapsed,
                now,
            ));
        }
        self.metrics
            .heal_attempts
            .increment_by(attempts.len() as u64)?;
        Ok(())
    }

    fn record_action(&mut self, record: ActionRecord) {
        self.actions.push_back(record);
        while self.actions.len() > self.config.remediation.action_log_len {
            self.actions.pop_front();
        }
    }

    fn ensure_running(&self) -> GovernorResult<()> {
        if self.scheduler.is_stopped() {
            Err(GovernorError::Stopped)
        } else {
            Ok(())
        }
    }

    /// Aggregates the current state of every component.
    pub fn status(&self) -> GovernorStatus {
        let now = self.clock.now();
        let alert_level = if self.alerts.critical_unacknowledged().next().is_some() {
            HealthLevel::Critical
        } else {
            HealthLevel::Healthy
        };
        GovernorStatus {
            level: self.supervisor.overall().max(alert_level),
            running: self.is_running(),
            ticks: self.ticks,
            checks: self.supervisor.statuses(),
            alerts: self.alerts.alerts().cloned().collect(),
            predictions: self.predictions.clone(),
            behaviors: self.behaviors.clone(),
            insights: self.insights.clone(),
            recommendations: self.recommendations.clone(),
            cache: self.cache.stats(),
            metrics: self.latest.to_map(),
            advisories: self.advisories.active(now),
            recent_actions: self.actions.iter().cloned().collect(),
            rules: self.rules.reports(now),
            tasks: self.scheduler.summaries(),
            self_metrics: self.metrics.registry.readings(),
        }
    }

    /// Registers a listener and immediately hands it the current status.
    pub fn subscribe(&mut self, mut listener: StatusListener) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        listener(&self.status());
        self.subscribers.push((id, listener));
        log::debug!("Governor: subscription {} added", id);
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        before != self.subscribers.len()
    }

    fn notify(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let status = self.status();
        for (_, listener) in &mut self.subscribers {
            listener(&status);
        }
    }

    /// The governed cache.
    pub fn cache(&self) -> &GovernedCache {
        &self.cache
    }

    /// The governed cache, for the host's own reads and writes.
    pub fn cache_mut(&mut self) -> &mut GovernedCache {
        &mut self.cache
    }

    /// The host key/value store.
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// The latest sampled metrics.
    pub fn latest_metrics(&self) -> &MetricsSnapshot {
        &self.latest
    }

    /// Forecast for `kind` at the configured horizon.
    pub fn predict(&self, kind: MetricKind) -> Option<Prediction> {
        self.analyzer
            .predict(&kind.id(), self.config.analyzer.horizon)
    }

    /// Direct access to the analyzer.
    pub fn analyzer(&self) -> &PredictiveAnalyzer {
        &self.analyzer
    }

    /// Runs an optimization rule now, ignoring cooldowns.
    pub fn force_optimize(&mut self, rule_id: Option<&str>) -> GovernorResult<Option<RuleExecution>> {
        self.ensure_running()?;
        let now = self.clock.now();
        let wall = self.clock.wall_clock_ms();
        let budget = self.config.remediation.action_timeout();
        let mut ctx = RemediationContext::new(
            &mut self.cache,
            self.store.as_mut(),
            &mut self.advisories,
            now,
            wall,
            budget,
        );
        let execution = self.rules.force(rule_id, &self.latest, &mut ctx)?;
        if let Some(execution) = &execution {
            self.record_rule(execution, now)?;
        }
        self.notify();
        Ok(execution)
    }

    /// Heals now, clearing cooldowns.
    pub fn force_heal(&mut self, check_id: Option<&str>) -> GovernorResult<Vec<HealAttempt>> {
        self.ensure_running()?;
        let now = self.clock.now();
        let view = SystemView {
            metrics: &self.latest,
            cache_utilization: self.cache.utilization(),
            now,
        };
        let wall = self.clock.wall_clock_ms();
        let budget = self.config.remediation.action_timeout();
        let mut ctx = RemediationContext::new(
            &mut self.cache,
            self.store.as_mut(),
            &mut self.advisories,
            now,
            wall,
            budget,
        );
        let attempts = self.supervisor.force_heal(check_id, &view, &mut ctx)?;
        self.record_heals(&attempts, now)?;
        self.notify();
        Ok(attempts)
    }

    /// Marks an alert as seen. Returns whether it existed; unknown ids are a no-op.
    pub fn acknowledge_alert(&mut self, id: Uuid) -> GovernorResult<bool> {
        self.ensure_running()?;
        let found = self.alerts.acknowledge(id);
        if found {
            self.notify();
        }
        Ok(found)
    }

    /// Removes an alert. Returns whether it existed.
    pub fn dismiss_alert(&mut self, id: Uuid) -> GovernorResult<bool> {
        self.ensure_running()?;
        let removed = self.alerts.dismiss(id);
        if removed {
            self.notify();
        }
        Ok(removed)
    }

    /// Applies an alert's auto-fix. Unknown ids report [`AutoFixOutcome::NotFound`].
    pub fn auto_fix_alert(&mut self, id: Uuid) -> GovernorResult<AutoFixOutcome> {
        self.ensure_running()?;
        let now = self.clock.now();
        let wall = self.clock.wall_clock_ms();
        let budget = self.config.remediation.action_timeout();
        let stopwatch = Stopwatch::start();
        let mut ctx = RemediationContext::new(
            &mut self.cache,
            self.store.as_mut(),
            &mut self.advisories,
            now,
            wall,
            budget,
        );
        let outcome = self.alerts.auto_fix(id, &mut ctx);
        let result: ActionResult = match &outcome {
            AutoFixOutcome::Applied => Ok(()),
            AutoFixOutcome::Failed(e) => Err(e.clone()),
            AutoFixOutcome::Ineligible | AutoFixOutcome::NotFound => return Ok(outcome),
        };
        self.record_action(ActionRecord::new(
            ActionSource::Alert,
            id.to_string(),
            &result,
            stopwatch.elapsed(),
            now,
        ));
        self.notify();
        Ok(outcome)
    }

    /// Records a user behavior for pattern learning.
    pub fn record_behavior(&mut self, kind: &str, key: &str) -> GovernorResult<()> {
        self.ensure_running()?;
        let now = self.clock.now();
        self.analyzer.record_behavior(kind, key, now);
        Ok(())
    }

    /// Applies an event pushed by the host.
    pub fn ingest(&mut self, event: GovernorEvent) -> GovernorResult<()> {
        self.ensure_running()?;
        match event {
            GovernorEvent::Metric { kind, value } => self.telemetry.record_metric(kind, value),
            GovernorEvent::Error => self.telemetry.record_error(),
            GovernorEvent::Render { duration_ms } => self.telemetry.record_render(duration_ms),
            GovernorEvent::ResponseTime(ms) => self.telemetry.record_response_time(ms),
            GovernorEvent::Behavior { kind, key } => self.record_behavior(&kind, &key)?,
            GovernorEvent::ForceOptimize(rule) => {
                self.force_optimize(rule.as_deref())?;
            }
            GovernorEvent::ForceHeal(check) => {
                self.force_heal(check.as_deref())?;
            }
        }
        Ok(())
    }

    /// Registers an optimization rule.
    pub fn add_rule(&mut self, rule: OptimizationRule) {
        self.rules.add_rule(rule);
    }

    /// Registers a health check.
    pub fn add_check(&mut self, check: HealthCheck) {
        self.supervisor.add_check(check);
    }

    /// Cancels every task. Later ticks and operations do nothing.
    pub fn stop(&mut self) {
        if self.scheduler.is_stopped() {
            return;
        }
        self.scheduler.stop();
        log::info!("Governor: stopped after {} ticks", self.ticks);
        self.notify();
    }

    /// Returns `false` once stopped.
    pub fn is_running(&self) -> bool {
        !self.scheduler.is_stopped()
    }
}

impl std::fmt::Debug for Governor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Governor")
            .field("running", &self.is_running())
            .field("ticks", &self.ticks)
            .field("telemetry", &self.telemetry)
            .field("supervisor", &self.supervisor)
            .field("cache", &self.cache)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Critical insights surface as warnings, high ones as information.
fn insight_alert(insight: &Insight) -> Option<AlertDraft> {
    let severity = match insight.severity {
        InsightSeverity::Critical => AlertSeverity::Warning,
        InsightSeverity::High => AlertSeverity::Info,
        _ => return None,
    };
    let category = AlertCategory::from(insight.category);
    Some(
        AlertDraft::new(
            severity,
            category,
            format!("{:?} insight", category),
            insight.description.clone(),
        )
        .recommend(insight.recommendation.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remediation::Advisory;
    use std::sync::Mutex;
    use std::time::Duration;
    use vigia_core::telemetry::{HostSnapshot, MemoryUsage};
    use vigia_core::{ManualClock, MemoryStore};
    use vigia_telemetry::ScriptedSource;

    fn governor_with(source: ScriptedSource) -> (Governor, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let governor = Governor::new(
            GovernorConfig::default(),
            Box::new(source),
            Box::new(MemoryStore::new()),
            clock.clone(),
        )
        .unwrap();
        (governor, clock)
    }

    fn memory_at(percent: u64) -> HostSnapshot {
        HostSnapshot {
            memory: Some(MemoryUsage {
                used_bytes: percent,
                limit_bytes: 100,
            }),
            ..HostSnapshot::default()
        }
    }

    #[test]
    fn test_first_tick_runs_every_phase() {
        let (mut governor, clock) = governor_with(ScriptedSource::new());
        assert_eq!(governor.tick(), Phase::ALL.to_vec());
        assert!(governor.tick().is_empty());
        clock.advance(Duration::from_secs(2));
        assert_eq!(governor.tick(), vec![Phase::Sample]);
        assert_eq!(governor.status().ticks, 2);
    }

    #[test]
    fn test_pushed_events_land_in_the_next_sample() {
        let (mut governor, _clock) = governor_with(ScriptedSource::new());
        governor.ingest(GovernorEvent::Error).unwrap();
        governor.ingest(GovernorEvent::Error).unwrap();
        governor
            .ingest(GovernorEvent::Metric {
                kind: MetricKind::ComponentCount,
                value: 12.0,
            })
            .unwrap();
        governor.tick();
        let latest = governor.latest_metrics();
        assert_eq!(latest.get(MetricKind::ErrorRate), Some(2.0));
        assert_eq!(latest.get(MetricKind::ComponentCount), Some(12.0));
    }

    #[test]
    fn test_critical_memory_raises_fixable_alert_and_runs_cleanup_rule() {
        let (mut governor, _clock) = governor_with(ScriptedSource::steady(memory_at(90)));
        governor.tick();

        let status = governor.status();
        assert_eq!(status.level, HealthLevel::Critical);
        let alert = status
            .alerts
            .iter()
            .find(|a| a.severity == AlertSeverity::Critical)
            .unwrap();
        assert!(alert.auto_fix_available());
        assert!(status
            .recent_actions
            .iter()
            .any(|a| a.source == ActionSource::Rule && a.id == "memory-cleanup"));
        assert!(status.advisories.contains(&Advisory::ReduceAllocations));

        assert_eq!(
            governor.auto_fix_alert(alert.id).unwrap(),
            AutoFixOutcome::Applied
        );
        assert!(!governor.status().has_critical_alert());
    }

    #[test]
    fn test_unknown_rules_and_checks_are_reported() {
        let (mut governor, _clock) = governor_with(ScriptedSource::new());
        assert!(matches!(
            governor.force_optimize(Some("nope")),
            Err(GovernorError::UnknownRule(_))
        ));
        assert!(matches!(
            governor.force_heal(Some("nope")),
            Err(GovernorError::UnknownCheck(_))
        ));
    }

    #[test]
    fn test_unknown_alert_ids_are_noops() {
        let (mut governor, _clock) = governor_with(ScriptedSource::new());
        governor.tick();
        let before = governor.status();

        assert!(!governor.acknowledge_alert(Uuid::new_v4()).unwrap());
        assert!(!governor.dismiss_alert(Uuid::new_v4()).unwrap());
        assert_eq!(
            governor.auto_fix_alert(Uuid::new_v4()).unwrap(),
            AutoFixOutcome::NotFound
        );

        let after = governor.status();
        assert_eq!(after.alerts.len(), before.alerts.len());
        assert_eq!(after.recent_actions.len(), before.recent_actions.len());
    }

    #[test]
    fn test_subscribers_get_replay_and_every_tick() {
        let (mut governor, clock) = governor_with(ScriptedSource::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = governor.subscribe(Box::new(move |s: &GovernorStatus| {
            sink.lock().unwrap().push(s.ticks);
        }));
        governor.tick();
        clock.advance(Duration::from_secs(2));
        governor.tick();
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);

        assert!(governor.unsubscribe(id));
        assert!(!governor.unsubscribe(id));
        clock.advance(Duration::from_secs(2));
        governor.tick();
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_stopped_governor_refuses_work() {
        let (mut governor, clock) = governor_with(ScriptedSource::new());
        governor.stop();
        assert!(!governor.is_running());
        clock.advance(Duration::from_secs(60));
        assert!(governor.tick().is_empty());
        assert!(matches!(
            governor.ingest(GovernorEvent::Error),
            Err(GovernorError::Stopped)
        ));
        assert!(matches!(
            governor.force_optimize(None),
            Err(GovernorError::Stopped)
        ));
        assert_eq!(governor.status().ticks, 0);
    }

    #[test]
    fn test_high_insight_becomes_info_alert() {
        let insight = Insight::new(
            vigia_core::InsightCategory::Interactivity,
            InsightSeverity::High,
            "slow",
            "fix it",
            9,
        );
        let draft = insight_alert(&insight).unwrap();
        assert_eq!(draft.severity, AlertSeverity::Info);
        assert_eq!(draft.category, AlertCategory::Interactivity);

        let low = Insight { severity: InsightSeverity::Medium, ..insight };
        assert!(insight_alert(&low).is_none());
    }
}
