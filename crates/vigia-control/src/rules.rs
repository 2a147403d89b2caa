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

//! Condition/action optimization rules.
//!
//! Rules are kept sorted by priority (highest first, registration order on
//! ties). A pass runs at most one action: the first rule whose condition
//! holds and whose cooldown has elapsed since its last *attempt*.

use crate::actions;
use crate::error::{GovernorError, GovernorResult};
use crate::remediation::{self, ActionResult, RemediationContext, Remedy};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use vigia_core::{MetricKind, MetricsSnapshot};

type Condition = Box<dyn Fn(&MetricsSnapshot) -> bool + Send>;

/// Lifecycle of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleState {
    /// Waiting for its condition.
    Idle,
    /// Its action is running.
    Executing,
}

/// A condition over the latest metrics paired with a remediation action.
pub struct OptimizationRule {
    id: String,
    description: String,
    priority: u32,
    cooldown: Duration,
    condition: Condition,
    action: Box<dyn Remedy>,
    state: RuleState,
    last_attempted_at: Option<Instant>,
    last_succeeded_at: Option<Instant>,
    executions: u64,
    failures: u64,
}

impl OptimizationRule {
    /// Creates an idle rule that has never run.
    pub fn new<C, A>(
        id: impl Into<String>,
        description: impl Into<String>,
        priority: u32,
        cooldown: Duration,
        condition: C,
        action: A,
    ) -> Self
    where
        C: Fn(&MetricsSnapshot) -> bool + Send + 'static,
        A: Remedy + 'static,
    {
        Self {
            id: id.into(),
            description: description.into(),
            priority,
            cooldown,
            condition: Box::new(condition),
            action: Box::new(action),
            state: RuleState::Idle,
            last_attempted_at: None,
            last_succeeded_at: None,
            executions: 0,
            failures: 0,
        }
    }

    /// Rule id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Rule priority; higher runs first.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// When the action last started.
    pub fn last_attempted_at(&self) -> Option<Instant> {
        self.last_attempted_at
    }

    /// When the action last succeeded.
    pub fn last_succeeded_at(&self) -> Option<Instant> {
        self.last_succeeded_at
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.last_attempted_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.cooldown)
    }

    fn holds(&self, metrics: &MetricsSnapshot) -> bool {
        (self.condition)(metrics)
    }

    fn run(&mut self, ctx: &mut RemediationContext<'_>) -> RuleExecution {
        self.state = RuleState::Executing;
        self.last_attempted_at = Some(ctx.now);
        let (result, elapsed) = remediation::execute(self.action.as_mut(), ctx);
        match &result {
            Ok(()) => {
                self.last_succeeded_at = Some(ctx.now);
                self.executions += 1;
                log::info!("Rules: '{}' applied in {:?}", self.id, elapsed);
            }
            Err(e) => {
                self.failures += 1;
                log::warn!("Rules: '{}' failed: {}", self.id, e);
            }
        }
        self.state = RuleState::Idle;
        RuleExecution {
            rule_id: self.id.clone(),
            result,
            elapsed,
        }
    }
}

impl std::fmt::Debug for OptimizationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimizationRule")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("cooldown", &self.cooldown)
            .field("state", &self.state)
            .finish()
    }
}

/// Outcome of one rule action.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleExecution {
    /// Which rule ran.
    pub rule_id: String,
    /// What its action returned.
    pub result: ActionResult,
    /// Real time spent.
    pub elapsed: Duration,
}

/// Public view of a rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleReport {
    /// Rule id.
    pub id: String,
    /// What the rule does.
    pub description: String,
    /// Priority.
    pub priority: u32,
    /// Current state.
    pub state: RuleState,
    /// Successful runs.
    pub executions: u64,
    /// Failed runs.
    pub failures: u64,
    /// Time left before the rule may run again, in milliseconds.
    pub cooldown_remaining_ms: u64,
}

/// Threshold and cooldown of a built-in rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    /// Whether the rule is registered at all.
    pub enabled: bool,
    /// Trigger threshold, in the unit of the watched metric.
    pub threshold: f64,
    /// Minimum time between attempts, in milliseconds.
    pub cooldown_ms: u64,
}

impl RuleSettings {
    const fn new(threshold: f64, cooldown_ms: u64) -> Self {
        Self {
            enabled: true,
            threshold,
            cooldown_ms,
        }
    }

    fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Settings of the built-in rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Memory usage (%) above which caches and stored data are released.
    pub memory_cleanup: RuleSettings,
    /// Errors per sample above which recovery mode is advised.
    pub error_mitigation: RuleSettings,
    /// Cache hit rate (%) below which the cache is optimized.
    pub cache_optimization: RuleSettings,
    /// Renders per sample above which throttling is advised.
    pub render_throttling: RuleSettings,
    /// Response time (ms) above which preloading is advised.
    pub resource_preloading: RuleSettings,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            memory_cleanup: RuleSettings::new(80.0, 30_000),
            error_mitigation: RuleSettings::new(2.0, 20_000),
            cache_optimization: RuleSettings::new(60.0, 60_000),
            render_throttling: RuleSettings::new(20.0, 45_000),
            resource_preloading: RuleSettings::new(300.0, 120_000),
        }
    }
}

fn above(kind: MetricKind, threshold: f64) -> impl Fn(&MetricsSnapshot) -> bool + Send {
    move |m| m.get(kind).is_some_and(|v| v > threshold)
}

fn below(kind: MetricKind, threshold: f64) -> impl Fn(&MetricsSnapshot) -> bool + Send {
    move |m| m.get(kind).is_some_and(|v| v < threshold)
}

/// Priority-ordered set of optimization rules.
#[derive(Debug, Default)]
pub struct RuleEngine {
    rules: Vec<OptimizationRule>,
}

impl RuleEngine {
    /// Creates an engine with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the enabled built-in rules.
    ///
    /// `stale_after` is the age past which stored entries are pruned by memory cleanup.
    pub fn with_builtin_rules(config: &RulesConfig, stale_after: Duration) -> Self {
        let mut engine = Self::new();
        let c = config;
        if c.memory_cleanup.enabled {
            engine.add_rule(OptimizationRule::new(
                "memory-cleanup",
                "Release caches and stale stored data under memory pressure",
                10,
                c.memory_cleanup.cooldown(),
                above(MetricKind::MemoryUsagePercent, c.memory_cleanup.threshold),
                actions::release_memory(stale_after),
            ));
        }
        if c.error_mitigation.enabled {
            engine.add_rule(OptimizationRule::new(
                "error-mitigation",
                "Enter recovery mode when errors spike",
                9,
                c.error_mitigation.cooldown(),
                above(MetricKind::ErrorRate, c.error_mitigation.threshold),
                actions::mitigate_errors,
            ));
        }
        if c.cache_optimization.enabled {
            engine.add_rule(OptimizationRule::new(
                "cache-optimization",
                "Drop cold entries and pin hot ones when the hit rate sags",
                8,
                c.cache_optimization.cooldown(),
                below(MetricKind::CacheHitRate, c.cache_optimization.threshold),
                actions::optimize_cache,
            ));
        }
        if c.render_throttling.enabled {
            engine.add_rule(OptimizationRule::new(
                "render-throttling",
                "Coalesce renders when the render rate is high",
                7,
                c.render_throttling.cooldown(),
                above(MetricKind::RenderCount, c.render_throttling.threshold),
                actions::throttle_renders,
            ));
        }
        if c.resource_preloading.enabled {
            engine.add_rule(OptimizationRule::new(
                "resource-preloading",
                "Preload critical resources when responses are slow",
                6,
                c.resource_preloading.cooldown(),
                above(MetricKind::ResponseTimeMs, c.resource_preloading.threshold),
                actions::preload_resources,
            ));
        }
        engine
    }

    /// Registers a rule, replacing any rule with the same id.
    pub fn add_rule(&mut self, rule: OptimizationRule) {
        if let Some(pos) = self.rules.iter().position(|r| r.id == rule.id) {
            log::info!("Rules: replacing '{}'", rule.id);
            self.rules.remove(pos);
        }
        log::info!(
            "Rules: registered '{}' (priority={}, cooldown={:?})",
            rule.id,
            rule.priority,
            rule.cooldown
        );
        self.rules.push(rule);
        // Stable sort keeps registration order among equal priorities.
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// Runs the highest-priority rule whose condition holds and whose cooldown elapsed.
    pub fn evaluate(
        &mut self,
        metrics: &MetricsSnapshot,
        ctx: &mut RemediationContext<'_>,
    ) -> Option<RuleExecution> {
        let now = ctx.now;
        let rule = self.rules.iter_mut().find(|r| {
            r.state == RuleState::Idle && r.cooldown_elapsed(now) && r.holds(metrics)
        })?;
        Some(rule.run(ctx))
    }

    /// Runs a rule on demand, ignoring cooldowns.
    ///
    /// With an id, that rule runs regardless of its condition. Without one,
    /// the highest-priority rule whose condition holds runs, if any.
    pub fn force(
        &mut self,
        rule_id: Option<&str>,
        metrics: &MetricsSnapshot,
        ctx: &mut RemediationContext<'_>,
    ) -> GovernorResult<Option<RuleExecution>> {
        match rule_id {
            Some(id) => {
                let rule = self
                    .rules
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| GovernorError::UnknownRule(id.to_owned()))?;
                log::info!("Rules: forcing '{}'", id);
                Ok(Some(rule.run(ctx)))
            }
            None => Ok(self
                .rules
                .iter_mut()
                .find(|r| r.holds(metrics))
                .map(|r| r.run(ctx))),
        }
    }

    /// Looks a rule up by id.
    pub fn rule(&self, id: &str) -> Option<&OptimizationRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Rule ids in evaluation order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Public view of every rule, in evaluation order.
    pub fn reports(&self, now: Instant) -> Vec<RuleReport> {
        self.rules
            .iter()
            .map(|r| RuleReport {
                id: r.id.clone(),
                description: r.description.clone(),
                priority: r.priority,
                state: r.state,
                executions: r.executions,
                failures: r.failures,
                cooldown_remaining_ms: r
                    .last_attempted_at
                    .map(|at| r.cooldown.saturating_sub(now.saturating_duration_since(at)))
                    .unwrap_or_default()
                    .as_millis() as u64,
            })
            .collect()
    }
}
