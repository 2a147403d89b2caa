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

//! The seam between decisions and their effects.
//!
//! Rules, health checks and alert fixes all act through a
//! [`RemediationContext`], which exposes only what remediation may touch:
//! the cache, the host key/value store and the advisory board read by the
//! presentation layer.

use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use vigia_cache::TieredCache;
use vigia_core::{KeyValueStore, MetricKind, MetricsSnapshot, Stopwatch};

/// Outcome of a remediation action.
pub type ActionResult = Result<(), ActionError>;

/// The cache type governed by the orchestrator.
pub type GovernedCache = TieredCache<serde_json::Value>;

/// A behavioral hint for the presentation layer, active until it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    /// Coalesce renders and skip non-essential updates.
    ThrottleRenders,
    /// Detach listeners and unmount idle components.
    ReleaseListeners,
    /// Fetch critical resources during idle time.
    PreloadCritical,
    /// Retry failed operations with longer timeouts and fall back to safe defaults.
    RecoveryMode,
    /// Avoid allocating new caches and buffers.
    ReduceAllocations,
}

/// The set of currently raised advisories.
#[derive(Debug, Default, Clone)]
pub struct Advisories {
    active: BTreeMap<Advisory, Instant>,
}

impl Advisories {
    /// Raises `advisory` for `duration`, extending it if already active.
    pub fn raise(&mut self, advisory: Advisory, duration: Duration, now: Instant) {
        let until = now + duration;
        let slot = self.active.entry(advisory).or_insert(until);
        if *slot < until {
            *slot = until;
        }
    }

    /// Returns `true` while `advisory` is active.
    pub fn is_active(&self, advisory: Advisory, now: Instant) -> bool {
        self.active.get(&advisory).is_some_and(|until| *until > now)
    }

    /// Active advisories, in declaration order.
    pub fn active(&self, now: Instant) -> Vec<Advisory> {
        self.active
            .iter()
            .filter(|(_, until)| **until > now)
            .map(|(a, _)| *a)
            .collect()
    }

    /// Forgets expired advisories.
    pub fn expire(&mut self, now: Instant) {
        self.active.retain(|_, until| *until > now);
    }
}

/// Mutable access handed to a remediation action.
pub struct RemediationContext<'a> {
    /// The governed cache.
    pub cache: &'a mut GovernedCache,
    /// The host key/value store.
    pub store: &'a mut dyn KeyValueStore,
    /// Hints for the presentation layer.
    pub advisories: &'a mut Advisories,
    /// Current monotonic time.
    pub now: Instant,
    /// Current wall-clock time, epoch milliseconds.
    pub wall_clock_ms: u64,
    budget: Duration,
    stopwatch: Stopwatch,
}

impl<'a> RemediationContext<'a> {
    /// Creates a context whose actions are bounded by `budget` of real time.
    pub fn new(
        cache: &'a mut GovernedCache,
        store: &'a mut dyn KeyValueStore,
        advisories: &'a mut Advisories,
        now: Instant,
        wall_clock_ms: u64,
        budget: Duration,
    ) -> Self {
        Self {
            cache,
            store,
            advisories,
            now,
            wall_clock_ms,
            budget,
            stopwatch: Stopwatch::start(),
        }
    }

    /// Real time allowed per action.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Real time spent in the current action.
    pub fn elapsed(&self) -> Duration {
        self.stopwatch.elapsed()
    }

    /// Long-running actions should poll this and return early once it is `true`.
    pub fn deadline_exceeded(&self) -> bool {
        self.stopwatch.exceeded(self.budget)
    }

    fn restart(&mut self) {
        self.stopwatch = Stopwatch::start();
    }
}

/// A remediation action.
pub trait Remedy: Send {
    /// Applies the action.
    fn apply(&mut self, ctx: &mut RemediationContext<'_>) -> ActionResult;
}

impl<F> Remedy for F
where
    F: FnMut(&mut RemediationContext<'_>) -> ActionResult + Send,
{
    fn apply(&mut self, ctx: &mut RemediationContext<'_>) -> ActionResult {
        self(ctx)
    }
}

/// What a health probe can look at.
#[derive(Debug, Clone, Copy)]
pub struct SystemView<'a> {
    /// The latest sample.
    pub metrics: &'a MetricsSnapshot,
    /// Cache utilization, 0.0 to 1.0.
    pub cache_utilization: f64,
    /// Current monotonic time.
    pub now: Instant,
}

impl SystemView<'_> {
    /// Shorthand for `self.metrics.get(kind)`.
    pub fn metric(&self, kind: MetricKind) -> Option<f64> {
        self.metrics.get(kind)
    }
}

/// A health probe. Returns `true` when healthy.
pub trait Probe: Send {
    /// Runs the probe.
    fn probe(&mut self, view: &SystemView<'_>) -> bool;
}

impl<F> Probe for F
where
    F: FnMut(&SystemView<'_>) -> bool + Send,
{
    fn probe(&mut self, view: &SystemView<'_>) -> bool {
        self(view)
    }
}

/// Runs `remedy` under the context's time budget.
///
/// An action that reports success but overran its budget is recorded as
/// [`ActionError::TimedOut`].
pub(crate) fn execute(
    remedy: &mut dyn Remedy,
    ctx: &mut RemediationContext<'_>,
) -> (ActionResult, Duration) {
    ctx.restart();
    let result = remedy.apply(ctx);
    let elapsed = ctx.elapsed();
    let result = match result {
        Ok(()) if elapsed > ctx.budget => Err(ActionError::TimedOut {
            elapsed,
            budget: ctx.budget,
        }),
        other => other,
    };
    (result, elapsed)
}

/// Which component triggered an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    /// An optimization rule.
    Rule,
    /// A health check's healing remedy.
    HealthCheck,
    /// An alert's auto-fix.
    Alert,
}

/// One executed remediation.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    /// Trigger.
    pub source: ActionSource,
    /// Rule id, check id, or alert id.
    pub id: String,
    /// `None` on success, otherwise the error text.
    pub error: Option<String>,
    /// Real time spent.
    pub elapsed_ms: f64,
    /// When it ran.
    #[serde(skip)]
    pub at: Instant,
}

impl ActionRecord {
    pub(crate) fn new(
        source: ActionSource,
        id: impl Into<String>,
        result: &ActionResult,
        elapsed: Duration,
        at: Instant,
    ) -> Self {
        Self {
            source,
            id: id.into(),
            error: result.as_ref().err().map(ToString::to_string),
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            at,
        }
    }

    /// Returns `true` if the action succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}
