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

//! Cooperative periodic tasks.
//!
//! Each [`Phase`] is a task with its own interval. A tick asks which phases
//! are due and runs them in declaration order; nothing runs concurrently.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// The governor's periodic tasks, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Read the host and feed the analyzer.
    Sample,
    /// Raise alerts and run optimization rules.
    Evaluate,
    /// Refresh forecasts, insights and recommendations.
    Predict,
    /// Run health checks and heal.
    HealthCheck,
    /// Purge expired state.
    Cleanup,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 5] = [
        Phase::Sample,
        Phase::Evaluate,
        Phase::Predict,
        Phase::HealthCheck,
        Phase::Cleanup,
    ];
}

/// Interval of each task, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Sampling interval.
    pub sample_ms: u64,
    /// Alert and rule evaluation interval.
    pub evaluate_ms: u64,
    /// Forecast refresh interval.
    pub predict_ms: u64,
    /// Health check interval.
    pub health_check_ms: u64,
    /// Cleanup interval.
    pub cleanup_ms: u64,
}

impl ScheduleConfig {
    /// Interval of `phase`.
    pub fn interval(&self, phase: Phase) -> Duration {
        Duration::from_millis(match phase {
            Phase::Sample => self.sample_ms,
            Phase::Evaluate => self.evaluate_ms,
            Phase::Predict => self.predict_ms,
            Phase::HealthCheck => self.health_check_ms,
            Phase::Cleanup => self.cleanup_ms,
        })
    }

    /// The shortest interval, used by drivers to pace their loop.
    pub fn min_interval(&self) -> Duration {
        Phase::ALL
            .into_iter()
            .map(|p| self.interval(p))
            .min()
            .unwrap_or_default()
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sample_ms: 2_000,
            evaluate_ms: 5_000,
            predict_ms: 10_000,
            health_check_ms: 15_000,
            cleanup_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone)]
struct Task {
    phase: Phase,
    interval: Duration,
    last_run: Option<Instant>,
    runs: u64,
    failures: u64,
}

/// Public view of a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSummary {
    /// Which task.
    pub phase: Phase,
    /// Its interval, in milliseconds.
    pub interval_ms: u64,
    /// Completed runs.
    pub runs: u64,
    /// Runs that reported a failure.
    pub failures: u64,
}

/// Decides which tasks are due.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tasks: Vec<Task>,
    stopped: bool,
}

impl Scheduler {
    /// Creates a scheduler whose tasks are all due on the first tick.
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            tasks: Phase::ALL
                .into_iter()
                .map(|phase| Task {
                    phase,
                    interval: config.interval(phase),
                    last_run: None,
                    runs: 0,
                    failures: 0,
                })
                .collect(),
            stopped: false,
        }
    }

    /// Phases due at `now`, in execution order. Empty once stopped.
    pub fn due(&self, now: Instant) -> Vec<Phase> {
        if self.stopped {
            return Vec::new();
        }
        self.tasks
            .iter()
            .filter(|t| {
                t.last_run
                    .map_or(true, |at| now.saturating_duration_since(at) >= t.interval)
            })
            .map(|t| t.phase)
            .collect()
    }

    /// Records that `phase` ran at `now`.
    pub fn complete(&mut self, phase: Phase, now: Instant, ok: bool) {
        if let Some(task) = self.tasks.iter_mut().find(|t| t.phase == phase) {
            task.last_run = Some(now);
            task.runs += 1;
            if !ok {
                task.failures += 1;
            }
            log::trace!("Scheduler: {:?} completed (ok={})", phase, ok);
        }
    }

    /// Cancels every task.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Returns `true` once stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Public view of every task.
    pub fn summaries(&self) -> Vec<TaskSummary> {
        self.tasks
            .iter()
            .map(|t| TaskSummary {
                phase: t.phase,
                interval_ms: t.interval.as_millis() as u64,
                runs: t.runs,
                failures: t.failures,
            })
            .collect()
    }
}
