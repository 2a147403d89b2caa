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

//! Qualitative findings derived from sampled telemetry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The area of user-perceived performance an insight concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    /// Load and paint milestones, slow resources.
    Loading,
    /// Input latency and slow interactions.
    Interactivity,
    /// Unexpected layout movement.
    VisualStability,
    /// Memory and CPU pressure.
    Resources,
}

/// How bad an insight is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSeverity {
    /// Worth knowing.
    Low,
    /// Noticeable.
    Medium,
    /// Hurting users.
    High,
    /// Severely hurting users.
    Critical,
}

impl fmt::Display for InsightSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InsightSeverity::Low => "low",
            InsightSeverity::Medium => "medium",
            InsightSeverity::High => "high",
            InsightSeverity::Critical => "critical",
        };
        f.write_str(text)
    }
}

/// A finding about the host's performance, with a suggested fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// What area is affected.
    pub category: InsightCategory,
    /// How severe it is.
    pub severity: InsightSeverity,
    /// What was observed.
    pub description: String,
    /// What to do about it.
    pub recommendation: String,
    /// Expected benefit of acting on it, 1 to 10.
    pub impact: u8,
}

impl Insight {
    /// Creates an insight. `impact` is clamped to `1..=10`.
    pub fn new(
        category: InsightCategory,
        severity: InsightSeverity,
        description: impl Into<String>,
        recommendation: impl Into<String>,
        impact: u8,
    ) -> Self {
        Self {
            category,
            severity,
            description: description.into(),
            recommendation: recommendation.into(),
            impact: impact.clamp(1, 10),
        }
    }
}
