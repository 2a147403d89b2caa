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

//! Threshold-based insight derivation.
//!
//! Each signal is judged on its most recent value; signals the host never
//! reported produce nothing.

use std::collections::BTreeMap;
use vigia_core::telemetry::ResourceTiming;
use vigia_core::{Insight, InsightCategory, InsightSeverity, MetricKind, MetricsSnapshot};

/// DOM-ready time (ms) above which loading is considered slow.
const DOM_READY_SLOW_MS: f64 = 2000.0;
/// Full load time (ms) above which loading is considered slow.
const LOAD_COMPLETE_SLOW_MS: f64 = 5000.0;
/// Script fetch time (ms) above which a resource is considered slow.
const SCRIPT_SLOW_MS: f64 = 2000.0;
/// Largest contentful paint (ms) budget.
const LCP_BUDGET_MS: f64 = 2500.0;
/// First input delay (ms) budget.
const FID_BUDGET_MS: f64 = 100.0;
/// Cumulative layout shift budget.
const CLS_BUDGET: f64 = 0.1;
/// Interaction duration (ms) above which an interaction is slow.
const INTERACTION_SLOW_MS: f64 = 100.0;
const INTERACTION_HIGH_MS: f64 = 200.0;
const INTERACTION_CRITICAL_MS: f64 = 300.0;
/// Heap usage (%) above which memory is under pressure.
const MEMORY_PRESSURE_PERCENT: f64 = 90.0;

/// Impact an insight needs to become a recommendation.
const RECOMMENDATION_MIN_IMPACT: u8 = 7;
/// Maximum number of recommendations returned.
const MAX_RECOMMENDATIONS: usize = 5;

/// Derives insights from samples (oldest first) and recent resource timings.
pub fn derive_insights<'a>(
    samples: impl IntoIterator<Item = &'a MetricsSnapshot>,
    resources: impl IntoIterator<Item = &'a ResourceTiming>,
) -> Vec<Insight> {
    let mut latest: BTreeMap<MetricKind, f64> = BTreeMap::new();
    for sample in samples {
        latest.extend(sample.iter());
    }
    let value = |kind: MetricKind| latest.get(&kind).copied();
    let mut insights = Vec::new();

    if let Some(ms) = value(MetricKind::DomContentLoadedMs).filter(|v| *v > DOM_READY_SLOW_MS) {
        insights.push(Insight::new(
            InsightCategory::Loading,
            InsightSeverity::High,
            format!("Document took {ms:.0} ms to become ready"),
            "Defer non-critical scripts and split large bundles",
            9,
        ));
    }
    if let Some(ms) = value(MetricKind::LoadCompleteMs).filter(|v| *v > LOAD_COMPLETE_SLOW_MS) {
        insights.push(Insight::new(
            InsightCategory::Loading,
            InsightSeverity::Medium,
            format!("Page took {ms:.0} ms to finish loading"),
            "Lazy-load images and below-the-fold resources",
            7,
        ));
    }

    let mut slow_scripts: Vec<&ResourceTiming> = resources
        .into_iter()
        .filter(|r| is_script(&r.name) && r.duration_ms > SCRIPT_SLOW_MS)
        .collect();
    slow_scripts.sort_by(|a, b| b.duration_ms.total_cmp(&a.duration_ms));
    if let Some(slowest) = slow_scripts.first() {
        insights.push(Insight::new(
            InsightCategory::Loading,
            InsightSeverity::Medium,
            format!(
                "{} slow script(s); slowest {} took {:.0} ms",
                slow_scripts.len(),
                slowest.name,
                slowest.duration_ms
            ),
            "Code-split and cache large scripts",
            6,
        ));
    }

    if let Some(ms) = value(MetricKind::LargestContentfulPaintMs).filter(|v| *v > LCP_BUDGET_MS) {
        insights.push(Insight::new(
            InsightCategory::Loading,
            InsightSeverity::Critical,
            format!("Largest contentful paint at {ms:.0} ms"),
            "Optimise the hero image and preload critical resources",
            10,
        ));
    }
    if let Some(ms) = value(MetricKind::FirstInputDelayMs).filter(|v| *v > FID_BUDGET_MS) {
        insights.push(Insight::new(
            InsightCategory::Interactivity,
            InsightSeverity::High,
            format!("First input waited {ms:.0} ms"),
            "Break up long tasks on the main thread",
            9,
        ));
    }
    if let Some(score) = value(MetricKind::CumulativeLayoutShift).filter(|v| *v > CLS_BUDGET) {
        insights.push(Insight::new(
            InsightCategory::VisualStability,
            InsightSeverity::Medium,
            format!("Cumulative layout shift of {score:.3}"),
            "Reserve space for images and dynamic content",
            7,
        ));
    }
    if let Some(ms) = value(MetricKind::SlowestInteractionMs).filter(|v| *v > INTERACTION_SLOW_MS)
    {
        let (severity, impact) = if ms > INTERACTION_CRITICAL_MS {
            (InsightSeverity::Critical, 9)
        } else if ms > INTERACTION_HIGH_MS {
            (InsightSeverity::High, 8)
        } else {
            (InsightSeverity::Medium, 6)
        };
        insights.push(Insight::new(
            InsightCategory::Interactivity,
            severity,
            format!("Slowest interaction took {ms:.0} ms"),
            "Debounce handlers and move heavy work off the interaction path",
            impact,
        ));
    }
    if let Some(pct) =
        value(MetricKind::MemoryUsagePercent).filter(|v| *v > MEMORY_PRESSURE_PERCENT)
    {
        insights.push(Insight::new(
            InsightCategory::Resources,
            InsightSeverity::High,
            format!("Heap usage at {pct:.1}%"),
            "Release cached data and unused components",
            8,
        ));
    }

    insights
}

/// Up to five distinct recommendations from high-impact insights, highest impact first.
pub fn recommendations(insights: &[Insight]) -> Vec<String> {
    let mut ranked: Vec<&Insight> = insights
        .iter()
        .filter(|i| i.impact >= RECOMMENDATION_MIN_IMPACT)
        .collect();
    ranked.sort_by(|a, b| b.impact.cmp(&a.impact));

    let mut out: Vec<String> = Vec::new();
    for insight in ranked {
        if out.len() == MAX_RECOMMENDATIONS {
            break;
        }
        if !out.contains(&insight.recommendation) {
            out.push(insight.recommendation.clone());
        }
    }
    out
}

fn is_script(name: &str) -> bool {
    let path = name.split(['?', '#']).next().unwrap_or(name);
    path.ends_with(".js")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sample(values: &[(MetricKind, f64)]) -> MetricsSnapshot {
        let mut s = MetricsSnapshot::new(Instant::now());
        for (k, v) in values {
            s.set(*k, *v);
        }
        s
    }

    fn resource(name: &str, duration_ms: f64) -> ResourceTiming {
        ResourceTiming {
            name: name.into(),
            duration_ms,
            transfer_size: None,
        }
    }

    #[test]
    fn test_no_signals_no_insights() {
        let s = MetricsSnapshot::new(Instant::now());
        assert!(derive_insights([&s], []).is_empty());
    }

    #[test]
    fn test_thresholds_are_strict() {
        let s = sample(&[
            (MetricKind::DomContentLoadedMs, 2000.0),
            (MetricKind::LargestContentfulPaintMs, 2500.0),
            (MetricKind::CumulativeLayoutShift, 0.1),
            (MetricKind::MemoryUsagePercent, 90.0),
        ]);
        assert!(derive_insights([&s], []).is_empty());
    }

    #[test]
    fn test_each_signal_maps_to_its_insight() {
        let s = sample(&[
            (MetricKind::DomContentLoadedMs, 2500.0),
            (MetricKind::LoadCompleteMs, 6000.0),
            (MetricKind::LargestContentfulPaintMs, 3000.0),
            (MetricKind::FirstInputDelayMs, 150.0),
            (MetricKind::CumulativeLayoutShift, 0.25),
            (MetricKind::MemoryUsagePercent, 95.0),
        ]);
        let resources = [resource("https://x/app.js?v=3", 2500.0), resource("style.css", 9000.0)];
        let insights = derive_insights([&s], resources.iter());

        let found: Vec<(InsightCategory, InsightSeverity, u8)> = insights
            .iter()
            .map(|i| (i.category, i.severity, i.impact))
            .collect();
        assert_eq!(
            found,
            vec![
                (InsightCategory::Loading, InsightSeverity::High, 9),
                (InsightCategory::Loading, InsightSeverity::Medium, 7),
                (InsightCategory::Loading, InsightSeverity::Medium, 6),
                (InsightCategory::Loading, InsightSeverity::Critical, 10),
                (InsightCategory::Interactivity, InsightSeverity::High, 9),
                (InsightCategory::VisualStability, InsightSeverity::Medium, 7),
                (InsightCategory::Resources, InsightSeverity::High, 8),
            ]
        );
    }

    #[test]
    fn test_interaction_severity_tiers() {
        let severity_for = |ms: f64| {
            let s = sample(&[(MetricKind::SlowestInteractionMs, ms)]);
            derive_insights([&s], []).first().map(|i| i.severity)
        };
        assert_eq!(severity_for(100.0), None);
        assert_eq!(severity_for(150.0), Some(InsightSeverity::Medium));
        assert_eq!(severity_for(250.0), Some(InsightSeverity::High));
        assert_eq!(severity_for(350.0), Some(InsightSeverity::Critical));
    }

    #[test]
    fn test_most_recent_value_wins() {
        let old = sample(&[(MetricKind::FirstInputDelayMs, 500.0)]);
        let new = sample(&[(MetricKind::FirstInputDelayMs, 20.0)]);
        assert!(derive_insights([&old, &new], []).is_empty());
    }

    #[test]
    fn test_recommendations_ranked_and_capped() {
        let mk = |impact: u8, text: &str| {
            Insight::new(
                InsightCategory::Loading,
                InsightSeverity::High,
                "d",
                text,
                impact,
            )
        };
        let insights = vec![
            mk(6, "low"),
            mk(7, "a"),
            mk(10, "b"),
            mk(9, "c"),
            mk(9, "c"),
            mk(8, "d"),
            mk(7, "e"),
            mk(8, "f"),
        ];
        assert_eq!(recommendations(&insights), vec!["b", "c", "d", "f", "a"]);
    }
}
