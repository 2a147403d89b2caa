use std::time::{Duration, Instant};
use vigia_core::telemetry::{NavigationTiming, PaintTiming};
use vigia_core::{HostSnapshot, InsightSeverity, MetricKind, PerformanceSource};
use vigia_telemetry::{ScriptedSource, SysinfoSource, TelemetryCollector, TelemetryConfig};

#[test]
fn test_sysinfo_source_reports_native_signals_only() {
    let mut source = SysinfoSource::for_current_process();
    let snapshot = source.snapshot();

    assert!(snapshot.navigation.is_none());
    assert!(snapshot.paint.is_none());
    if let Some(cpu) = snapshot.cpu_load {
        assert!((0.0..=1.0).contains(&cpu));
    }
}

#[test]
fn test_slow_page_produces_ranked_recommendations() -> anyhow::Result<()> {
    let source = ScriptedSource::steady(HostSnapshot {
        navigation: Some(NavigationTiming {
            dom_content_loaded_ms: Some(3200.0),
            load_complete_ms: Some(4000.0),
            time_to_first_byte_ms: None,
        }),
        paint: Some(PaintTiming {
            first_contentful_paint_ms: Some(900.0),
            largest_contentful_paint_ms: Some(4100.0),
        }),
        ..Default::default()
    });
    let mut collector = TelemetryCollector::new(TelemetryConfig::default(), Box::new(source));

    let t0 = Instant::now();
    let sample = collector.sample_once(t0);
    assert_eq!(sample.get(MetricKind::FirstContentfulPaintMs), Some(900.0));

    let window = Duration::from_secs(60);
    let insights = collector.derive_insights(window, t0);
    assert_eq!(insights.len(), 2);
    assert!(insights
        .iter()
        .any(|i| i.severity == InsightSeverity::Critical && i.impact == 10));

    let recs = collector.recommendations(window, t0);
    anyhow::ensure!(recs.len() == 2, "expected two recommendations, got {recs:?}");
    assert!(recs[0].contains("hero image"));
    Ok(())
}
