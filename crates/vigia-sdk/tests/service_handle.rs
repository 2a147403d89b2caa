use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use vigia_sdk::prelude::*;

const FAST: &str = r#"{
    "governor": {
        "schedule": {
            "sample_ms": 10,
            "evaluate_ms": 10,
            "predict_ms": 20,
            "health_check_ms": 20,
            "cleanup_ms": 50
        }
    },
    "service": { "tick_rate": 200 }
}"#;

fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_spawned_service_notifies_subscribers() -> anyhow::Result<()> {
    let config = VigiaConfig::from_json_str(FAST)?;
    let mut service = GovernorService::spawn(
        config,
        Box::new(ScriptedSource::new()),
        Box::new(MemoryStore::new()),
    )?;
    let handle = service.handle();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    handle.subscribe(Box::new(move |status: &GovernorStatus| {
        if let Ok(mut seen) = sink.lock() {
            seen.push(status.ticks);
        }
    }))?;

    assert!(eventually(|| seen.lock().map(|s| s.len() >= 3).unwrap_or(false)));
    service.stop();

    let ticks = seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.clone();
    assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
    assert!(!handle.status().running);
    Ok(())
}

#[test]
fn test_handle_drives_cache_and_critical_alerts() -> anyhow::Result<()> {
    let source = ScriptedSource::new();
    let config = VigiaConfig::from_json_str(FAST)?;
    let mut service = GovernorService::spawn(
        config,
        Box::new(source.clone()),
        Box::new(MemoryStore::new()),
    )?;
    let handle = service.handle();

    handle.with_cache(|cache| {
        cache.put("profile", serde_json::json!({ "name": "ada" }), PutOptions::new(), Instant::now())
    })?;
    let cached = handle.with_cache(|cache| cache.get("profile", Instant::now()))?;
    assert!(cached.is_some());

    handle.send(GovernorEvent::Metric {
        kind: MetricKind::MemoryUsagePercent,
        value: 95.0,
    })?;
    assert!(eventually(|| handle.status().has_critical_alert()));
    assert_eq!(handle.status().level, HealthLevel::Critical);

    let alert = handle
        .status()
        .alerts
        .into_iter()
        .find(|a| a.severity == AlertSeverity::Critical && a.auto_fix_available())
        .ok_or_else(|| anyhow::anyhow!("no fixable critical alert"))?;
    assert_eq!(handle.auto_fix_alert(alert.id)?, AutoFixOutcome::Applied);

    service.stop();
    Ok(())
}
