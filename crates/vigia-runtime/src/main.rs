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

use anyhow::Result;
use std::thread;
use std::time::{Duration, Instant};
use vigia_sdk::prelude::*;

const RUN_FOR: Duration = Duration::from_secs(6);

fn demo_config() -> VigiaConfig {
    let mut config = VigiaConfig::default();
    let schedule = &mut config.governor.schedule;
    schedule.sample_ms = 250;
    schedule.evaluate_ms = 500;
    schedule.predict_ms = 1_000;
    schedule.health_check_ms = 1_500;
    schedule.cleanup_ms = 3_000;
    config.service.tick_rate = 20;
    config
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut service = GovernorService::spawn(
        demo_config(),
        Box::new(SysinfoSource::for_current_process()),
        Box::new(MemoryStore::new()),
    )?;
    let handle = service.handle();
    log::info!("Runtime: governing this process for {:?}", RUN_FOR);

    let started = Instant::now();
    let mut round = 0u64;
    while started.elapsed() < RUN_FOR {
        round += 1;
        let key = format!("report-{}", round % 8);
        let hit = handle.with_cache(|cache| {
            let now = Instant::now();
            if cache.get(&key, now).is_some() {
                return true;
            }
            cache.put(key.clone(), serde_json::json!({ "round": round }), PutOptions::new(), now);
            false
        })?;
        if !hit {
            handle.record_behavior("navigation", &key)?;
        }
        if let Err(e) = handle.send(GovernorEvent::Render {
            duration_ms: Some(4.0 + (round % 5) as f64),
        }) {
            log::debug!("Runtime: {}", e);
        }
        thread::sleep(Duration::from_millis(100));
    }

    service.stop();
    let status = handle.status();
    log::info!(
        "Runtime: finished after {} ticks, health {:?}",
        status.ticks,
        status.level
    );
    println!("{}", status.to_json_pretty()?);
    Ok(())
}
