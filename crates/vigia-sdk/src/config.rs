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

//! Configuration of the background service.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vigia_control::{GovernorConfig, GovernorError, GovernorResult};

/// How the service drives the governor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Frequency of the driver loop in Hz.
    pub tick_rate: u32,
    /// Maximum number of queued events.
    /// If the queue is full, new events are dropped.
    pub event_buffer_size: usize,
}

impl ServiceConfig {
    /// Time between two loop iterations.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tick_rate: 10,
            event_buffer_size: 1000,
        }
    }
}

/// Governor and service settings in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VigiaConfig {
    /// Component settings.
    pub governor: GovernorConfig,
    /// Driver settings.
    pub service: ServiceConfig,
}

impl VigiaConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> GovernorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.governor.validate()?;
        if config.service.tick_rate == 0 || config.service.event_buffer_size == 0 {
            return Err(GovernorError::Config(
                "service.tick_rate and service.event_buffer_size must be positive".into(),
            ));
        }
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> GovernorResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::info!("Config: loading {}", path.as_ref().display());
        Self::from_json_str(&text)
    }
}
