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

//! A deterministic host source for tests and demos.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use vigia_core::{HostSnapshot, PerformanceSource};

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<HostSnapshot>,
    steady: HostSnapshot,
    reads: usize,
}

/// Replays queued snapshots, then repeats a steady-state snapshot.
///
/// Clones share the same script, so a test can keep a clone and change
/// what the host reports after handing the source to the governor.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    /// A source that reports nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that always reports `steady`.
    pub fn steady(steady: HostSnapshot) -> Self {
        let source = Self::new();
        source.set_steady(steady);
        source
    }

    /// Replaces the steady-state snapshot.
    pub fn set_steady(&self, steady: HostSnapshot) {
        self.with_script(|s| s.steady = steady);
    }

    /// Queues a one-off snapshot, served before the steady state.
    pub fn push(&self, snapshot: HostSnapshot) {
        self.with_script(|s| s.queued.push_back(snapshot));
    }

    /// How many snapshots have been read.
    pub fn reads(&self) -> usize {
        self.with_script(|s| s.reads)
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut Script) -> T) -> T {
        let mut script = self.script.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut script)
    }
}

impl PerformanceSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn snapshot(&mut self) -> HostSnapshot {
        self.with_script(|s| {
            s.reads += 1;
            s.queued.pop_front().unwrap_or_else(|| s.steady.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_then_steady() {
        let mut source = ScriptedSource::steady(HostSnapshot {
            cpu_load: Some(0.1),
            ..Default::default()
        });
        let handle = source.clone();
        handle.push(HostSnapshot {
            cpu_load: Some(0.9),
            ..Default::default()
        });

        assert_eq!(source.snapshot().cpu_load, Some(0.9));
        assert_eq!(source.snapshot().cpu_load, Some(0.1));
        assert_eq!(source.snapshot().cpu_load, Some(0.1));
        assert_eq!(handle.reads(), 3);
    }
}
