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

//! sysinfo-based host source for native processes.

use sysinfo::{Pid, ProcessesToUpdate, System};
use vigia_core::telemetry::MemoryUsage;
use vigia_core::{HostSnapshot, PerformanceSource};

/// Reports memory and CPU load of the machine, or of the current process.
///
/// Native hosts have no document lifecycle, so timing signals are absent.
pub struct SysinfoSource {
    system: System,
    process: Option<Pid>,
}

impl SysinfoSource {
    /// Reports system-wide memory usage against total memory.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_usage();
        Self {
            system,
            process: None,
        }
    }

    /// Reports the current process's resident memory against total memory.
    ///
    /// Falls back to system-wide memory if the pid cannot be determined.
    pub fn for_current_process() -> Self {
        let mut source = Self::new();
        match sysinfo::get_current_pid() {
            Ok(pid) => source.process = Some(pid),
            Err(e) => log::warn!("SysinfoSource: current pid unavailable ({e}), using system memory"),
        }
        source
    }

    fn memory(&mut self) -> Option<MemoryUsage> {
        self.system.refresh_memory();
        let limit_bytes = self.system.total_memory();
        if limit_bytes == 0 {
            return None;
        }
        let used_bytes = match self.process {
            Some(pid) => {
                self.system
                    .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                self.system.process(pid)?.memory()
            }
            None => self.system.used_memory(),
        };
        Some(MemoryUsage {
            used_bytes,
            limit_bytes,
        })
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceSource for SysinfoSource {
    fn name(&self) -> &str {
        "sysinfo"
    }

    fn snapshot(&mut self) -> HostSnapshot {
        self.system.refresh_cpu_usage();
        HostSnapshot {
            memory: self.memory(),
            cpu_load: Some(f64::from(self.system.global_cpu_usage()) / 100.0),
            ..Default::default()
        }
    }
}
