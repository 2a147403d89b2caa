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

//! Background driver for a [`Governor`].

use crate::config::{ServiceConfig, VigiaConfig};
use crate::error::{SdkError, SdkResult};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;
use uuid::Uuid;
use vigia_control::{
    AutoFixOutcome, GovernedCache, Governor, GovernorEvent, GovernorStatus, HealAttempt,
    RuleExecution, StatusListener, SubscriptionId,
};
use vigia_core::{KeyValueStore, PerformanceSource, SystemClock};

/// Drives a [`Governor`] on a dedicated thread.
///
/// Each loop iteration drains the event queue, ticks the governor, then
/// sleeps for the rest of the tick. Subscribers are notified on that thread.
pub struct GovernorService {
    config: ServiceConfig,
    governor: Arc<Mutex<Governor>>,
    last_status: Arc<Mutex<GovernorStatus>>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    event_tx: Sender<GovernorEvent>,
}

impl GovernorService {
    /// Wraps a governor. Call [`start`](Self::start) with the returned receiver.
    pub fn new(governor: Governor, config: ServiceConfig) -> (Self, Receiver<GovernorEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(config.event_buffer_size.max(1));
        let status = governor.status();
        let service = Self {
            config,
            governor: Arc::new(Mutex::new(governor)),
            last_status: Arc::new(Mutex::new(status)),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            event_tx: tx,
        };
        (service, rx)
    }

    /// Builds a governor on the system clock and starts driving it.
    pub fn spawn(
        config: VigiaConfig,
        source: Box<dyn PerformanceSource>,
        store: Box<dyn KeyValueStore>,
    ) -> SdkResult<Self> {
        let governor = Governor::new(config.governor, source, store, Arc::new(SystemClock))?;
        let (mut service, rx) = Self::new(governor, config.service);
        service.start(rx);
        Ok(service)
    }

    /// Starts the background thread.
    pub fn start(&mut self, event_rx: Receiver<GovernorEvent>) {
        if self.running.load(Ordering::SeqCst) {
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let governor = Arc::clone(&self.governor);
        let last_status = Arc::clone(&self.last_status);
        let tick_duration = self.config.tick_duration();

        let handle = thread::spawn(move || {
            log::info!("GovernorService: thread started.");

            while running.load(Ordering::Relaxed) {
                let start_time = Instant::now();

                let Ok(mut guard) = governor.lock() else {
                    log::error!("GovernorService: governor lock poisoned, stopping.");
                    running.store(false, Ordering::SeqCst);
                    break;
                };

                // 1. Ingest pending events
                while let Ok(event) = event_rx.try_recv() {
                    if let Err(e) = guard.ingest(event) {
                        log::warn!("GovernorService: event rejected: {}", e);
                    }
                }

                // 2. Run due tasks
                if !guard.tick().is_empty() {
                    let status = guard.status();
                    drop(guard);
                    *last_status.lock().unwrap_or_else(PoisonError::into_inner) = status;
                } else {
                    drop(guard);
                }

                // 3. Sleep until next tick
                let elapsed = start_time.elapsed();
                if elapsed < tick_duration {
                    thread::sleep(tick_duration - elapsed);
                }
            }
            log::info!("GovernorService: thread stopped.");
        });

        self.handle = Some(handle);
    }

    /// Stops the thread, then the governor. No tick runs after this returns.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("GovernorService: thread panicked.");
            }
        }
        let mut governor = self.governor.lock().unwrap_or_else(PoisonError::into_inner);
        if governor.is_running() {
            governor.stop();
            *self.last_status.lock().unwrap_or_else(PoisonError::into_inner) = governor.status();
        }
    }

    /// Returns `true` while the thread is driving the governor.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns a sender to submit events to the governor.
    pub fn event_sender(&self) -> Sender<GovernorEvent> {
        self.event_tx.clone()
    }

    /// Returns a cloneable handle for the presentation layer.
    pub fn handle(&self) -> GovernorHandle {
        GovernorHandle {
            governor: Arc::clone(&self.governor),
            last_status: Arc::clone(&self.last_status),
            running: Arc::clone(&self.running),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl Drop for GovernorService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Synchronous, short-lock access to a running governor.
#[derive(Clone)]
pub struct GovernorHandle {
    governor: Arc<Mutex<Governor>>,
    last_status: Arc<Mutex<GovernorStatus>>,
    running: Arc<AtomicBool>,
    event_tx: Sender<GovernorEvent>,
}

impl GovernorHandle {
    fn lock(&self) -> SdkResult<MutexGuard<'_, Governor>> {
        self.governor.lock().map_err(|_| SdkError::Poisoned)
    }

    fn with_governor<T>(
        &self,
        f: impl FnOnce(&mut Governor) -> Result<T, vigia_control::GovernorError>,
    ) -> SdkResult<T> {
        let mut governor = self.lock()?;
        Ok(f(&mut governor)?)
    }

    /// Current status, or the last one seen if the governor is unavailable.
    pub fn status(&self) -> GovernorStatus {
        match self.governor.lock() {
            Ok(governor) => {
                let status = governor.status();
                drop(governor);
                *self.last_status.lock().unwrap_or_else(PoisonError::into_inner) = status.clone();
                status
            }
            Err(_) => {
                log::warn!("GovernorHandle: lock poisoned, serving last known status.");
                self.last_status
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
            }
        }
    }

    /// Returns `true` while the service thread runs.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Queues an event for the next tick. Dropped if the queue is full.
    pub fn send(&self, event: GovernorEvent) -> SdkResult<()> {
        self.event_tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => {
                log::debug!("GovernorHandle: event queue full, dropping event.");
                SdkError::QueueFull
            }
            TrySendError::Disconnected(_) => SdkError::Disconnected,
        })
    }

    /// Runs `f` with the governed cache.
    pub fn with_cache<T>(&self, f: impl FnOnce(&mut GovernedCache) -> T) -> SdkResult<T> {
        let mut governor = self.lock()?;
        Ok(f(governor.cache_mut()))
    }

    /// See [`Governor::subscribe`].
    pub fn subscribe(&self, listener: StatusListener) -> SdkResult<SubscriptionId> {
        Ok(self.lock()?.subscribe(listener))
    }

    /// See [`Governor::unsubscribe`].
    pub fn unsubscribe(&self, id: SubscriptionId) -> SdkResult<bool> {
        Ok(self.lock()?.unsubscribe(id))
    }

    /// See [`Governor::force_optimize`].
    pub fn force_optimize(&self, rule_id: Option<&str>) -> SdkResult<Option<RuleExecution>> {
        self.with_governor(|g| g.force_optimize(rule_id))
    }

    /// See [`Governor::force_heal`].
    pub fn force_heal(&self, check_id: Option<&str>) -> SdkResult<Vec<HealAttempt>> {
        self.with_governor(|g| g.force_heal(check_id))
    }

    /// See [`Governor::acknowledge_alert`].
    pub fn acknowledge_alert(&self, id: Uuid) -> SdkResult<bool> {
        self.with_governor(|g| g.acknowledge_alert(id))
    }

    /// See [`Governor::dismiss_alert`].
    pub fn dismiss_alert(&self, id: Uuid) -> SdkResult<bool> {
        self.with_governor(|g| g.dismiss_alert(id))
    }

    /// See [`Governor::auto_fix_alert`].
    pub fn auto_fix_alert(&self, id: Uuid) -> SdkResult<AutoFixOutcome> {
        self.with_governor(|g| g.auto_fix_alert(id))
    }

    /// See [`Governor::record_behavior`].
    pub fn record_behavior(&self, kind: &str, key: &str) -> SdkResult<()> {
        self.with_governor(|g| g.record_behavior(kind, key))
    }
}

impl std::fmt::Debug for GovernorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernorHandle")
            .field("running", &self.is_running())
            .field("queued_events", &self.event_tx.len())
            .finish()
    }
}
