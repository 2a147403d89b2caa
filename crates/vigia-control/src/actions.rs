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

//! Built-in remediation actions shared by rules, health checks and alert fixes.

use crate::remediation::{ActionResult, Advisory, RemediationContext};
use std::time::Duration;
use vigia_core::store::prune_stale_entries;

/// How long an advisory raised by a built-in action stays active.
pub const ADVISORY_TTL: Duration = Duration::from_secs(60);

/// Fraction of each layer kept by a memory release.
const MEMORY_TRIM_FRACTION: f64 = 0.5;

/// Low-priority entries idle this long are dropped by a cache optimization.
const COLD_ENTRY_IDLE: Duration = Duration::from_secs(5 * 60);

/// Reads needed before an entry is treated as hot.
const HOT_ENTRY_MIN_ACCESSES: u32 = 5;

/// Releases cached and stored data and asks the host to hold off allocating.
pub fn release_memory(
    stale_after: Duration,
) -> impl FnMut(&mut RemediationContext<'_>) -> ActionResult + Send {
    move |ctx| {
        let purged = ctx.cache.purge_expired(ctx.now);
        let trimmed = ctx.cache.trim_to(MEMORY_TRIM_FRACTION, ctx.now);
        ctx.advisories
            .raise(Advisory::ReduceAllocations, ADVISORY_TTL, ctx.now);
        let pruned = prune_stale_entries(ctx.store, ctx.wall_clock_ms, stale_after)?;
        log::info!(
            "Remediation: released memory ({} expired, {} trimmed, {} stored entries pruned)",
            purged,
            trimmed,
            pruned
        );
        Ok(())
    }
}

/// Drops dead and cold cache entries and pins hot ones.
pub fn optimize_cache(ctx: &mut RemediationContext<'_>) -> ActionResult {
    let purged = ctx.cache.purge_expired(ctx.now);
    let cold = ctx.cache.evict_cold(COLD_ENTRY_IDLE, ctx.now);
    let boosted = ctx.cache.boost_hot(HOT_ENTRY_MIN_ACCESSES);
    log::info!(
        "Remediation: cache optimized ({} expired, {} cold, {} pinned)",
        purged,
        cold,
        boosted
    );
    Ok(())
}

/// Asks the presentation layer to coalesce renders.
pub fn throttle_renders(ctx: &mut RemediationContext<'_>) -> ActionResult {
    ctx.advisories
        .raise(Advisory::ThrottleRenders, ADVISORY_TTL, ctx.now);
    log::info!("Remediation: render throttling advised");
    Ok(())
}

/// Asks the presentation layer to detach listeners and idle components.
pub fn release_listeners(ctx: &mut RemediationContext<'_>) -> ActionResult {
    ctx.advisories
        .raise(Advisory::ReleaseListeners, ADVISORY_TTL, ctx.now);
    log::info!("Remediation: listener release advised");
    Ok(())
}

/// Asks the presentation layer to fetch critical resources ahead of time.
pub fn preload_resources(ctx: &mut RemediationContext<'_>) -> ActionResult {
    ctx.advisories
        .raise(Advisory::PreloadCritical, ADVISORY_TTL, ctx.now);
    log::info!("Remediation: resource preloading advised");
    Ok(())
}

/// Puts the presentation layer into recovery mode.
pub fn mitigate_errors(ctx: &mut RemediationContext<'_>) -> ActionResult {
    ctx.advisories
        .raise(Advisory::RecoveryMode, ADVISORY_TTL, ctx.now);
    log::info!("Remediation: recovery mode advised");
    Ok(())
}

/// Defers non-critical work so interactions respond faster.
pub fn speed_up_responses(ctx: &mut RemediationContext<'_>) -> ActionResult {
    throttle_renders(ctx)?;
    preload_resources(ctx)
}
