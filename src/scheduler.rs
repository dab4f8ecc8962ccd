//! Periodic reporting scheduler.
//!
//! Each schedule compares the tick's `now_ms` against the time it last
//! fired.  When `elapsed >= interval` the [`SchedulerDelegate`] is notified
//! once and the reference moves to `now_ms`, so a long stall produces one
//! late report rather than a burst of catch-up reports.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      TelemetryScheduler                      │
//! │                                                              │
//! │   ┌──────────────────┐              ┌──────────────────┐     │
//! │   │ sensor telemetry │              │    heartbeat     │     │
//! │   │   every 3 s      │              │    every 15 s    │     │
//! │   └────────┬─────────┘              └────────┬─────────┘     │
//! │            │        (slot order)             │               │
//! │            ▼                                 ▼               │
//! │   ┌────────────────────────────────────────────────────────┐ │
//! │   │                   SchedulerDelegate                    │ │
//! │   │        (AppService publishes through the session)      │ │
//! │   └────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use crate::app::ports::{ReportKind, SchedulerDelegate};
use log::info;

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Human-readable label (e.g., "sensor telemetry").
    pub label: &'static str,
    /// Which report this schedule produces.
    pub kind: ReportKind,
    /// Fire period in milliseconds.
    pub interval_ms: u64,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// Decoupled from publishing: when a schedule fires it invokes the
/// [`SchedulerDelegate`] callback.  Slots fire in index order within a
/// tick, so the order schedules were added is the order reports go out.
pub struct TelemetryScheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

/// Internal bookkeeping for a live schedule.
#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Reference point; `elapsed` is measured from here.
    last_fired_ms: u64,
}

impl Default for TelemetryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryScheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!(
                    "Scheduler: added '{}' at slot {} (every {} ms)",
                    schedule.label, i, schedule.interval_ms
                );
                *slot = Some(ScheduleEntry {
                    schedule,
                    last_fired_ms: 0,
                });
                return Some(i);
            }
        }
        None // All slots full.
    }

    /// Reset every reference point to `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        for entry in self.schedules.iter_mut().flatten() {
            entry.last_fired_ms = now_ms;
        }
    }

    /// Evaluate every schedule against `now_ms`.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.schedules.iter_mut().flatten() {
            let elapsed = now_ms.wrapping_sub(entry.last_fired_ms);
            if elapsed >= entry.schedule.interval_ms {
                entry.last_fired_ms = now_ms;
                delegate.on_schedule_fired(entry.schedule.label, entry.schedule.kind);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
