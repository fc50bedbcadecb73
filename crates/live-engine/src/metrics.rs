//! Loop counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters updated by the driver and its cycles.
#[derive(Debug, Default)]
pub struct LoopMetrics {
    ticks: AtomicU64,
    dropped_ticks: AtomicU64,
    cycles: AtomicU64,
    frames: AtomicU64,
    not_ready_frames: AtomicU64,
    predictions: AtomicU64,
    alerts: AtomicU64,
    failed_cycles: AtomicU64,
    discarded_results: AtomicU64,
}

/// Point-in-time copy of [`LoopMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Ticks observed by the driver.
    pub ticks: u64,
    /// Ticks dropped because a cycle was already in flight.
    pub dropped_ticks: u64,
    /// Cycles started.
    pub cycles: u64,
    /// Frames pushed into the rolling window.
    pub frames: u64,
    /// Samples for which the source was not ready.
    pub not_ready_frames: u64,
    /// Completed classifier calls.
    pub predictions: u64,
    /// Alerts emitted.
    pub alerts: u64,
    /// Cycles that failed in the source, estimator or classifier.
    pub failed_cycles: u64,
    /// Cycle results thrown away because the loop had stopped.
    pub discarded_results: u64,
}

macro_rules! counter {
    ($method:ident, $field:ident) => {
        pub(crate) fn $method(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl LoopMetrics {
    counter!(tick, ticks);
    counter!(drop_tick, dropped_ticks);
    counter!(start_cycle, cycles);
    counter!(push_frame, frames);
    counter!(not_ready, not_ready_frames);
    counter!(predicted, predictions);
    counter!(alerted, alerts);
    counter!(fail_cycle, failed_cycles);
    counter!(discard, discarded_results);

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            dropped_ticks: self.dropped_ticks.load(Ordering::Relaxed),
            cycles: self.cycles.load(Ordering::Relaxed),
            frames: self.frames.load(Ordering::Relaxed),
            not_ready_frames: self.not_ready_frames.load(Ordering::Relaxed),
            predictions: self.predictions.load(Ordering::Relaxed),
            alerts: self.alerts.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            discarded_results: self.discarded_results.load(Ordering::Relaxed),
        }
    }
}
