use std::mem;
use std::time::{Duration, Instant};

/// One closed measurement interval of the fixed-step loop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    /// Tick rate in force when the interval closed.
    pub target_tps: u32,
    /// Ticks that ran below the loop's default rate, e.g. during a game-over slow-down.
    pub slowed_ticks: u32,
    pub tick_rate_changes: u32,
    /// Ticks discarded by the per-frame cap.
    pub dropped_ticks: u32,
}

impl LoopMetricsSnapshot {
    pub fn is_slowed(&self, default_tps: u32) -> bool {
        self.target_tps < default_tps
    }

    /// Short readout appended to the window title.
    pub fn title_suffix(&self) -> String {
        let mut suffix = format!(
            "{:.0} fps | {:.0}/{} tps",
            self.fps, self.tps, self.target_tps
        );
        if self.dropped_ticks > 0 {
            suffix.push_str(&format!(" | {} dropped", self.dropped_ticks));
        }
        suffix
    }
}

#[derive(Debug, Default)]
struct IntervalCounts {
    frames: u32,
    frame_time_total: Duration,
    ticks: u32,
    slowed_ticks: u32,
    tick_rate_changes: u32,
    dropped_ticks: u32,
}

/// Counts frames and ticks between periodic `loop_metrics` reports.
#[derive(Debug)]
pub(crate) struct LoopMetrics {
    interval: Duration,
    default_tps: u32,
    opened_at: Instant,
    counts: IntervalCounts,
}

impl LoopMetrics {
    pub(crate) fn new(interval: Duration, default_tps: u32, now: Instant) -> Self {
        Self {
            interval,
            default_tps,
            opened_at: now,
            counts: IntervalCounts::default(),
        }
    }

    pub(crate) fn frame(&mut self, frame_dt: Duration) {
        self.counts.frames = self.counts.frames.saturating_add(1);
        self.counts.frame_time_total = self.counts.frame_time_total.saturating_add(frame_dt);
    }

    pub(crate) fn tick(&mut self, tick_rate: u32) {
        self.counts.ticks = self.counts.ticks.saturating_add(1);
        if tick_rate < self.default_tps {
            self.counts.slowed_ticks = self.counts.slowed_ticks.saturating_add(1);
        }
    }

    pub(crate) fn tick_rate_changed(&mut self) {
        self.counts.tick_rate_changes = self.counts.tick_rate_changes.saturating_add(1);
    }

    pub(crate) fn dropped(&mut self, backlog: Duration, fixed_dt: Duration) {
        if fixed_dt.is_zero() {
            return;
        }
        let ticks = (backlog.as_secs_f64() / fixed_dt.as_secs_f64()).floor() as u32;
        self.counts.dropped_ticks = self.counts.dropped_ticks.saturating_add(ticks);
    }

    /// Closes the interval once it has run its length and starts the next one.
    pub(crate) fn close_if_due(
        &mut self,
        now: Instant,
        current_tps: u32,
    ) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        if elapsed < self.interval {
            return None;
        }
        self.opened_at = now;
        let counts = mem::take(&mut self.counts);

        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = match counts.frames {
            0 => 0.0,
            frames => counts.frame_time_total.as_secs_f32() * 1000.0 / frames as f32,
        };
        Some(LoopMetricsSnapshot {
            fps: counts.frames as f32 / seconds,
            tps: counts.ticks as f32 / seconds,
            frame_time_ms,
            target_tps: current_tps,
            slowed_ticks: counts.slowed_ticks,
            tick_rate_changes: counts.tick_rate_changes,
            dropped_ticks: counts.dropped_ticks,
        })
    }
}
