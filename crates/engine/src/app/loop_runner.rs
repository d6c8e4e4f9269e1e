use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_TARGET_TPS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta_ms: u64,
    pub max_ticks_per_frame: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: DEFAULT_TARGET_TPS,
            max_frame_delta_ms: 250,
            max_ticks_per_frame: 5,
        }
    }
}

impl LoopConfig {
    pub fn fixed_tick(&self) -> Duration {
        let tps = if self.target_tps == 0 {
            DEFAULT_TARGET_TPS
        } else {
            self.target_tps
        };
        Duration::from_secs(1) / tps
    }

    pub fn fixed_tick_ms(&self) -> f32 {
        self.fixed_tick().as_secs_f32() * 1_000.0
    }

    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

/// Turns measured frame times into a number of fixed simulation ticks.
/// Leftover time carries into the next frame; there is no interpolation.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl FixedStepClock {
    pub fn new(config: &LoopConfig) -> Self {
        Self {
            fixed_dt: config.fixed_tick(),
            max_frame_delta: config.max_frame_delta(),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
        }
    }

    pub fn fixed_tick(&self) -> Duration {
        self.fixed_dt
    }

    pub fn fixed_tick_ms(&self) -> f32 {
        self.fixed_dt.as_secs_f32() * 1_000.0
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    pub fn advance(&mut self, frame_dt: Duration) -> StepPlan {
        let clamped = clamp_frame_delta(frame_dt, self.max_frame_delta);
        let plan = plan_sim_steps(
            self.accumulator.saturating_add(clamped),
            self.fixed_dt,
            self.max_ticks_per_frame,
        );
        self.accumulator = plan.remaining_accumulator;
        if !plan.dropped_backlog.is_zero() {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_secs_f64() * 1_000.0,
                max_ticks_per_frame = self.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }
        plan
    }
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}
