//! Variable-step frame clock with an optional tick-rate limiter.
//!
//! Each frame the simulation advances by the wall-clock time since the
//! previous frame. With a non-zero target tick rate, `begin_frame()` sleeps
//! until the frame budget (`1 / tick_rate` seconds) has elapsed before
//! measuring, so dt never drops below the budget. A tick rate of 0 means
//! uncapped.

use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 60;
const SLOW_FRAME_WARN_SECS: f32 = 0.25;

pub struct FrameClock {
    frame_budget: Option<Duration>,
    started: Instant,
    last_instant: Instant,
    pub dt: f32,
    pub frame_count: u64,

    fps_samples: [f32; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f32,
    pub smoothed_frame_time_ms: f32,
}

impl FrameClock {
    pub fn new(tick_rate: u32) -> Self {
        let now = Instant::now();
        let nominal_dt = if tick_rate > 0 {
            1.0 / tick_rate as f32
        } else {
            1.0 / 60.0
        };
        Self {
            frame_budget: frame_budget(tick_rate),
            started: now,
            last_instant: now,
            dt: 0.0,
            frame_count: 0,
            fps_samples: [nominal_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / nominal_dt,
            smoothed_frame_time_ms: nominal_dt * 1000.0,
        }
    }

    /// Blocks until the frame budget is spent, then records the frame delta.
    pub fn begin_frame(&mut self) {
        if let Some(budget) = self.frame_budget {
            let spent = self.last_instant.elapsed();
            if let Some(remaining) = budget.checked_sub(spent) {
                std::thread::sleep(remaining);
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(self.last_instant).as_secs_f32();
        self.last_instant = now;
        self.record_frame(dt);
    }

    /// Milliseconds since the clock was created. Cooldowns are measured on this.
    pub fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn is_uncapped(&self) -> bool {
        self.frame_budget.is_none()
    }

    fn record_frame(&mut self, dt: f32) {
        if dt > SLOW_FRAME_WARN_SECS {
            log::warn!("Frame took {:.1}ms", dt * 1000.0);
        }
        self.dt = dt;
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt = self.fps_samples.iter().sum::<f32>() / FPS_SAMPLE_COUNT as f32;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }
}

fn frame_budget(tick_rate: u32) -> Option<Duration> {
    if tick_rate == 0 {
        None
    } else {
        Some(Duration::from_secs_f64(1.0 / f64::from(tick_rate)))
    }
}
