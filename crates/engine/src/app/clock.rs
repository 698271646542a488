use std::thread;
use std::time::{Duration, Instant};

/// Frame pacing. `tick` is the loop's only blocking point.
pub trait FrameClock {
    /// Blocks until the frame budget for `target_fps` is used up and returns the
    /// milliseconds elapsed since the previous tick.
    fn tick(&mut self, target_fps: u32) -> u64;

    /// Value returned by the most recent `tick`, `0` before the first one.
    fn last_delta_ms(&self) -> u64;
}

#[derive(Debug)]
pub struct SystemClock {
    last_tick: Instant,
    last_delta_ms: u64,
    max_frame_delta: Duration,
}

impl SystemClock {
    pub fn new(max_frame_delta: Duration) -> Self {
        Self {
            last_tick: Instant::now(),
            last_delta_ms: 0,
            max_frame_delta,
        }
    }
}

impl FrameClock for SystemClock {
    fn tick(&mut self, target_fps: u32) -> u64 {
        let elapsed = Instant::now().saturating_duration_since(self.last_tick);
        let cap_sleep = compute_cap_sleep(elapsed, target_frame_duration(target_fps));
        if cap_sleep > Duration::ZERO {
            thread::sleep(cap_sleep);
        }

        let now = Instant::now();
        let frame_dt = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.last_delta_ms = clamp_frame_delta(frame_dt, self.max_frame_delta).as_millis() as u64;
        self.last_delta_ms
    }

    fn last_delta_ms(&self) -> u64 {
        self.last_delta_ms
    }
}

/// Deterministic clock that never sleeps; every tick advances by the same step.
#[derive(Debug, Clone)]
pub struct ManualClock {
    step_ms: u64,
    last_delta_ms: u64,
    ticks: u64,
}

impl ManualClock {
    pub fn new(step_ms: u64) -> Self {
        Self {
            step_ms,
            last_delta_ms: 0,
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl FrameClock for ManualClock {
    fn tick(&mut self, _target_fps: u32) -> u64 {
        self.ticks = self.ticks.saturating_add(1);
        self.last_delta_ms = self.step_ms;
        self.last_delta_ms
    }

    fn last_delta_ms(&self) -> u64 {
        self.last_delta_ms
    }
}

fn target_frame_duration(target_fps: u32) -> Option<Duration> {
    (target_fps > 0).then(|| Duration::from_secs_f64(1.0 / target_fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn target_frame_duration_none_when_uncapped() {
        assert_eq!(target_frame_duration(0), None);
    }

    #[test]
    fn target_frame_duration_for_60hz_is_expected() {
        let duration = target_frame_duration(60).expect("duration");
        assert!((duration.as_secs_f64() - (1.0 / 60.0)).abs() < 0.000_001);
    }

    #[test]
    fn compute_cap_sleep_zero_when_over_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(20), target_frame_duration(60));
        assert_eq!(sleep, Duration::ZERO);
    }

    #[test]
    fn compute_cap_sleep_positive_when_under_budget() {
        let sleep = compute_cap_sleep(Duration::from_millis(5), target_frame_duration(60));
        assert!(sleep > Duration::ZERO);
    }

    #[test]
    fn system_clock_tick_caps_frame_rate() {
        let mut clock = SystemClock::new(Duration::from_millis(250));
        assert_eq!(clock.last_delta_ms(), 0);

        let start = Instant::now();
        clock.tick(100);
        clock.tick(100);

        assert!(start.elapsed() >= Duration::from_millis(19));
        assert!(clock.last_delta_ms() >= 9);
    }

    #[test]
    fn manual_clock_reports_fixed_step() {
        let mut clock = ManualClock::new(16);
        assert_eq!(clock.last_delta_ms(), 0);
        assert_eq!(clock.tick(60), 16);
        assert_eq!(clock.last_delta_ms(), 16);
        assert_eq!(clock.ticks(), 1);
    }
}
