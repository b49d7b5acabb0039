//! Fixed-rate redraw clock.
//!
//! Frames are paced at a target rate independent of tile loading, which only
//! happens in response to events. The host event loop asks [`FrameClock`]
//! when the next frame is due and whether one is due now.

use std::time::{Duration, Instant};

use log::warn;

pub const DEFAULT_FPS: u32 = 30;

/// Longest gap counted as one frame; after a stall the clock resynchronises
/// instead of catching up.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(250);

/// Timing of one rendered frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTick {
    /// Seconds since the previous frame.
    pub delta: f64,
    /// Seconds since the clock started, excluding stalls.
    pub elapsed: f64,
    pub frame: u64,
}

#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    next: Instant,
    last: Instant,
    elapsed: f64,
    frame: u64,
}

impl FrameClock {
    #[must_use]
    pub fn new(fps: u32, now: Instant) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
            next: now,
            last: now,
            elapsed: 0.0,
            frame: 0,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the host should wake up for the next frame.
    #[must_use]
    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    /// A tick when a frame is due at `now`, `None` if it is too early.
    pub fn tick(&mut self, now: Instant) -> Option<FrameTick> {
        if now < self.next {
            return None;
        }
        let mut delta = now.saturating_duration_since(self.last);
        if delta > MAX_FRAME_TIME {
            warn!(
                "frame gap {:.1}ms exceeds {:.1}ms, resynchronising",
                delta.as_secs_f64() * 1000.0,
                MAX_FRAME_TIME.as_secs_f64() * 1000.0
            );
            delta = self.interval;
            self.next = now;
        }
        self.next += self.interval;
        if self.next <= now {
            self.next = now + self.interval;
        }
        self.last = now;
        self.elapsed += delta.as_secs_f64();
        self.frame += 1;
        Some(FrameTick {
            delta: delta.as_secs_f64(),
            elapsed: self.elapsed,
            frame: self.frame,
        })
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Restart elapsed time, keeping the pace.
    pub fn reset_time(&mut self) {
        self.elapsed = 0.0;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_frame_is_immediate() {
        let start = Instant::now();
        let mut clock = FrameClock::new(30, start);
        let tick = clock.tick(start).expect("first frame");
        assert_eq!(tick.frame, 1);
        assert_eq!(tick.delta, 0.0);
        assert_eq!(clock.next_deadline(), start + clock.interval());
    }

    #[test]
    fn test_frames_paced_at_target_rate() {
        let start = Instant::now();
        let mut clock = FrameClock::new(30, start);
        clock.tick(start);
        assert!(clock.tick(start + ms(10)).is_none(), "33ms interval not reached");
        let tick = clock.tick(start + ms(34)).expect("due");
        assert!((tick.delta - 0.034).abs() < 1e-9);

        let mut rendered = 2;
        let mut t = start + ms(34);
        for _ in 0..100 {
            t += ms(5);
            if clock.tick(t).is_some() {
                rendered += 1;
            }
        }
        // 500ms more at 30 Hz, give or take the phase.
        assert!((16..=18).contains(&rendered), "rendered {rendered} frames");
    }

    #[test]
    fn test_stall_does_not_burst() {
        let start = Instant::now();
        let mut clock = FrameClock::new(30, start);
        clock.tick(start);
        let tick = clock.tick(start + Duration::from_secs(2)).expect("due");
        assert!((tick.delta - clock.interval().as_secs_f64()).abs() < 1e-9, "stall clamped");
        assert!(clock.tick(start + Duration::from_secs(2) + ms(1)).is_none(), "no catch-up burst");
    }

    #[test]
    fn test_elapsed_accumulates_and_resets() {
        let start = Instant::now();
        let mut clock = FrameClock::new(10, start);
        for step in 0..=5 {
            clock.tick(start + ms(100 * step));
        }
        let tick = clock.tick(start + ms(600)).expect("due");
        assert!((tick.elapsed - 0.6).abs() < 1e-9, "elapsed {}", tick.elapsed);
        clock.reset_time();
        let tick = clock.tick(start + ms(700)).expect("due");
        assert!((tick.elapsed - 0.1).abs() < 1e-9);
        assert_eq!(clock.frame_count(), 8);
    }
}
