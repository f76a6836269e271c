#![allow(dead_code)]

use std::thread;
use std::time::{Duration, Instant};

#[derive(Copy, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start: Instant::now(),
        }
    }

    /// Marks a new tick time and returns the time elapsed in seconds since
    /// the last call to tick().
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = now.duration_since(self.start).as_secs_f32();
        self.start = now;
        dt
    }

    /// Returns the time elapsed in seconds since the last call to tick().
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }

    /// Sleeps the current thread until n seconds after the last tick.
    pub fn sleep_until(&self, n: f32) {
        let dt = self.start.elapsed();
        let target = Duration::from_secs_f32(n);
        if dt < target {
            thread::sleep(target - dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_resets_elapsed() {
        let mut t = Timer::new();
        thread::sleep(Duration::from_millis(5));
        let dt1 = t.tick();
        assert!(dt1 > 0.0);
        let dt2 = t.elapsed();
        assert!(dt2 < dt1 + 0.5);
    }
}
