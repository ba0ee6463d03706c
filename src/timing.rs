//! Fixed-rate frame timer
//!
//! Paces the scope thread on the monotonic clock. Deadlines are accumulated
//! from the start time rather than from each wake-up, so the rate does not
//! drift. The tail of every wait is spent yielding instead of sleeping,
//! since OS sleeps overshoot by about a millisecond.

use std::time::{Duration, Instant};

/// Time before a deadline at which sleeping stops and yielding starts.
const SPIN_MARGIN: Duration = Duration::from_millis(1);

/// Fixed-rate deadline timer
#[derive(Debug, Clone)]
pub struct FrameTimer {
    period: Duration,
    next: Instant,
}

impl FrameTimer {
    /// Timer firing `hz` times per second (at least once).
    pub fn from_hz(hz: u32) -> Self {
        Self::from_period(Duration::from_secs_f64(1.0 / hz.max(1) as f64))
    }

    /// Timer firing once per `period`.
    pub fn from_period(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Time between two ticks.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the next tick is due.
    pub fn deadline(&self) -> Instant {
        self.next
    }

    /// Restart the schedule one period from now.
    pub fn reset(&mut self) {
        self.next = Instant::now() + self.period;
    }

    /// Block until the next tick boundary.
    ///
    /// Returns `false` if the caller was more than a full period late; the
    /// schedule is then restarted from now instead of firing a burst of
    /// catch-up ticks.
    pub fn wait(&mut self) -> bool {
        let now = Instant::now();

        if now >= self.next {
            if now - self.next > self.period {
                log::warn!(
                    "scope timer fell behind by {:?}, resynchronising",
                    now - self.next
                );
                self.next = now + self.period;
                return false;
            }
            self.next += self.period;
            return true;
        }

        let remaining = self.next - now;
        if remaining > SPIN_MARGIN {
            std::thread::sleep(remaining - SPIN_MARGIN);
        }
        while Instant::now() < self.next {
            std::thread::yield_now();
        }

        self.next += self.period;
        true
    }
}
