//! Back-off and busy flags
//!
//! The scope paths never block on a mutex. Where one side has to wait for
//! another (a writer waiting out another writer, a stop request waiting for
//! the scope pass to finish), it spins briefly and then yields its time slice.

use std::sync::atomic::{AtomicBool, Ordering};

/// Spins this many rounds (doubling each time) before falling back to yielding.
const SPIN_LIMIT: u32 = 6;

/// Exponential spin, then `yield_now`
#[derive(Debug, Default)]
pub struct Backoff {
    step: u32,
}

impl Backoff {
    /// Start a fresh back-off sequence.
    pub fn new() -> Self {
        Self { step: 0 }
    }

    /// Wait a little longer than last time.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= SPIN_LIMIT {
            for _ in 0..(1u32 << self.step) {
                std::hint::spin_loop();
            }
            self.step += 1;
        } else {
            std::thread::yield_now();
        }
    }

    /// True once spinning has given way to yielding.
    pub fn is_yielding(&self) -> bool {
        self.step > SPIN_LIMIT
    }
}

/// "A pass is in flight" marker
///
/// Set by the scope thread while it updates voices and by the GUI while it
/// draws. Stop requests wait for it to clear. The barrier is best effort: a
/// pass may begin right after the wait returns.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
    /// Create a cleared flag.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Mark busy until the returned guard is dropped.
    #[must_use = "the flag clears when the guard is dropped"]
    pub fn enter(&self) -> BusyGuard<'_> {
        self.0.store(true, Ordering::Release);
        BusyGuard(self)
    }

    /// Whether a pass is currently in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Wait until no pass is in flight.
    pub fn wait_idle(&self) {
        let mut backoff = Backoff::new();
        while self.is_busy() {
            backoff.snooze();
        }
    }
}

/// Clears its [`BusyFlag`] on drop
#[derive(Debug)]
pub struct BusyGuard<'a>(&'a BusyFlag);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::Release);
    }
}
