//! Periodic scope thread
//!
//! A dedicated thread ticks at the display refresh rate, independent of the
//! audio callback. Every tick it sinks/refreshes the VU bars (if enabled) and
//! advances all voice positions, then sleeps until the next tick boundary.
//!
//! The host application is reached through [`ScopeHost`]: it says whether
//! the program is still running, whether an offline render is in progress
//! (the scopes then stay frozen so they cannot disturb it), and how to give
//! the thread a higher scheduling priority.

use crate::bank::ScopeBank;
use crate::config::ScopeConfig;
use crate::timing::FrameTimer;
use crate::{Result, ScopeError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// What the scope thread needs from the host application
pub trait ScopeHost: Send + Sync {
    /// `false` once the program is shutting down.
    fn is_running(&self) -> bool;

    /// `true` while a non-realtime render (e.g. WAV export) is running.
    fn is_bulk_rendering(&self) -> bool {
        false
    }

    /// Called once on the scope thread before the first tick.
    ///
    /// Scope timing is visibly steadier at raised priority; the default does
    /// nothing.
    fn raise_thread_priority(&self) {}
}

/// Atomic flags implementing [`ScopeHost`]
#[derive(Debug)]
pub struct HostState {
    running: AtomicBool,
    bulk_rendering: AtomicBool,
}

impl Default for HostState {
    fn default() -> Self {
        Self::new()
    }
}

impl HostState {
    /// Running, not rendering.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            bulk_rendering: AtomicBool::new(false),
        }
    }

    /// Flag program shutdown (or undo it).
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    /// Flag the start/end of an offline render.
    pub fn set_bulk_rendering(&self, rendering: bool) {
        self.bulk_rendering.store(rendering, Ordering::Relaxed);
    }
}

impl ScopeHost for HostState {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    fn is_bulk_rendering(&self) -> bool {
        self.bulk_rendering.load(Ordering::Relaxed)
    }
}

/// Handle to the running scope thread
///
/// Dropping the handle stops and joins the thread.
pub struct ScopeDriver {
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    thread: Option<JoinHandle<()>>,
}

impl ScopeDriver {
    /// Start the scope thread.
    ///
    /// Fails only if the OS refuses to create the thread.
    pub fn spawn(
        bank: Arc<ScopeBank>,
        host: Arc<dyn ScopeHost>,
        config: &ScopeConfig,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let ticks = Arc::new(AtomicU64::new(0));
        let scope_hz = config.scope_hz;
        let real_vu_meters = config.real_vu_meters;

        let running_clone = Arc::clone(&running);
        let ticks_clone = Arc::clone(&ticks);

        let thread = std::thread::Builder::new()
            .name("scopes".into())
            .spawn(move || {
                run_scope_loop(
                    &bank,
                    host.as_ref(),
                    &running_clone,
                    &ticks_clone,
                    scope_hz,
                    real_vu_meters,
                );
            })
            .map_err(|e| {
                log::error!("Couldn't create scope thread: {e}");
                ScopeError::ThreadSpawn(e)
            })?;

        log::info!("scope thread started at {scope_hz} Hz (VU meters: {real_vu_meters})");

        Ok(Self {
            running,
            ticks,
            thread: Some(thread),
        })
    }

    /// Number of ticks that updated the voices so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Whether the thread is still looping.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal shutdown and wait for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("scope thread panicked");
            } else {
                log::info!("scope thread stopped after {} ticks", self.ticks());
            }
        }
    }
}

impl Drop for ScopeDriver {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl std::fmt::Debug for ScopeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeDriver")
            .field("running", &self.is_running())
            .field("ticks", &self.ticks())
            .finish()
    }
}

/// Scope thread body. Checks for shutdown once per tick.
fn run_scope_loop(
    bank: &ScopeBank,
    host: &dyn ScopeHost,
    running: &AtomicBool,
    ticks: &AtomicU64,
    scope_hz: u32,
    real_vu_meters: bool,
) {
    host.raise_thread_priority();

    let mut timer = FrameTimer::from_hz(scope_hz);
    timer.reset();

    while running.load(Ordering::Relaxed) && host.is_running() {
        // Stay out of the way of deterministic offline renders
        if !host.is_bulk_rendering() {
            if real_vu_meters {
                bank.update_vu_meters();
            }
            bank.update_positions();
            ticks.fetch_add(1, Ordering::Relaxed);
        }

        timer.wait();
    }
}
