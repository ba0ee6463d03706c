//! Session-level facade
//!
//! Bundles the configuration, the shared [`ScopeBank`] and the scope thread
//! behind the handful of calls the session layer makes: start, shutdown,
//! stop one voice, stop all voices, reset the period cache.

use crate::bank::ScopeBank;
use crate::config::ScopeConfig;
use crate::constants::AMIGA_VOICES;
use crate::driver::{ScopeDriver, ScopeHost};
use crate::{Result, ScopeError};
use parking_lot::Mutex;
use std::sync::Arc;

/// The scope subsystem
pub struct ScopeSystem {
    config: ScopeConfig,
    bank: Arc<ScopeBank>,
    /// Control plane only; the audio and GUI paths never touch it
    driver: Mutex<Option<ScopeDriver>>,
}

impl ScopeSystem {
    /// Allocate the arena and voices. The scope thread is not started yet.
    pub fn new(config: ScopeConfig) -> Result<Self> {
        config.validate()?;
        let bank = Arc::new(ScopeBank::from_config(&config));
        Ok(Self {
            config,
            bank,
            driver: Mutex::new(None),
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// Shared voice state, for the mixer and the GUI.
    pub fn bank(&self) -> Arc<ScopeBank> {
        Arc::clone(&self.bank)
    }

    /// Reset the period cache and start the scope thread.
    ///
    /// On failure the error is logged and returned; the voices stay as they
    /// are and the renderer keeps showing idle strips.
    pub fn start<H: ScopeHost + 'static>(&self, host: Arc<H>) -> Result<()> {
        let mut driver = self.driver.lock();
        if driver.as_ref().is_some_and(ScopeDriver::is_running) {
            return Err(ScopeError::AlreadyRunning);
        }
        // Reap a thread that already ended on host shutdown
        if let Some(finished) = driver.take() {
            finished.shutdown();
        }

        self.bank.reset_period_cache();
        *driver = Some(ScopeDriver::spawn(
            Arc::clone(&self.bank),
            host as Arc<dyn ScopeHost>,
            &self.config,
        )?);
        Ok(())
    }

    /// Whether the scope thread is running.
    pub fn is_running(&self) -> bool {
        self.driver
            .lock()
            .as_ref()
            .is_some_and(ScopeDriver::is_running)
    }

    /// Ticks processed by the current scope thread (0 if none).
    pub fn ticks(&self) -> u64 {
        self.driver.lock().as_ref().map_or(0, ScopeDriver::ticks)
    }

    /// Stop and join the scope thread. Does nothing if it isn't running.
    pub fn shutdown(&self) {
        if let Some(driver) = self.driver.lock().take() {
            driver.shutdown();
        }
    }

    /// Silence one voice's scope.
    pub fn stop_voice(&self, ch: usize) {
        self.bank.stop_voice(ch);
    }

    /// Silence every voice's scope.
    pub fn stop_all(&self) {
        self.bank.stop_all();
    }

    /// Forget every voice's cached period conversion.
    pub fn reset_period_cache(&self) {
        self.bank.reset_period_cache();
        log::debug!("scope period cache reset");
    }

    /// Current VU bar heights (0-48).
    pub fn vu_levels(&self) -> [u8; AMIGA_VOICES] {
        self.bank.vu_levels()
    }

    /// A renderer using the configured strip layout.
    #[cfg(feature = "renderer")]
    pub fn renderer(&self) -> crate::render::ScopeRenderer {
        crate::render::ScopeRenderer::new(self.config.layout)
    }
}

impl Drop for ScopeSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::HostState;

    fn small_config() -> ScopeConfig {
        ScopeConfig {
            scope_hz: 500,
            max_sample_length: 512,
            reserved_sample_length: 128,
            ..ScopeConfig::default()
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ScopeConfig {
            max_sample_length: 1,
            ..ScopeConfig::default()
        };
        assert!(matches!(
            ScopeSystem::new(config),
            Err(ScopeError::ConfigError(_))
        ));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let system = ScopeSystem::new(small_config()).unwrap();
        let host = Arc::new(HostState::new());
        system.start(Arc::clone(&host)).unwrap();
        assert!(matches!(
            system.start(Arc::clone(&host)),
            Err(ScopeError::AlreadyRunning)
        ));
        system.shutdown();
        assert!(!system.is_running());
    }

    #[test]
    fn test_start_resets_period_cache() {
        let system = ScopeSystem::new(small_config()).unwrap();
        let bank = system.bank();
        bank.set_period(0, 428);
        assert!(bank.voice(0).old_period.is_some());

        system.start(Arc::new(HostState::new())).unwrap();
        assert!(bank.voice(0).old_period.is_none());
        system.shutdown();
    }

    #[test]
    fn test_restart_after_host_shutdown() {
        let system = ScopeSystem::new(small_config()).unwrap();
        let host = Arc::new(HostState::new());
        system.start(Arc::clone(&host)).unwrap();

        host.set_running(false);
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while system.is_running() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(!system.is_running());

        host.set_running(true);
        system.start(host).unwrap();
        assert!(system.is_running());
    }

    #[test]
    fn test_stop_all_through_facade() {
        let system = ScopeSystem::new(small_config()).unwrap();
        let bank = system.bank();
        for ch in 0..AMIGA_VOICES {
            bank.trigger(ch, None, 16);
        }
        system.stop_voice(0);
        assert!(!bank.voice(0).active);
        system.stop_all();
        assert!(bank.voices().iter().all(|v| !v.active));
    }
}
